//! HTTP API server for point-of-sale checkout and sales reports.
//!
//! Exposes the checkout engine and the report aggregator over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use ::checkout::CheckoutService;
use ::reports::{BusinessCalendar, ReportService};
use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use store::SalesStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: SalesStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/checkout", post(routes::checkout::create::<S>))
        .route("/api/report/today", get(routes::reports::today::<S>))
        .route("/api/report", get(routes::reports::range::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with both services sharing one store.
pub fn create_default_state<S: SalesStore + Clone + 'static>(
    store: S,
    calendar: BusinessCalendar,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        checkout: CheckoutService::new(store.clone()),
        reports: ReportService::new(store, calendar),
    })
}
