//! HTTP route handlers and the state they share.

pub mod checkout;
pub mod health;
pub mod metrics;
pub mod reports;

use ::checkout::CheckoutService;
use ::reports::ReportService;
use store::SalesStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SalesStore> {
    pub checkout: CheckoutService<S>,
    pub reports: ReportService<S>,
}
