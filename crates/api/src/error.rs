//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use reports::ReportError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, rejected before reaching a service.
    BadRequest(String),
    /// Checkout engine error.
    Checkout(CheckoutError),
    /// Report aggregator error.
    Report(ReportError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Report(err) => report_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match err {
        CheckoutError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::ProductNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::TransactionFailed(cause) => store_error_to_response(cause),
    }
}

fn report_error_to_response(err: ReportError) -> (StatusCode, String) {
    match err {
        ReportError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        ReportError::ReportFailed(cause) => store_error_to_response(cause),
    }
}

/// Store failures never leak driver or SQL details to the client.
fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match err {
        StoreError::ProductNotFound(_) | StoreError::CategoryNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        StoreError::InvalidTimeRange { .. } | StoreError::InvalidInput(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::AmountOverflow(_)
        | StoreError::Unavailable(_)
        | StoreError::Database(_)
        | StoreError::Migration(_) => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}
