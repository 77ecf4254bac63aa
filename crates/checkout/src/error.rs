//! Checkout error types.

use common::ProductId;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur during a checkout.
///
/// Every variant means nothing was persisted.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart is malformed. Detected before any store access.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A cart line references a product that doesn't exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A cart line asks for more units than are left.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: i32,
        available: i32,
    },

    /// The backing store failed; the unit of work was rolled back.
    #[error("Transaction failed: {0}")]
    TransactionFailed(#[from] StoreError),
}

impl CheckoutError {
    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::InvalidRequest(_) => "invalid_request",
            CheckoutError::ProductNotFound(_) => "product_not_found",
            CheckoutError::InsufficientStock { .. } => "insufficient_stock",
            CheckoutError::TransactionFailed(_) => "transaction_failed",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
