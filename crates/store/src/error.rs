use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{CategoryId, ProductId};

/// Errors that can occur when interacting with the catalog or sales store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The referenced category does not exist.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// A time range whose end precedes its start.
    #[error("Invalid time range: end {end} is before start {start}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A record failed validation before it reached the store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An aggregated amount does not fit in 64 bits.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// The backing store could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
