//! Report error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested period is malformed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The backing store failed to answer a report query.
    #[error("Report failed: {0}")]
    ReportFailed(#[from] StoreError),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
