//! Shared types used across the point-of-sale crates.

pub mod money;
pub mod types;

pub use money::Money;
pub use types::{CategoryId, ProductId, TransactionDetailId, TransactionId};
