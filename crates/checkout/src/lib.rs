//! Checkout transaction engine.
//!
//! Turns a cart of product/quantity lines into a persisted sale inside a
//! single unit of work: availability is checked, stock is deducted with a
//! conditional decrement, and the transaction header plus its lines are
//! written. Either every step takes effect or none do.

pub mod error;
pub mod item;
pub mod service;

pub use error::{CheckoutError, Result};
pub use item::CheckoutItem;
pub use service::CheckoutService;
pub use store::{Transaction, TransactionDetail};
