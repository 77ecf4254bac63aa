//! Cart lines submitted for checkout.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// One requested line of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl CheckoutItem {
    pub fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Checks the cart shape: at least one line, every quantity positive.
pub fn validate_items(items: &[CheckoutItem]) -> Result<()> {
    if items.is_empty() {
        return Err(CheckoutError::InvalidRequest(
            "items must contain at least one line".to_string(),
        ));
    }

    if let Some((index, item)) = items.iter().enumerate().find(|(_, i)| i.quantity <= 0) {
        return Err(CheckoutError::InvalidRequest(format!(
            "items[{index}].quantity must be greater than 0, got {}",
            item.quantity
        )));
    }

    Ok(())
}
