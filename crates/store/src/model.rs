//! Records held by the catalog and sales tables.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{CategoryId, Money, ProductId, TransactionDetailId, TransactionId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

/// Fields required to create a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A sellable catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in minor currency units.
    pub price: Money,
    /// Units on hand. Never negative.
    pub stock: i32,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub stock: i32,
    pub category_id: CategoryId,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        price: Money,
        stock: i32,
        category_id: CategoryId,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            stock,
            category_id,
        }
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::StoreError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }
        if self.price.is_negative() {
            return Err(crate::StoreError::InvalidInput(
                "product price must not be negative".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(crate::StoreError::InvalidInput(
                "product stock must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// The decrement applied; `remaining` is the stock afterwards.
    Applied { remaining: i32 },
    /// Not enough stock was left at application time. Nothing changed.
    Insufficient { available: i32 },
    /// The product row no longer exists.
    Missing,
}

/// A persisted sale with its ordered line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub transaction_details: Vec<TransactionDetail>,
}

/// One line of a persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDetail {
    pub id: TransactionDetailId,
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    /// Product name at the time of sale.
    pub product_name: String,
    pub quantity: i32,
    pub subtotal: Money,
}

/// A sale line waiting to be written inside a unit of work.
#[derive(Debug, Clone)]
pub struct NewTransactionDetail {
    pub transaction_id: TransactionId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub subtotal: Money,
}

impl NewTransactionDetail {
    /// Attaches the store-assigned id to produce the persisted record.
    pub fn into_detail(self, id: TransactionDetailId) -> TransactionDetail {
        TransactionDetail {
            id,
            transaction_id: self.transaction_id,
            product_id: self.product_id,
            product_name: self.product_name,
            quantity: self.quantity,
            subtotal: self.subtotal,
        }
    }
}

/// Revenue and transaction count over a time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodSummary {
    pub total_revenue: Money,
    pub total_transaction: i64,
}

/// The product with the highest quantity sold over a time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSeller {
    pub name: String,
    pub quantity_sold: i64,
}
