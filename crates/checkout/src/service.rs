//! Checkout service running the sale inside one unit of work.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use store::{
    NewTransactionDetail, Product, SalesStore, StockDecrement, Transaction, UnitOfWork,
};

use crate::error::{CheckoutError, Result};
use crate::item::{CheckoutItem, validate_items};

/// A cart line resolved against the catalog, priced at checkout time.
struct PricedLine {
    product: Product,
    quantity: i32,
    subtotal: Money,
}

/// Service converting carts into persisted sales.
///
/// Stock mutation happens only here, and only through the store's
/// conditional decrement, so concurrent checkouts on the same product can
/// never drive its stock below zero.
pub struct CheckoutService<S: SalesStore> {
    store: S,
}

impl<S: SalesStore> CheckoutService<S> {
    /// Creates a new checkout service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Checks out a cart, stamping the sale with the current time.
    pub async fn checkout(&self, items: &[CheckoutItem]) -> Result<Transaction> {
        self.checkout_at(items, Utc::now()).await
    }

    /// Checks out a cart, stamping the sale with `created_at`.
    ///
    /// Fails as a whole if any line fails; on error the store is exactly as
    /// it was before the call. Not retried on failure.
    #[tracing::instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn checkout_at(
        &self,
        items: &[CheckoutItem],
        created_at: DateTime<Utc>,
    ) -> Result<Transaction> {
        let started = std::time::Instant::now();
        let result = self.run(items, created_at).await;
        let duration = started.elapsed().as_secs_f64();

        match &result {
            Ok(transaction) => {
                metrics::counter!("checkout_completed_total").increment(1);
                metrics::histogram!("checkout_duration_seconds").record(duration);
                tracing::info!(
                    transaction_id = %transaction.id,
                    total_amount = %transaction.total_amount,
                    duration,
                    "checkout completed"
                );
            }
            Err(err) => {
                metrics::counter!("checkout_rejected_total", "reason" => err.reason())
                    .increment(1);
                tracing::warn!(reason = err.reason(), error = %err, "checkout rejected");
            }
        }

        result
    }

    async fn run(&self, items: &[CheckoutItem], created_at: DateTime<Utc>) -> Result<Transaction> {
        validate_items(items)?;

        // Any early return drops `uow`, which rolls everything back.
        let mut uow = self.store.begin().await?;

        let lines = load_lines(uow.as_mut(), items).await?;
        deduct_stock(uow.as_mut(), &lines).await?;

        let total_amount = Money::checked_sum(lines.iter().map(|line| line.subtotal))
            .ok_or_else(|| {
                CheckoutError::InvalidRequest("cart total exceeds the supported amount".to_string())
            })?;

        let transaction_id = uow.insert_transaction(total_amount, created_at).await?;

        let mut transaction_details = Vec::with_capacity(lines.len());
        for line in lines {
            let pending = NewTransactionDetail {
                transaction_id,
                product_id: line.product.id,
                product_name: line.product.name,
                quantity: line.quantity,
                subtotal: line.subtotal,
            };
            let detail_id = uow.insert_detail(&pending).await?;
            transaction_details.push(pending.into_detail(detail_id));
        }

        uow.commit().await?;

        Ok(Transaction {
            id: transaction_id,
            total_amount,
            created_at,
            transaction_details,
        })
    }
}

/// Resolves every line against the catalog, then runs the advisory stock
/// check over the resolved lines.
///
/// A missing product anywhere in the cart wins over a stock shortfall on an
/// earlier line. Repeated lines for the same product are checked against
/// what earlier lines already claimed.
async fn load_lines(uow: &mut dyn UnitOfWork, items: &[CheckoutItem]) -> Result<Vec<PricedLine>> {
    let mut products = Vec::with_capacity(items.len());
    for item in items {
        let product = uow
            .find_product(item.product_id)
            .await?
            .ok_or(CheckoutError::ProductNotFound(item.product_id))?;
        products.push(product);
    }

    let mut claimed: HashMap<ProductId, i32> = HashMap::new();
    let mut lines = Vec::with_capacity(items.len());

    for (item, product) in items.iter().zip(products) {
        let already_claimed = claimed.get(&product.id).copied().unwrap_or(0);
        let available = product.stock.saturating_sub(already_claimed).max(0);
        if available < item.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id,
                requested: item.quantity,
                available,
            });
        }
        claimed.insert(product.id, already_claimed + item.quantity);

        let subtotal = product
            .price
            .checked_multiply(i64::from(item.quantity))
            .ok_or_else(|| {
                CheckoutError::InvalidRequest(format!(
                    "subtotal for product {} exceeds the supported amount",
                    product.id
                ))
            })?;

        lines.push(PricedLine {
            product,
            quantity: item.quantity,
            subtotal,
        });
    }

    Ok(lines)
}

/// Applies the conditional decrements, in ascending product id order so
/// carts sharing products always lock rows in the same sequence.
///
/// Lines only fail here when a concurrent checkout took the stock after the
/// advisory check. The error then names the lowest product id that ran
/// short, which may not be the first short line in cart order.
async fn deduct_stock(uow: &mut dyn UnitOfWork, lines: &[PricedLine]) -> Result<()> {
    let mut ordered: Vec<&PricedLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.product.id);

    for line in ordered {
        let product_id = line.product.id;
        match uow.decrement_stock(product_id, line.quantity).await? {
            StockDecrement::Applied { .. } => {}
            StockDecrement::Insufficient { available } => {
                return Err(CheckoutError::InsufficientStock {
                    product_id,
                    requested: line.quantity,
                    available,
                });
            }
            StockDecrement::Missing => return Err(CheckoutError::ProductNotFound(product_id)),
        }
    }

    Ok(())
}
