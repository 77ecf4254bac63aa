use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    BestSeller, Category, CategoryId, Money, NewCategory, NewProduct, NewTransactionDetail,
    PeriodSummary, Product, ProductId, Result, StockDecrement, StoreError, TimeRange, Transaction,
    TransactionDetail, TransactionDetailId, TransactionId,
    store::{CatalogStore, SalesStore, UnitOfWork},
};

#[derive(Debug, Clone)]
struct TransactionRow {
    id: TransactionId,
    total_amount: Money,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    transactions: BTreeMap<TransactionId, TransactionRow>,
    details: Vec<TransactionDetail>,
    last_category_id: i64,
    last_product_id: i64,
    last_transaction_id: i64,
    last_detail_id: i64,
    fail_on_commit: bool,
}

/// In-memory catalog and sales store.
///
/// A single mutex guards every table. A unit of work holds that mutex from
/// `begin` until it is committed or dropped, so units of work are fully
/// serialized and never observe each other's uncommitted changes.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent commit fail with `Unavailable` until reset.
    pub async fn set_fail_on_commit(&self, fail: bool) {
        self.tables.lock().await.fail_on_commit = fail;
    }

    /// Returns the number of committed transactions.
    pub async fn transaction_count(&self) -> usize {
        self.tables.lock().await.transactions.len()
    }

    /// Returns the number of committed transaction lines.
    pub async fn detail_count(&self) -> usize {
        self.tables.lock().await.details.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.lock().await.products.get(&id).cloned())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.category_id == id)
            .cloned()
            .collect())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        if category.name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }

        let mut tables = self.tables.lock().await;
        tables.last_category_id += 1;
        let created = Category {
            id: CategoryId::new(tables.last_category_id),
            name: category.name,
            description: category.description,
        };
        tables.categories.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;

        let mut tables = self.tables.lock().await;
        if !tables.categories.contains_key(&product.category_id) {
            return Err(StoreError::CategoryNotFound(product.category_id));
        }

        tables.last_product_id += 1;
        let created = Product {
            id: ProductId::new(tables.last_product_id),
            name: product.name,
            price: product.price,
            stock: product.stock,
            category_id: product.category_id,
            created_at: Utc::now(),
        };
        tables.products.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl SalesStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tables = self.tables.clone().lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            tables,
            stock: HashMap::new(),
            transactions: Vec::new(),
            details: Vec::new(),
        }))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let tables = self.tables.lock().await;
        let Some(row) = tables.transactions.get(&id) else {
            return Ok(None);
        };

        let transaction_details = tables
            .details
            .iter()
            .filter(|d| d.transaction_id == id)
            .cloned()
            .collect();

        Ok(Some(Transaction {
            id: row.id,
            total_amount: row.total_amount,
            created_at: row.created_at,
            transaction_details,
        }))
    }

    async fn period_summary(&self, range: TimeRange) -> Result<PeriodSummary> {
        let tables = self.tables.lock().await;
        let in_range: Vec<&TransactionRow> = tables
            .transactions
            .values()
            .filter(|t| range.contains(t.created_at))
            .collect();

        let total_revenue = Money::checked_sum(in_range.iter().map(|t| t.total_amount))
            .ok_or(StoreError::AmountOverflow("total_revenue"))?;

        Ok(PeriodSummary {
            total_revenue,
            total_transaction: in_range.len() as i64,
        })
    }

    async fn best_seller(&self, range: TimeRange) -> Result<Option<BestSeller>> {
        let tables = self.tables.lock().await;

        // name -> (quantity sold, lowest product id)
        let mut groups: HashMap<&str, (i64, ProductId)> = HashMap::new();
        for detail in &tables.details {
            let in_range = tables
                .transactions
                .get(&detail.transaction_id)
                .is_some_and(|t| range.contains(t.created_at));
            if !in_range {
                continue;
            }
            let entry = groups
                .entry(detail.product_name.as_str())
                .or_insert((0, detail.product_id));
            entry.0 += i64::from(detail.quantity);
            entry.1 = entry.1.min(detail.product_id);
        }

        let best = groups.into_iter().min_by(|(a_name, a), (b_name, b)| {
            b.0.cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a_name.cmp(b_name))
        });

        Ok(best.map(|(name, (quantity_sold, _))| BestSeller {
            name: name.to_string(),
            quantity_sold,
        }))
    }
}

/// Unit of work over [`InMemoryStore`].
///
/// Changes are staged next to the locked tables and only written back on
/// commit.
struct InMemoryUnitOfWork {
    tables: OwnedMutexGuard<Tables>,
    stock: HashMap<ProductId, i32>,
    transactions: Vec<TransactionRow>,
    details: Vec<TransactionDetail>,
}

impl InMemoryUnitOfWork {
    fn current_stock(&self, id: ProductId) -> Option<i32> {
        self.stock
            .get(&id)
            .copied()
            .or_else(|| self.tables.products.get(&id).map(|p| p.stock))
    }

    fn has_transaction(&self, id: TransactionId) -> bool {
        self.tables.transactions.contains_key(&id) || self.transactions.iter().any(|t| t.id == id)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let staged = self.stock.get(&id).copied();
        Ok(self.tables.products.get(&id).map(|p| {
            let mut product = p.clone();
            if let Some(stock) = staged {
                product.stock = stock;
            }
            product
        }))
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn decrement_stock(&mut self, id: ProductId, quantity: i32) -> Result<StockDecrement> {
        if quantity <= 0 {
            return Err(StoreError::InvalidInput(format!(
                "decrement quantity must be positive, got {quantity}"
            )));
        }

        let Some(current) = self.current_stock(id) else {
            return Ok(StockDecrement::Missing);
        };

        if current < quantity {
            return Ok(StockDecrement::Insufficient { available: current });
        }

        let remaining = current - quantity;
        self.stock.insert(id, remaining);
        Ok(StockDecrement::Applied { remaining })
    }

    async fn insert_transaction(
        &mut self,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId> {
        let id = TransactionId::new(
            self.tables.last_transaction_id + self.transactions.len() as i64 + 1,
        );
        self.transactions.push(TransactionRow {
            id,
            total_amount,
            created_at,
        });
        Ok(id)
    }

    async fn insert_detail(
        &mut self,
        detail: &NewTransactionDetail,
    ) -> Result<TransactionDetailId> {
        if !self.has_transaction(detail.transaction_id) {
            return Err(StoreError::InvalidInput(format!(
                "transaction {} does not exist",
                detail.transaction_id
            )));
        }
        if !self.tables.products.contains_key(&detail.product_id) {
            return Err(StoreError::ProductNotFound(detail.product_id));
        }

        let id = TransactionDetailId::new(self.tables.last_detail_id + self.details.len() as i64 + 1);
        self.details.push(detail.clone().into_detail(id));
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryUnitOfWork {
            mut tables,
            stock,
            transactions,
            details,
        } = *self;

        if tables.fail_on_commit {
            tracing::warn!("in-memory commit rejected");
            return Err(StoreError::Unavailable("commit rejected".to_string()));
        }

        for (id, remaining) in stock {
            if let Some(product) = tables.products.get_mut(&id) {
                product.stock = remaining;
            }
        }

        tables.last_transaction_id += transactions.len() as i64;
        for row in transactions {
            tables.transactions.insert(row.id, row);
        }

        tables.last_detail_id += details.len() as i64;
        tables.details.extend(details);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    async fn seeded_store() -> (InMemoryStore, Product) {
        let store = InMemoryStore::new();
        let category = store
            .create_category(NewCategory::new("Minuman", "Drinks"))
            .await
            .unwrap();
        let product = store
            .create_product(NewProduct::new(
                "Kopi Susu",
                Money::from_minor(3500),
                10,
                category.id,
            ))
            .await
            .unwrap();
        (store, product)
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, 12, 0, 0).unwrap()
    }

    async fn record_sale(
        store: &InMemoryStore,
        product: &Product,
        name: &str,
        quantity: i32,
        at: DateTime<Utc>,
    ) -> TransactionId {
        let subtotal = product.price.checked_multiply(i64::from(quantity)).unwrap();
        let mut uow = store.begin().await.unwrap();
        let transaction_id = uow.insert_transaction(subtotal, at).await.unwrap();
        uow.insert_detail(&NewTransactionDetail {
            transaction_id,
            product_id: product.id,
            product_name: name.to_string(),
            quantity,
            subtotal,
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();
        transaction_id
    }

    #[tokio::test]
    async fn create_product_requires_existing_category() {
        let store = InMemoryStore::new();
        let result = store
            .create_product(NewProduct::new(
                "Orphan",
                Money::from_minor(100),
                1,
                CategoryId::new(99),
            ))
            .await;
        assert!(matches!(result, Err(StoreError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn list_products_by_category_filters() {
        let (store, product) = seeded_store().await;
        let other = store
            .create_category(NewCategory::new("Makanan", "Food"))
            .await
            .unwrap();

        let listed = store
            .list_products_by_category(product.category_id)
            .await
            .unwrap();
        assert_eq!(listed, vec![product]);

        let empty = store.list_products_by_category(other.id).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn conditional_decrement_applies_when_stock_suffices() {
        let (store, product) = seeded_store().await;

        let mut uow = store.begin().await.unwrap();
        let outcome = uow.decrement_stock(product.id, 4).await.unwrap();
        assert_eq!(outcome, StockDecrement::Applied { remaining: 6 });

        let seen = uow.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(seen.stock, 6);
        uow.commit().await.unwrap();

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 6);
    }

    #[tokio::test]
    async fn conditional_decrement_refuses_to_oversell() {
        let (store, product) = seeded_store().await;

        let mut uow = store.begin().await.unwrap();
        assert_eq!(
            uow.decrement_stock(product.id, 6).await.unwrap(),
            StockDecrement::Applied { remaining: 4 }
        );
        assert_eq!(
            uow.decrement_stock(product.id, 6).await.unwrap(),
            StockDecrement::Insufficient { available: 4 }
        );
    }

    #[tokio::test]
    async fn decrement_of_unknown_product_reports_missing() {
        let store = InMemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let outcome = uow.decrement_stock(ProductId::new(42), 1).await.unwrap();
        assert_eq!(outcome, StockDecrement::Missing);
    }

    #[tokio::test]
    async fn dropped_unit_of_work_leaves_store_unchanged() {
        let (store, product) = seeded_store().await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.decrement_stock(product.id, 3).await.unwrap();
            uow.insert_transaction(Money::from_minor(10500), Utc::now())
                .await
                .unwrap();
        }

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
        assert_eq!(store.transaction_count().await, 0);
    }

    #[tokio::test]
    async fn failed_commit_discards_changes() {
        let (store, product) = seeded_store().await;
        store.set_fail_on_commit(true).await;

        let mut uow = store.begin().await.unwrap();
        uow.decrement_stock(product.id, 3).await.unwrap();
        let result = uow.commit().await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let stored = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 10);
    }

    #[tokio::test]
    async fn detail_requires_existing_transaction() {
        let (store, product) = seeded_store().await;
        let mut uow = store.begin().await.unwrap();
        let result = uow
            .insert_detail(&NewTransactionDetail {
                transaction_id: TransactionId::new(77),
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: 1,
                subtotal: product.price,
            })
            .await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn committed_transaction_reads_back_with_details() {
        let (store, product) = seeded_store().await;
        let id = record_sale(&store, &product, "Kopi Susu", 2, noon(1)).await;

        let transaction = store.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(transaction.total_amount.minor(), 7000);
        assert_eq!(transaction.transaction_details.len(), 1);
        assert_eq!(transaction.transaction_details[0].quantity, 2);
        assert_eq!(store.detail_count().await, 1);
    }

    #[tokio::test]
    async fn period_summary_uses_half_open_range() {
        let (store, product) = seeded_store().await;
        record_sale(&store, &product, "Kopi Susu", 1, noon(1)).await;
        record_sale(&store, &product, "Kopi Susu", 2, noon(2)).await;
        record_sale(&store, &product, "Kopi Susu", 3, noon(3)).await;

        let range = TimeRange::new(noon(1), noon(3)).unwrap();
        let summary = store.period_summary(range).await.unwrap();
        assert_eq!(summary.total_transaction, 2);
        assert_eq!(summary.total_revenue.minor(), 3 * 3500);
    }

    #[tokio::test]
    async fn period_summary_of_empty_range_is_zero() {
        let store = InMemoryStore::new();
        let range = TimeRange::new(noon(1), noon(1) + Duration::days(1)).unwrap();
        let summary = store.period_summary(range).await.unwrap();
        assert_eq!(summary, PeriodSummary::default());
        assert!(store.best_seller(range).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn period_summary_reports_revenue_overflow() {
        let store = InMemoryStore::new();
        for hour in [10, 11] {
            let mut uow = store.begin().await.unwrap();
            uow.insert_transaction(
                Money::from_minor(i64::MAX / 2 + 1),
                Utc.with_ymd_and_hms(2026, 2, 1, hour, 0, 0).unwrap(),
            )
            .await
            .unwrap();
            uow.commit().await.unwrap();
        }

        let range = TimeRange::new(noon(1) - Duration::days(1), noon(2)).unwrap();
        let result = store.period_summary(range).await;
        assert!(matches!(result, Err(StoreError::AmountOverflow(_))));
    }

    #[tokio::test]
    async fn best_seller_groups_by_name_and_breaks_ties_by_product_id() {
        let (store, first) = seeded_store().await;
        let second = store
            .create_product(NewProduct::new(
                "Teh Manis",
                Money::from_minor(5000),
                15,
                first.category_id,
            ))
            .await
            .unwrap();

        record_sale(&store, &second, "Teh Manis", 2, noon(1)).await;
        record_sale(&store, &first, "Kopi Susu", 1, noon(1)).await;
        record_sale(&store, &first, "Kopi Susu", 1, noon(1)).await;

        let range = TimeRange::new(noon(1) - Duration::hours(1), noon(2)).unwrap();
        let best = store.best_seller(range).await.unwrap().unwrap();
        assert_eq!(best.name, "Kopi Susu");
        assert_eq!(best.quantity_sold, 2);
    }
}
