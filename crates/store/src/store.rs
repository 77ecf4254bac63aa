use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    BestSeller, Category, CategoryId, Money, NewCategory, NewProduct, NewTransactionDetail,
    PeriodSummary, Product, ProductId, Result, StockDecrement, TimeRange, Transaction,
    TransactionDetailId, TransactionId,
};

/// Catalog operations consumed by the sales path.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up a product by id. Returns None if it doesn't exist.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Looks up a category by id. Returns None if it doesn't exist.
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Lists the products referencing a category, ordered by id.
    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>>;

    /// Creates a category and returns it with its assigned id.
    async fn create_category(&self, category: NewCategory) -> Result<Category>;

    /// Creates a product.
    ///
    /// Fails with `CategoryNotFound` if the referenced category is absent.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;
}

/// Sales persistence: atomic units of work for checkout plus the read
/// queries the report aggregator runs.
#[async_trait]
pub trait SalesStore: CatalogStore {
    /// Opens a unit of work. Its effects become visible only on commit.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Loads a persisted transaction with its details in insertion order.
    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>>;

    /// Sums `total_amount` and counts transactions created inside `range`.
    async fn period_summary(&self, range: TimeRange) -> Result<PeriodSummary>;

    /// Finds the product name with the highest summed quantity sold inside
    /// `range`. Ties go to the lowest product id, then the name.
    async fn best_seller(&self, range: TimeRange) -> Result<Option<BestSeller>>;
}

/// An open atomic unit of work against the store.
///
/// Dropping a unit of work without calling [`UnitOfWork::commit`] discards
/// every change made through it.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Reads a product as seen from inside this unit of work.
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>>;

    /// Subtracts `quantity` from a product's stock only if at least
    /// `quantity` units remain.
    async fn decrement_stock(&mut self, id: ProductId, quantity: i32) -> Result<StockDecrement>;

    /// Writes a transaction header and returns its assigned id.
    async fn insert_transaction(
        &mut self,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId>;

    /// Writes one transaction line and returns its assigned id.
    async fn insert_detail(&mut self, detail: &NewTransactionDetail)
    -> Result<TransactionDetailId>;

    /// Makes every change durable and visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}
