use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

use crate::{
    BestSeller, Category, CategoryId, Money, NewCategory, NewProduct, NewTransactionDetail,
    PeriodSummary, Product, ProductId, Result, StockDecrement, StoreError, TimeRange, Transaction,
    TransactionDetail, TransactionDetailId, TransactionId,
    store::{CatalogStore, SalesStore, UnitOfWork},
};

const PRODUCT_COLUMNS: &str = "id, name, price, stock, category_id, created_at";

/// PostgreSQL-backed catalog and sales store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            price: Money::from_minor(row.try_get("price")?),
            stock: row.try_get("stock")?,
            category_id: CategoryId::new(row.try_get("category_id")?),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_category(row: PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        })
    }

    fn row_to_detail(row: PgRow) -> Result<TransactionDetail> {
        Ok(TransactionDetail {
            id: TransactionDetailId::new(row.try_get("id")?),
            transaction_id: TransactionId::new(row.try_get("transaction_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            subtotal: Money::from_minor(row.try_get("subtotal")?),
        })
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_category).transpose()
    }

    async fn list_products_by_category(&self, id: CategoryId) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = $1 ORDER BY id ASC"
        ))
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_product).collect()
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category> {
        if category.name.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_category(row)
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        product.validate()?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, price, stock, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(product.price.minor())
        .bind(product.stock)
        .bind(product.category_id.as_i64())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("products_category_id_fkey")
            {
                return StoreError::CategoryNotFound(product.category_id);
            }
            StoreError::Database(e)
        })?;

        Self::row_to_product(row)
    }
}

#[async_trait]
impl SalesStore for PostgresStore {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    async fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>> {
        let header = sqlx::query(
            "SELECT id, total_amount, created_at FROM transactions WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let rows = sqlx::query(
            r#"
            SELECT id, transaction_id, product_id, product_name, quantity, subtotal
            FROM transaction_details
            WHERE transaction_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Transaction {
            id: TransactionId::new(header.try_get("id")?),
            total_amount: Money::from_minor(header.try_get("total_amount")?),
            created_at: header.try_get("created_at")?,
            transaction_details: rows
                .into_iter()
                .map(Self::row_to_detail)
                .collect::<Result<Vec<_>>>()?,
        }))
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, range),
        fields(start = %range.start(), end = %range.end())
    )]
    async fn period_summary(&self, range: TimeRange) -> Result<PeriodSummary> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(total_amount), 0)::BIGINT AS total_revenue,
                COUNT(*) AS total_transaction
            FROM transactions
            WHERE created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodSummary {
            total_revenue: Money::from_minor(row.try_get("total_revenue")?),
            total_transaction: row.try_get("total_transaction")?,
        })
    }

    #[tracing::instrument(
        level = "debug",
        skip(self, range),
        fields(start = %range.start(), end = %range.end())
    )]
    async fn best_seller(&self, range: TimeRange) -> Result<Option<BestSeller>> {
        let row = sqlx::query(
            r#"
            SELECT
                td.product_name,
                SUM(td.quantity)::BIGINT AS quantity_sold
            FROM transaction_details td
            JOIN transactions t ON td.transaction_id = t.id
            WHERE t.created_at >= $1 AND t.created_at < $2
            GROUP BY td.product_name
            ORDER BY quantity_sold DESC, MIN(td.product_id) ASC, td.product_name ASC
            LIMIT 1
            "#,
        )
        .bind(range.start())
        .bind(range.end())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(BestSeller {
                name: row.try_get("product_name")?,
                quantity_sold: row.try_get("quantity_sold")?,
            })),
            None => Ok(None),
        }
    }
}

/// Unit of work backed by a PostgreSQL transaction.
///
/// Dropping it without commit rolls the database transaction back.
struct PostgresUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn find_product(&mut self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(PostgresStore::row_to_product).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn decrement_stock(&mut self, id: ProductId, quantity: i32) -> Result<StockDecrement> {
        if quantity <= 0 {
            return Err(StoreError::InvalidInput(format!(
                "decrement quantity must be positive, got {quantity}"
            )));
        }

        // The stock predicate is re-checked after any row lock wait, so two
        // concurrent decrements can never both pass against the same units.
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2 RETURNING stock",
        )
        .bind(id.as_i64())
        .bind(quantity)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(remaining) = remaining {
            return Ok(StockDecrement::Applied { remaining });
        }

        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await?;

        tracing::debug!(?available, "conditional decrement not applied");
        Ok(match available {
            Some(available) => StockDecrement::Insufficient { available },
            None => StockDecrement::Missing,
        })
    }

    async fn insert_transaction(
        &mut self,
        total_amount: Money,
        created_at: DateTime<Utc>,
    ) -> Result<TransactionId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO transactions (total_amount, created_at) VALUES ($1, $2) RETURNING id",
        )
        .bind(total_amount.minor())
        .bind(created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(TransactionId::new(id))
    }

    async fn insert_detail(
        &mut self,
        detail: &NewTransactionDetail,
    ) -> Result<TransactionDetailId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO transaction_details (transaction_id, product_id, product_name, quantity, subtotal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(detail.transaction_id.as_i64())
        .bind(detail.product_id.as_i64())
        .bind(&detail.product_name)
        .bind(detail.quantity)
        .bind(detail.subtotal.minor())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(TransactionDetailId::new(id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
