pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod range;
pub mod store;

pub use common::{CategoryId, Money, ProductId, TransactionDetailId, TransactionId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    BestSeller, Category, NewCategory, NewProduct, NewTransactionDetail, PeriodSummary, Product,
    StockDecrement, Transaction, TransactionDetail,
};
pub use postgres::PostgresStore;
pub use range::TimeRange;
pub use store::{CatalogStore, SalesStore, UnitOfWork};
