//! Checkout against PostgreSQL.
//!
//! Exercises the full checkout path over a real database: row locks,
//! conditional decrements and rollback. One container is shared by the
//! whole file; every test gets its own database inside it, so the tests
//! can run in parallel.
//!
//! ```bash
//! cargo test -p checkout --test postgres_checkout
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use checkout::{CheckoutError, CheckoutItem, CheckoutService};
use futures_util::future::join_all;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use store::{CatalogStore, Money, NewCategory, NewProduct, PostgresStore, Product};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    base_url: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();
static NEXT_DATABASE: AtomicUsize = AtomicUsize::new(0);

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            Arc::new(ContainerInfo {
                container,
                base_url: format!("postgres://postgres:postgres@{}:{}", host, port),
            })
        })
        .await
        .clone()
}

/// Creates a migrated, empty database and a checkout service over it.
async fn get_test_service() -> (Arc<CheckoutService<PostgresStore>>, PgPool) {
    let info = get_container_info().await;
    let database = format!(
        "checkout_{}",
        NEXT_DATABASE.fetch_add(1, Ordering::SeqCst)
    );

    let admin = PgPool::connect(&format!("{}/postgres", info.base_url))
        .await
        .unwrap();
    sqlx::query(&format!("CREATE DATABASE {database}"))
        .execute(&admin)
        .await
        .unwrap();
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&format!("{}/{}", info.base_url, database))
        .await
        .unwrap();
    let store = PostgresStore::new(pool.clone());
    store.run_migrations().await.unwrap();

    (Arc::new(CheckoutService::new(store)), pool)
}

async fn seed_product(
    service: &CheckoutService<PostgresStore>,
    name: &str,
    price: i64,
    stock: i32,
) -> Product {
    let category = service
        .store()
        .create_category(NewCategory::new("Minuman", "Drinks"))
        .await
        .unwrap();
    service
        .store()
        .create_product(NewProduct::new(
            name,
            Money::from_minor(price),
            stock,
            category.id,
        ))
        .await
        .unwrap()
}

async fn stock_of(service: &CheckoutService<PostgresStore>, product: &Product) -> i32 {
    service
        .store()
        .find_product(product.id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

async fn row_count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_concurrent_checkouts_on_last_units() {
    let (service, pool) = get_test_service().await;
    let kopi = seed_product(&service, "Kopi Susu", 3500, 10).await;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let service = service.clone();
            let product_id = kopi.id;
            tokio::spawn(async move {
                service
                    .checkout(&[CheckoutItem::new(product_id, 6)])
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let succeeded: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(succeeded.len(), 1);
    assert_eq!(succeeded[0].total_amount, Money::from_minor(21000));

    let failure = results
        .into_iter()
        .find_map(|r| r.err())
        .expect("one checkout must fail");
    match failure {
        CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            assert_eq!(product_id, kopi.id);
            assert_eq!(requested, 6);
            assert_eq!(available, 4);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(stock_of(&service, &kopi).await, 4);
    assert_eq!(row_count(&pool, "transactions").await, 1);
    assert_eq!(row_count(&pool, "transaction_details").await, 1);
}

#[tokio::test]
async fn test_opposite_line_order_carts_all_commit() {
    let (service, pool) = get_test_service().await;
    let kopi = seed_product(&service, "Kopi Susu", 3500, 100).await;
    let teh = seed_product(&service, "Teh Manis", 5000, 100).await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = service.clone();
            let cart = if i % 2 == 0 {
                vec![CheckoutItem::new(kopi.id, 1), CheckoutItem::new(teh.id, 2)]
            } else {
                vec![CheckoutItem::new(teh.id, 2), CheckoutItem::new(kopi.id, 1)]
            };
            tokio::spawn(async move { service.checkout(&cart).await })
        })
        .collect();

    for joined in join_all(handles).await {
        let transaction = joined.unwrap().unwrap();
        assert_eq!(transaction.total_amount, Money::from_minor(13500));
        assert_eq!(transaction.transaction_details.len(), 2);
    }

    assert_eq!(stock_of(&service, &kopi).await, 80);
    assert_eq!(stock_of(&service, &teh).await, 60);
    assert_eq!(row_count(&pool, "transactions").await, 20);
    assert_eq!(row_count(&pool, "transaction_details").await, 40);
}

#[tokio::test]
async fn test_cart_order_is_kept_in_details() {
    let (service, _pool) = get_test_service().await;
    let kopi = seed_product(&service, "Kopi Susu", 3500, 10).await;
    let teh = seed_product(&service, "Teh Manis", 5000, 10).await;

    let transaction = service
        .checkout(&[CheckoutItem::new(teh.id, 1), CheckoutItem::new(kopi.id, 2)])
        .await
        .unwrap();

    let names: Vec<_> = transaction
        .transaction_details
        .iter()
        .map(|d| d.product_name.as_str())
        .collect();
    assert_eq!(names, vec!["Teh Manis", "Kopi Susu"]);
}

#[tokio::test]
async fn test_missing_product_on_later_line_writes_nothing() {
    let (service, pool) = get_test_service().await;
    let kopi = seed_product(&service, "Kopi Susu", 3500, 10).await;

    let err = service
        .checkout(&[
            CheckoutItem::new(kopi.id, 2),
            CheckoutItem::new(store::ProductId::new(4040), 1),
        ])
        .await
        .unwrap_err();
    assert!(
        matches!(err, CheckoutError::ProductNotFound(id) if id.as_i64() == 4040),
        "{err:?}"
    );

    assert_eq!(stock_of(&service, &kopi).await, 10);
    assert_eq!(row_count(&pool, "transactions").await, 0);
    assert_eq!(row_count(&pool, "transaction_details").await, 0);
}
