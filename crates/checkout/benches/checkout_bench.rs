use checkout::{CheckoutItem, CheckoutService};
use criterion::{Criterion, criterion_group, criterion_main};
use store::{CatalogStore, InMemoryStore, Money, NewCategory, NewProduct, ProductId};

async fn seeded_store(products: usize, stock: i32) -> (InMemoryStore, Vec<ProductId>) {
    let store = InMemoryStore::new();
    let category = store
        .create_category(NewCategory::new("Bench", "Benchmark category"))
        .await
        .unwrap();

    let mut ids = Vec::with_capacity(products);
    for i in 0..products {
        let product = store
            .create_product(NewProduct::new(
                format!("Product {i}"),
                Money::from_minor(1000 + i as i64),
                stock,
                category.id,
            ))
            .await
            .unwrap();
        ids.push(product.id);
    }
    (store, ids)
}

fn bench_single_line_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, ids) = rt.block_on(seeded_store(1, i32::MAX));
    let service = CheckoutService::new(store);
    let cart = [CheckoutItem::new(ids[0], 1)];

    c.bench_function("checkout/single_line", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.checkout(&cart).await.unwrap();
            });
        });
    });
}

fn bench_ten_line_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, ids) = rt.block_on(seeded_store(10, i32::MAX));
    let service = CheckoutService::new(store);
    let cart: Vec<CheckoutItem> = ids.iter().map(|id| CheckoutItem::new(*id, 2)).collect();

    c.bench_function("checkout/ten_lines", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.checkout(&cart).await.unwrap();
            });
        });
    });
}

fn bench_rejected_checkout(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (store, ids) = rt.block_on(seeded_store(1, 1));
    let service = CheckoutService::new(store);
    let cart = [CheckoutItem::new(ids[0], 5)];

    c.bench_function("checkout/insufficient_stock", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.checkout(&cart).await.unwrap_err();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_single_line_checkout,
    bench_ten_line_checkout,
    bench_rejected_checkout
);
criterion_main!(benches);
