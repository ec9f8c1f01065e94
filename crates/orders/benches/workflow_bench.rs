use common::Money;
use criterion::{Criterion, criterion_group, criterion_main};
use orders::{CartLine, InMemoryNotifier, OrderWorkflow, PlaceOrder};
use store::{InMemoryShopStore, Product, Recipient, ShopStore};

fn recipient() -> Recipient {
    Recipient {
        first_name: "Bench".to_string(),
        last_name: "Buyer".to_string(),
        phone: "+99300000000".to_string(),
        email: None,
        address: "Bench Street 1".to_string(),
        note: None,
    }
}

fn bench_place_single_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryShopStore::new();
    let product = Product::new("Widget", Money::from_cents(1000), u32::MAX);
    rt.block_on(async { store.insert_product(product.clone()).await.unwrap() });
    let workflow = OrderWorkflow::new(store, InMemoryNotifier::new());

    c.bench_function("workflow/place_single_item", |b| {
        b.iter(|| {
            rt.block_on(async {
                workflow
                    .place_order(PlaceOrder {
                        user: None,
                        recipient: recipient(),
                        lines: vec![CartLine {
                            product_id: product.id,
                            quantity: 1,
                        }],
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_ten_line_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryShopStore::new();
    let mut lines = Vec::new();
    rt.block_on(async {
        for i in 0..10 {
            let product = Product::new(
                format!("Product {i}"),
                Money::from_cents(100 * (i + 1)),
                u32::MAX,
            );
            lines.push(CartLine {
                product_id: product.id,
                quantity: 2,
            });
            store.insert_product(product).await.unwrap();
        }
    });
    let workflow = OrderWorkflow::new(store, InMemoryNotifier::new());

    c.bench_function("workflow/place_ten_line_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                workflow
                    .place_order(PlaceOrder {
                        user: None,
                        recipient: recipient(),
                        lines: lines.clone(),
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_place_then_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryShopStore::new();
    let product = Product::new("Widget", Money::from_cents(1000), u32::MAX);
    rt.block_on(async { store.insert_product(product.clone()).await.unwrap() });
    let user = common::UserId::new();
    let workflow = OrderWorkflow::new(store, InMemoryNotifier::new());

    c.bench_function("workflow/place_then_cancel", |b| {
        b.iter(|| {
            rt.block_on(async {
                let order = workflow
                    .place_order(PlaceOrder {
                        user: Some(user),
                        recipient: recipient(),
                        lines: vec![CartLine {
                            product_id: product.id,
                            quantity: 1,
                        }],
                    })
                    .await
                    .unwrap();
                workflow.cancel_order(order.id, user).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_place_single_item,
    bench_place_ten_line_cart,
    bench_place_then_cancel,
);
criterion_main!(benches);
