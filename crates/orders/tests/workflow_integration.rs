//! End-to-end workflow scenarios against the in-memory store.

use common::{Money, ProductId, UserId};
use orders::{CartIssue, CartLine, InMemoryNotifier, OrderError, OrderWorkflow, PlaceOrder};
use store::{InMemoryShopStore, OrderStatus, Product, Recipient, ShopStore};

fn recipient(email: Option<&str>) -> Recipient {
    Recipient {
        first_name: "Aylar".to_string(),
        last_name: "Meredova".to_string(),
        phone: "+99361234567".to_string(),
        email: email.map(str::to_string),
        address: "Ashgabat, Oguzhan 13".to_string(),
        note: Some("call before delivery".to_string()),
    }
}

fn workflow_with(
    store: &InMemoryShopStore,
) -> OrderWorkflow<InMemoryShopStore, InMemoryNotifier> {
    OrderWorkflow::new(store.clone(), InMemoryNotifier::new())
}

/// A buyer orders two products; both decrements and the total happen in
/// one shot and the item snapshots carry the price at order time.
#[tokio::test]
async fn multi_product_checkout() {
    let store = InMemoryShopStore::new();
    let keyboard = Product::new("Keyboard", Money::from_cents(45_99), 10);
    let mouse = Product::new("Mouse", Money::from_cents(19_50), 4);
    store.insert_product(keyboard.clone()).await.unwrap();
    store.insert_product(mouse.clone()).await.unwrap();

    let workflow = workflow_with(&store);
    let user = UserId::new();
    let order = workflow
        .place_order(PlaceOrder {
            user: Some(user),
            recipient: recipient(None),
            lines: vec![
                CartLine {
                    product_id: keyboard.id,
                    quantity: 2,
                },
                CartLine {
                    product_id: mouse.id,
                    quantity: 1,
                },
            ],
        })
        .await
        .unwrap();

    // 2 * 45.99 + 19.50 = 111.48, computed in cents with no rounding.
    assert_eq!(order.total_amount, Money::from_cents(111_48));
    assert_eq!(order.total_amount, order.recomputed_total());
    assert_eq!(store.stock_of(keyboard.id).await, Some(8));
    assert_eq!(store.stock_of(mouse.id).await, Some(3));

    let mine = workflow.list_orders(user).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, order.id);
}

/// A cart with one bad line among good ones leaves everything untouched
/// and reports only the offending lines.
#[tokio::test]
async fn partial_failure_touches_nothing() {
    let store = InMemoryShopStore::new();
    let good = Product::new("Cable", Money::from_cents(5_00), 100);
    let scarce = Product::new("Dock", Money::from_cents(120_00), 1);
    store.insert_product(good.clone()).await.unwrap();
    store.insert_product(scarce.clone()).await.unwrap();

    let workflow = workflow_with(&store);
    let result = workflow
        .place_order(PlaceOrder {
            user: None,
            recipient: recipient(None),
            lines: vec![
                CartLine {
                    product_id: good.id,
                    quantity: 10,
                },
                CartLine {
                    product_id: scarce.id,
                    quantity: 2,
                },
            ],
        })
        .await;

    let Err(OrderError::Rejected(issues)) = result else {
        panic!("expected Rejected, got {result:?}");
    };
    assert_eq!(
        issues,
        vec![CartIssue::InsufficientStock {
            product_id: scarce.id,
            requested: 2,
            available: 1,
        }]
    );
    assert_eq!(store.stock_of(good.id).await, Some(100));
    assert_eq!(store.stock_of(scarce.id).await, Some(1));
    assert_eq!(store.order_count().await, 0);
}

/// Place, cancel, place again: the cancelled units are sellable again and
/// every order keeps a distinct number.
#[tokio::test]
async fn cancel_then_reorder() {
    let store = InMemoryShopStore::new();
    let product = Product::new("Lamp", Money::from_cents(30_00), 2);
    store.insert_product(product.clone()).await.unwrap();

    let workflow = workflow_with(&store);
    let user = UserId::new();
    let place = |qty| PlaceOrder {
        user: Some(user),
        recipient: recipient(None),
        lines: vec![CartLine {
            product_id: product.id,
            quantity: qty,
        }],
    };

    let first = workflow.place_order(place(2)).await.unwrap();
    assert_eq!(store.stock_of(product.id).await, Some(0));

    // Sold out: the next attempt reports what is actually available.
    let result = workflow.place_order(place(1)).await;
    assert!(matches!(
        result,
        Err(OrderError::Rejected(ref issues))
            if issues == &[CartIssue::InsufficientStock {
                product_id: product.id,
                requested: 1,
                available: 0,
            }]
    ));

    let cancelled = workflow.cancel_order(first.id, user).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(store.stock_of(product.id).await, Some(2));

    let second = workflow.place_order(place(1)).await.unwrap();
    assert_ne!(second.order_number, first.order_number);
    assert_eq!(store.stock_of(product.id).await, Some(1));

    // The cancelled order stays queryable with its items intact.
    let kept = workflow
        .get_order_for_user(first.id, user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.status, OrderStatus::Cancelled);
    assert_eq!(kept.item_count(), 1);
}

/// Two buyers race for the last unit: exactly one order exists afterwards
/// and stock never goes negative.
#[tokio::test(flavor = "multi_thread")]
async fn race_for_last_unit() {
    let store = InMemoryShopStore::new();
    let product = Product::new("Limited", Money::from_cents(99_00), 1);
    store.insert_product(product.clone()).await.unwrap();

    let workflow = std::sync::Arc::new(workflow_with(&store));
    let request = || PlaceOrder {
        user: None,
        recipient: recipient(None),
        lines: vec![CartLine {
            product_id: product.id,
            quantity: 1,
        }],
    };

    let a = tokio::spawn({
        let workflow = std::sync::Arc::clone(&workflow);
        let req = request();
        async move { workflow.place_order(req).await }
    });
    let b = tokio::spawn({
        let workflow = std::sync::Arc::clone(&workflow);
        let req = request();
        async move { workflow.place_order(req).await }
    });

    let (a, b) = tokio::join!(a, b);
    let results = [a.unwrap(), b.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    // The loser failed before commit (stock re-read) or at commit time.
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser,
        Err(OrderError::Rejected(_)) | Err(OrderError::Conflict)
    ));
    assert_eq!(store.stock_of(product.id).await, Some(0));
    assert_eq!(store.order_count().await, 1);
}

/// The full happy-path lifecycle walks the status chain one step at a
/// time; once delivered nothing moves anymore.
#[tokio::test]
async fn lifecycle_to_delivered() {
    let store = InMemoryShopStore::new();
    let product = Product::new("Chair", Money::from_cents(80_00), 3);
    store.insert_product(product.clone()).await.unwrap();

    let workflow = workflow_with(&store);
    let order = workflow
        .place_order(PlaceOrder {
            user: None,
            recipient: recipient(None),
            lines: vec![CartLine {
                product_id: product.id,
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    for to in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let updated = workflow.advance_status(order.id, to).await.unwrap();
        assert_eq!(updated.status, to);
    }

    let result = workflow
        .advance_status(order.id, OrderStatus::Cancelled)
        .await;
    assert!(matches!(
        result,
        Err(OrderError::InvalidTransition {
            current: OrderStatus::Delivered
        })
    ));
    // Delivered orders never hand stock back.
    assert_eq!(store.stock_of(product.id).await, Some(2));
}

/// Order numbers across many placements all share the shape and stay
/// unique.
#[tokio::test]
async fn order_numbers_are_unique_and_well_formed() {
    let store = InMemoryShopStore::new();
    let product = Product::new("Sticker", Money::from_cents(1_00), 1000);
    store.insert_product(product.clone()).await.unwrap();

    let workflow = workflow_with(&store);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..50 {
        let order = workflow
            .place_order(PlaceOrder {
                user: None,
                recipient: recipient(None),
                lines: vec![CartLine {
                    product_id: product.id,
                    quantity: 1,
                }],
            })
            .await
            .unwrap();
        assert!(orders::number::matches_format(&order.order_number));
        assert!(seen.insert(order.order_number), "duplicate order number");
    }
}

/// Unknown products and zero quantities show up as distinct issues in a
/// single response.
#[tokio::test]
async fn reports_mixed_issue_kinds_together() {
    let store = InMemoryShopStore::new();
    let product = Product::new("Mug", Money::from_cents(8_00), 5);
    store.insert_product(product.clone()).await.unwrap();
    let ghost = ProductId::new();

    let workflow = workflow_with(&store);
    let result = workflow
        .place_order(PlaceOrder {
            user: None,
            recipient: recipient(None),
            lines: vec![
                CartLine {
                    product_id: product.id,
                    quantity: 0,
                },
                CartLine {
                    product_id: ghost,
                    quantity: 1,
                },
            ],
        })
        .await;

    let Err(OrderError::Rejected(issues)) = result else {
        panic!("expected Rejected");
    };
    assert_eq!(issues.len(), 2);
    assert!(issues.contains(&CartIssue::InvalidQuantity {
        product_id: product.id
    }));
    assert!(issues.contains(&CartIssue::Unavailable { product_id: ghost }));
}
