use shop_hex::domain::order::{NewOrder, OrderLineRequest, OrderStatus, PaymentStatus};
use shop_hex::domain::pagination::PageRequest;
use shop_hex::domain::product::{NewProduct, StockUpdate};
use shop_hex::domain::user::{Credentials, Registration};
use shop_hex::application::order_service::OrderQuery;
use shop_hex::cache::ResponseCache;
use shop_hex::errors::AppError;
use shop_hex::inbound::http::AppState;
use shop_hex::payment::FixedPayment;
use shop_hex::security::{SaltedSha256, SessionTokens};
use shop_repo::memory::InMemoryRepo;
use std::sync::Arc;
use std::time::Duration;

fn state(payment: Arc<FixedPayment>) -> (AppState<InMemoryRepo>, Arc<ResponseCache>) {
    let cache = Arc::new(ResponseCache::new());
    let state = AppState::new(
        Arc::new(InMemoryRepo::new()),
        cache.clone(),
        payment,
        Arc::new(SaltedSha256),
        Arc::new(SessionTokens::new(Duration::from_secs(300))),
        10,
    );
    (state, cache)
}

fn registration(name: &str, role: &str) -> Registration {
    Registration {
        name: name.into(),
        email: format!("{}@example.com", name.to_lowercase()),
        password: "hunter22".into(),
        role: Some(role.into()),
    }
}

fn order_of(product: &str, quantity: i64) -> NewOrder {
    NewOrder {
        items: vec![OrderLineRequest {
            product: product.into(),
            quantity: Some(quantity),
        }],
    }
}

// End-to-end service flow against the in-memory adapter.
#[tokio::test]
async fn register_stock_order_cancel_flow() {
    let payment = Arc::new(FixedPayment::approving());
    let (app, cache) = state(payment.clone());

    let (_, admin_token) = app.auth.register(registration("Root", "Admin")).await.unwrap();
    let admin = app.auth.authenticate(&admin_token).unwrap();
    app.auth.register(registration("Eve", "Customer")).await.unwrap();
    let eve_token = app
        .auth
        .login(Credentials {
            email: "eve@example.com".into(),
            password: "hunter22".into(),
        })
        .await
        .unwrap();
    let eve = app.auth.authenticate(&eve_token).unwrap();

    let gadget = app
        .inventory
        .create_product(
            &admin,
            NewProduct {
                name: "Gadget".into(),
                description: "Pocket gadget".into(),
                price_cents: Some(700),
                stock: Some(3),
                category: "tools".into(),
            },
        )
        .await
        .unwrap();
    let gadget_id = gadget.id.to_string();

    // warm the caches so that later reads prove invalidation
    app.inventory.list_products(PageRequest::default()).await.unwrap();
    app.inventory.get_product(&gadget_id).await.unwrap();
    assert!(!cache.is_empty());

    let order = app.orders.create_order(&eve, order_of(&gadget_id, 2)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Success);
    assert_eq!(order.total_amount_cents, 1400);
    assert_eq!(app.inventory.get_product(&gadget_id).await.unwrap().stock, 1);

    let mine = app
        .orders
        .customer_orders(&eve, OrderQuery::parse(None, None, Some("confirmed")).unwrap())
        .await
        .unwrap();
    assert_eq!(mine.orders.len(), 1);

    app.orders.cancel_order(&eve, &order.order_id).await.unwrap();
    let listing = app.inventory.list_products(PageRequest::default()).await.unwrap();
    assert_eq!(listing.products[0].stock, 3);

    let all = app
        .orders
        .all_orders(&admin, OrderQuery::parse(None, None, Some("CANCELLED")).unwrap())
        .await
        .unwrap();
    assert_eq!(all.pagination.total, 1);

    // a declined charge leaves the order unpaid and the stock where it was
    payment.set_decline(true);
    let declined = app.orders.create_order(&eve, order_of(&gadget_id, 3)).await.unwrap();
    assert_eq!(declined.status, OrderStatus::Created);
    assert_eq!(declined.payment_status, PaymentStatus::Failed);
    assert_eq!(app.inventory.get_product(&gadget_id).await.unwrap().stock, 3);

    app.inventory
        .update_stock(&admin, &gadget_id, StockUpdate { stock: Some(0) })
        .await
        .unwrap();
    let sold_out = app.orders.create_order(&eve, order_of(&gadget_id, 1)).await;
    assert!(matches!(
        sold_out,
        Err(AppError::InsufficientStock { available: 0, .. })
    ));
}

#[tokio::test]
async fn customers_cannot_reach_admin_operations() {
    let (app, _) = state(Arc::new(FixedPayment::approving()));
    let (_, token) = app.auth.register(registration("Mallory", "Customer")).await.unwrap();
    let mallory = app.auth.authenticate(&token).unwrap();

    assert!(matches!(
        app.inventory.create_product(&mallory, NewProduct::default()).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        app.orders
            .all_orders(&mallory, OrderQuery::parse(None, None, None).unwrap())
            .await,
        Err(AppError::Forbidden(_))
    ));
}
