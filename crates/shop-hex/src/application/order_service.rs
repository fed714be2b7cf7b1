//! Order workflow: reservation, settlement, cancellation and the reads
//! around them.
//!
//! Stock is reserved line by line with conditional decrements. A failing line
//! releases every line reserved before it, so an order is either fully
//! reserved or leaves stock untouched. Settlement runs right after the order
//! is stored and is awaited before the response is built; its failures are
//! logged and never reach the caller.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shop_types::domain::order::{
    NewOrder, Order, OrderItem, OrderStatus, OrderTransition, PaymentOutcome, PaymentStatus,
};
use shop_types::domain::pagination::{PageRequest, Pagination};
use shop_types::domain::product::Product;
use shop_types::domain::user::{Principal, UserProfile};
use shop_types::domain::validation::ValidationError;
use shop_types::ports::order_repository::OrderFilter;
use shop_types::ports::payment::PaymentGateway;
use shop_types::ports::product_repository::StockChange;
use shop_types::ports::{RepoError, Store};
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_reference, require_admin};
use crate::cache::{self, ResponseCache};
use crate::errors::AppError;

const ORDER_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub product_id: Uuid,
    /// `None` when the product no longer exists.
    pub product: Option<Product>,
    pub quantity: u32,
    pub price_cents: i64,
}

/// An order with its products and owner expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: Uuid,
    pub user: Option<UserProfile>,
    pub items: Vec<OrderLineView>,
    pub total_amount_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderView>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderQuery {
    pub page: PageRequest,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        status: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let status = match status.map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(s.parse::<OrderStatus>()?),
        };
        Ok(Self {
            page: PageRequest::parse(page, limit),
            status,
        })
    }

    fn status_label(&self) -> Option<&'static str> {
        self.status.as_ref().map(OrderStatus::as_str)
    }
}

/// `ORD-YYYYMMDD-XXXXXXXX`, the code customers see.
pub fn generate_order_code() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect();
    format!("ORD-{}-{suffix}", Utc::now().format("%Y%m%d"))
}

pub struct OrderService<S: Store> {
    store: Arc<S>,
    cache: Arc<ResponseCache>,
    payment: Arc<dyn PaymentGateway>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>, cache: Arc<ResponseCache>, payment: Arc<dyn PaymentGateway>) -> Self {
        Self {
            store,
            cache,
            payment,
        }
    }

    pub async fn create_order(&self, actor: &Principal, body: NewOrder) -> Result<OrderView, AppError> {
        let requested = body.validate()?;
        let lines = requested
            .iter()
            .map(|line| Ok((parse_reference(&line.product, "product")?, line.quantity)))
            .collect::<Result<Vec<(Uuid, u32)>, AppError>>()?;

        let items = self.reserve(&lines).await?;
        let order = match self.persist(actor.user_id, &items).await {
            Ok(order) => order,
            Err(e) => {
                self.restock(&items).await;
                return Err(e);
            }
        };
        tracing::info!(
            order_id = %order.order_code,
            user_id = %order.user_id,
            total_cents = order.total_cents,
            lines = order.items.len(),
            "order created"
        );
        self.cache.invalidate_after_mutation();

        self.settle_payment(order.id).await;

        let current = self
            .store
            .get_order(order.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {} vanished", order.id)))?;
        self.expand(current).await
    }

    /// Reserves every line or none.
    async fn reserve(&self, lines: &[(Uuid, u32)]) -> Result<Vec<OrderItem>, AppError> {
        let mut reserved: Vec<OrderItem> = Vec::with_capacity(lines.len());
        for &(product_id, quantity) in lines {
            let failure = match self.store.decrement_stock(product_id, quantity).await {
                Ok(StockChange::Applied(product)) => {
                    reserved.push(OrderItem {
                        product_id,
                        quantity,
                        price_cents: product.price_cents,
                    });
                    continue;
                }
                Ok(StockChange::Insufficient { name, available }) => AppError::InsufficientStock {
                    product: name,
                    available,
                },
                Ok(StockChange::Missing) => AppError::NotFound("Product not found".into()),
                Err(e) => e.into(),
            };
            if !reserved.is_empty() {
                tracing::info!(lines = reserved.len(), "releasing partial reservation");
                self.restock(&reserved).await;
            }
            return Err(failure);
        }
        Ok(reserved)
    }

    async fn persist(&self, user_id: Uuid, items: &[OrderItem]) -> Result<Order, AppError> {
        for _ in 0..ORDER_CODE_ATTEMPTS {
            let order = Order::new(generate_order_code(), user_id, items.to_vec())?;
            match self.store.create_order(order).await {
                Ok(order) => return Ok(order),
                Err(RepoError::Duplicate(code)) => {
                    tracing::warn!(order_id = %code, "order code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(AppError::Internal(anyhow::anyhow!(
            "could not allocate a unique order code"
        )))
    }

    /// Puts stock back for each item. Failures are logged; the caller has
    /// already committed to the state change that triggered compensation.
    async fn restock(&self, items: &[OrderItem]) {
        for item in items {
            match self.store.increment_stock(item.product_id, item.quantity).await {
                Ok(Some(_)) => {}
                Ok(None) => tracing::warn!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    "cannot restock a product that no longer exists"
                ),
                Err(e) => tracing::error!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "restock failed"
                ),
            }
        }
    }

    /// Charges the order and records the outcome. Never fails: errors are
    /// logged and the cache is invalidated either way.
    pub async fn settle_payment(&self, order_id: Uuid) {
        if let Err(e) = self.try_settle(order_id).await {
            tracing::error!(%order_id, error = %e, "payment settlement failed");
        }
        self.cache.invalidate_after_mutation();
    }

    async fn try_settle(&self, order_id: Uuid) -> Result<(), AppError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

        let outcome = self.payment.charge(&order).await;
        let settled = match self
            .store
            .transition_order(order_id, OrderTransition::Settle(outcome))
            .await
        {
            Ok(Some(settled)) => settled,
            Ok(None) => return Err(AppError::NotFound(format!("order {order_id}"))),
            Err(RepoError::Rejected(reason)) => {
                // Cancelled while the charge was in flight; cancellation
                // already restocked.
                tracing::warn!(order_id = %order.order_code, %reason, "settlement skipped");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        match outcome {
            PaymentOutcome::Approved => {
                tracing::info!(order_id = %settled.order_code, "payment confirmed");
            }
            PaymentOutcome::Declined => {
                self.restock(&settled.items).await;
                tracing::info!(order_id = %settled.order_code, "payment declined, stock restored");
            }
        }
        Ok(())
    }

    pub async fn cancel_order(&self, actor: &Principal, code: &str) -> Result<OrderView, AppError> {
        let order = self
            .store
            .get_order_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
        if !order.visible_to(actor) {
            return Err(AppError::access_denied());
        }

        // Only the caller whose transition lands restocks.
        let cancelled = self
            .store
            .transition_order(order.id, OrderTransition::Cancel)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
        self.restock(&cancelled.items).await;
        tracing::info!(order_id = %cancelled.order_code, by = %actor.user_id, "order cancelled");
        self.cache.invalidate_after_mutation();

        self.expand(cancelled).await
    }

    pub async fn get_order(&self, actor: &Principal, code: &str) -> Result<OrderView, AppError> {
        let key = cache::order_key(code, &actor.user_id);
        if let Some(hit) = self.cache.get_as::<OrderView>(&key) {
            return Ok(hit);
        }

        let order = self
            .store
            .get_order_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
        if !order.visible_to(actor) {
            return Err(AppError::access_denied());
        }
        let view = self.expand(order).await?;
        self.cache.put(key, &view, cache::ORDER_TTL);
        Ok(view)
    }

    pub async fn customer_orders(&self, actor: &Principal, query: OrderQuery) -> Result<OrderPage, AppError> {
        let key = cache::user_orders_key(
            &actor.user_id,
            query.page.page,
            query.page.limit,
            query.status_label(),
        );
        let filter = OrderFilter {
            user_id: Some(actor.user_id),
            status: query.status,
        };
        self.cached_page(key, filter, query.page).await
    }

    pub async fn all_orders(&self, actor: &Principal, query: OrderQuery) -> Result<OrderPage, AppError> {
        require_admin(actor)?;
        let key = cache::all_orders_key(query.page.page, query.page.limit, query.status_label());
        let filter = OrderFilter {
            user_id: None,
            status: query.status,
        };
        self.cached_page(key, filter, query.page).await
    }

    async fn cached_page(
        &self,
        key: String,
        filter: OrderFilter,
        req: PageRequest,
    ) -> Result<OrderPage, AppError> {
        if let Some(hit) = self.cache.get_as::<OrderPage>(&key) {
            return Ok(hit);
        }
        let orders = self.store.list_orders(filter, req.offset(), req.limit).await?;
        let total = self.store.count_orders(filter).await?;
        let mut views = Vec::with_capacity(orders.len());
        for order in orders {
            views.push(self.expand(order).await?);
        }
        let page = OrderPage {
            orders: views,
            pagination: Pagination::new(req, total),
        };
        self.cache.put(key, &page, cache::ORDER_TTL);
        Ok(page)
    }

    async fn expand(&self, order: Order) -> Result<OrderView, AppError> {
        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            items.push(OrderLineView {
                product_id: item.product_id,
                product: self.store.get_product(item.product_id).await?,
                quantity: item.quantity,
                price_cents: item.price_cents,
            });
        }
        let user = self
            .store
            .get_user(order.user_id)
            .await?
            .map(|u| UserProfile::from(&u));
        Ok(OrderView {
            id: order.id,
            order_id: order.order_code,
            user_id: order.user_id,
            user,
            items,
            total_amount_cents: order.total_cents,
            status: order.status,
            payment_status: order.payment_status,
            created_at: order.created_at,
            updated_at: order.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::FixedPayment;
    use shop_repo::memory::InMemoryRepo;
    use shop_types::domain::order::OrderLineRequest;
    use shop_types::domain::product::NewProduct;
    use shop_types::domain::user::{Role, User};
    use shop_types::ports::product_repository::ProductRepository;
    use shop_types::ports::user_repository::UserRepository;

    struct Fixture {
        repo: Arc<InMemoryRepo>,
        payment: Arc<FixedPayment>,
        svc: OrderService<InMemoryRepo>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepo::new());
        let payment = Arc::new(FixedPayment::approving());
        let svc = OrderService::new(repo.clone(), Arc::new(ResponseCache::new()), payment.clone());
        Fixture { repo, payment, svc }
    }

    async fn user(repo: &InMemoryRepo, role: Role) -> Principal {
        let email = format!("{}@example.com", Uuid::new_v4());
        repo.create_user(User::new("U", &email, "h".into(), role))
            .await
            .unwrap()
            .principal()
    }

    async fn product(repo: &InMemoryRepo, price: i64, stock: i64) -> Product {
        repo.create_product(
            Product::new(NewProduct {
                name: "Widget".into(),
                description: "d".into(),
                price_cents: Some(price),
                stock: Some(stock),
                category: "c".into(),
            })
            .unwrap(),
        )
        .await
        .unwrap()
    }

    fn body(lines: &[(Uuid, i64)]) -> NewOrder {
        NewOrder {
            items: lines
                .iter()
                .map(|(id, q)| OrderLineRequest {
                    product: id.to_string(),
                    quantity: Some(*q),
                })
                .collect(),
        }
    }

    async fn stock(repo: &InMemoryRepo, id: Uuid) -> u32 {
        repo.get_product(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn successful_order_is_confirmed_and_totals_snapshot_prices() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 500, 3).await;
        let b = product(&f.repo, 250, 10).await;

        let view = f
            .svc
            .create_order(&alice, body(&[(a.id, 2), (b.id, 1)]))
            .await
            .unwrap();
        assert_eq!(view.total_amount_cents, 1250);
        let sum: i64 = view
            .items
            .iter()
            .map(|l| l.price_cents * i64::from(l.quantity))
            .sum();
        assert_eq!(sum, view.total_amount_cents);
        assert_eq!(view.status, OrderStatus::Confirmed);
        assert_eq!(view.payment_status, PaymentStatus::Success);
        assert!(view.order_id.starts_with("ORD-"));
        assert_eq!(view.user.as_ref().map(|u| u.id), Some(alice.user_id));
        assert!(view.items[0].product.is_some());
        assert_eq!(stock(&f.repo, a.id).await, 1);
        assert_eq!(stock(&f.repo, b.id).await, 9);

        // later price changes do not touch the order
        f.repo.products.get_mut(&a.id).unwrap().price_cents = 9999;
        let again = f.svc.get_order(&alice, &view.order_id).await.unwrap();
        assert_eq!(again.total_amount_cents, 1250);
        assert_eq!(again.items[0].price_cents, 500);
    }

    #[tokio::test]
    async fn declined_payment_restores_stock_once() {
        let f = fixture();
        f.payment.set_decline(true);
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 700, 3).await;

        let view = f.svc.create_order(&alice, body(&[(a.id, 2)])).await.unwrap();
        assert_eq!(view.status, OrderStatus::Created);
        assert_eq!(view.payment_status, PaymentStatus::Failed);
        assert_eq!(view.total_amount_cents, 1400);
        assert_eq!(stock(&f.repo, a.id).await, 3);

        // settling again is rejected by the guard and must not restock twice
        f.svc.settle_payment(view.id).await;
        assert_eq!(stock(&f.repo, a.id).await, 3);

        let cancel = f.svc.cancel_order(&alice, &view.order_id).await;
        assert!(matches!(cancel, Err(AppError::InvalidState(m)) if m.contains("Payment failed")));
        assert_eq!(stock(&f.repo, a.id).await, 3);
    }

    #[tokio::test]
    async fn insufficient_stock_changes_nothing() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 2).await;

        let res = f.svc.create_order(&alice, body(&[(a.id, 5)])).await;
        assert!(matches!(
            res,
            Err(AppError::InsufficientStock { available: 2, .. })
        ));
        assert_eq!(stock(&f.repo, a.id).await, 2);
        assert_eq!(f.repo.orders.len(), 0);
    }

    #[tokio::test]
    async fn overflowing_total_releases_reserved_stock() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let mut pricey = Product::new(NewProduct {
            name: "Yacht".into(),
            description: "d".into(),
            price_cents: Some(1),
            stock: Some(5),
            category: "c".into(),
        })
        .unwrap();
        // stored rows may predate the price ceiling
        pricey.price_cents = i64::MAX / 2 + 1;
        let pricey = f.repo.create_product(pricey).await.unwrap();

        let res = f.svc.create_order(&alice, body(&[(pricey.id, 2)])).await;
        assert!(matches!(
            res,
            Err(AppError::Validation { details }) if details == ["total amount overflows"]
        ));
        assert_eq!(stock(&f.repo, pricey.id).await, 5);
        assert_eq!(f.repo.orders.len(), 0);
    }

    #[tokio::test]
    async fn multi_line_reservation_is_all_or_nothing() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 5).await;
        let b = product(&f.repo, 100, 1).await;

        let res = f.svc.create_order(&alice, body(&[(a.id, 3), (b.id, 2)])).await;
        assert!(matches!(res, Err(AppError::InsufficientStock { .. })));
        assert_eq!(stock(&f.repo, a.id).await, 5);
        assert_eq!(stock(&f.repo, b.id).await, 1);

        let missing = Uuid::new_v4();
        let res = f.svc.create_order(&alice, body(&[(a.id, 1), (missing, 1)])).await;
        assert!(matches!(res, Err(AppError::NotFound(_))));
        assert_eq!(stock(&f.repo, a.id).await, 5);
        assert_eq!(f.repo.orders.len(), 0);
    }

    #[tokio::test]
    async fn malformed_reference_is_rejected_before_any_reservation() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 5).await;
        let res = f
            .svc
            .create_order(
                &alice,
                NewOrder {
                    items: vec![
                        OrderLineRequest {
                            product: a.id.to_string(),
                            quantity: Some(1),
                        },
                        OrderLineRequest {
                            product: "xyz".into(),
                            quantity: Some(1),
                        },
                    ],
                },
            )
            .await;
        assert!(matches!(res, Err(AppError::InvalidReference(_))));
        assert_eq!(stock(&f.repo, a.id).await, 5);
    }

    #[tokio::test]
    async fn cancel_restores_once_and_second_cancel_is_invalid() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 4).await;
        let view = f.svc.create_order(&alice, body(&[(a.id, 3)])).await.unwrap();
        assert_eq!(stock(&f.repo, a.id).await, 1);

        let cancelled = f.svc.cancel_order(&alice, &view.order_id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock(&f.repo, a.id).await, 4);

        let again = f.svc.cancel_order(&alice, &view.order_id).await;
        assert!(matches!(again, Err(AppError::InvalidState(m)) if m == "Order already cancelled"));
        assert_eq!(stock(&f.repo, a.id).await, 4);
    }

    #[tokio::test]
    async fn concurrent_cancels_restock_exactly_once() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 2).await;
        let view = f.svc.create_order(&alice, body(&[(a.id, 2)])).await.unwrap();
        let svc = Arc::new(f.svc);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            let code = view.order_id.clone();
            handles.push(tokio::spawn(async move { svc.cancel_order(&alice, &code).await.is_ok() }));
        }
        let mut wins = 0;
        for h in handles {
            if h.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(stock(&f.repo, a.id).await, 2);
    }

    #[tokio::test]
    async fn delivered_orders_cannot_be_cancelled() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let a = product(&f.repo, 100, 2).await;
        let view = f.svc.create_order(&alice, body(&[(a.id, 1)])).await.unwrap();
        f.repo.orders.get_mut(&view.id).unwrap().status = OrderStatus::Delivered;

        let res = f.svc.cancel_order(&alice, &view.order_id).await;
        assert!(matches!(res, Err(AppError::InvalidState(m)) if m == "Cannot cancel delivered order"));
        assert_eq!(stock(&f.repo, a.id).await, 1);
    }

    #[tokio::test]
    async fn access_rules() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let bob = user(&f.repo, Role::Customer).await;
        let admin = user(&f.repo, Role::Admin).await;
        let a = product(&f.repo, 100, 5).await;
        let view = f.svc.create_order(&alice, body(&[(a.id, 1)])).await.unwrap();

        assert!(matches!(
            f.svc.get_order(&bob, &view.order_id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.svc.cancel_order(&bob, &view.order_id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(f.svc.get_order(&admin, &view.order_id).await.is_ok());
        assert!(matches!(
            f.svc.get_order(&alice, "ORD-NOPE").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.svc.all_orders(&alice, OrderQuery::parse(None, None, None).unwrap()).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(f.svc.cancel_order(&admin, &view.order_id).await.is_ok());
    }

    #[tokio::test]
    async fn listings_are_scoped_filtered_and_refreshed() {
        let f = fixture();
        let alice = user(&f.repo, Role::Customer).await;
        let bob = user(&f.repo, Role::Customer).await;
        let admin = user(&f.repo, Role::Admin).await;
        let a = product(&f.repo, 100, 50).await;

        let first = f.svc.create_order(&alice, body(&[(a.id, 1)])).await.unwrap();
        f.svc.create_order(&alice, body(&[(a.id, 1)])).await.unwrap();
        f.svc.create_order(&bob, body(&[(a.id, 1)])).await.unwrap();

        let all_mine = OrderQuery::parse(None, None, None).unwrap();
        let mine = f.svc.customer_orders(&alice, all_mine).await.unwrap();
        assert_eq!(mine.pagination.total, 2);
        assert!(mine.orders.iter().all(|o| o.user_id == alice.user_id));

        let everyone = f.svc.all_orders(&admin, all_mine).await.unwrap();
        assert_eq!(everyone.pagination.total, 3);

        // cached listing must reflect a cancellation right away
        f.svc.cancel_order(&alice, &first.order_id).await.unwrap();
        let cancelled = OrderQuery::parse(Some("1"), Some("1"), Some("cancelled")).unwrap();
        let page = f.svc.customer_orders(&alice, cancelled).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.orders[0].order_id, first.order_id);

        let bobs = f.svc.customer_orders(&bob, cancelled).await.unwrap();
        assert_eq!(bobs.pagination.total, 0);
    }

    #[test]
    fn order_query_rejects_unknown_status() {
        assert!(OrderQuery::parse(None, None, Some("lost")).is_err());
        let q = OrderQuery::parse(Some("x"), None, Some("")).unwrap();
        assert_eq!(q.status, None);
        assert_eq!(q.page, PageRequest::default());
    }

    #[test]
    fn order_codes_have_expected_shape() {
        let code = generate_order_code();
        assert_eq!(code.len(), "ORD-20260101-ABCDEFGH".len());
        assert!(code.starts_with("ORD-"));
        assert!(code[13..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
