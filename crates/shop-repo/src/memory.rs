use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shop_types::domain::order::{Order, OrderTransition};
use shop_types::domain::product::Product;
use shop_types::domain::user::{normalize_email, User};
use shop_types::ports::order_repository::{OrderFilter, OrderRepository};
use shop_types::ports::product_repository::{ProductRepository, StockChange};
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use std::sync::Arc;
use uuid::Uuid;

/// Every mutation happens under the `DashMap` write guard of the touched
/// entry, which makes conditional updates atomic per record.
#[derive(Clone)]
pub struct InMemoryRepo {
    pub products: Arc<DashMap<Uuid, Product>>,
    pub orders: Arc<DashMap<Uuid, Order>>,
    order_codes: Arc<DashMap<String, Uuid>>,
    pub users: Arc<DashMap<Uuid, User>>,
    emails: Arc<DashMap<String, Uuid>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            products: Arc::new(DashMap::new()),
            orders: Arc::new(DashMap::new()),
            order_codes: Arc::new(DashMap::new()),
            users: Arc::new(DashMap::new()),
            emails: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn page<T>(mut rows: Vec<T>, offset: u64, limit: u32, key: impl Fn(&T) -> chrono::DateTime<chrono::Utc>) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows.into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(limit as usize)
        .collect()
}

#[async_trait]
impl ProductRepository for InMemoryRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        self.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        Ok(self.products.get(&id).map(|r| r.clone()))
    }

    async fn list_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, RepoError> {
        let rows = self.products.iter().map(|kv| kv.value().clone()).collect();
        Ok(page(rows, offset, limit, |p: &Product| p.created_at))
    }

    async fn count_products(&self) -> Result<u64, RepoError> {
        Ok(self.products.len() as u64)
    }

    async fn set_stock(&self, id: Uuid, stock: u32) -> Result<Option<Product>, RepoError> {
        if let Some(mut p) = self.products.get_mut(&id) {
            p.set_stock(stock);
            return Ok(Some(p.clone()));
        }
        Ok(None)
    }

    async fn decrement_stock(&self, id: Uuid, qty: u32) -> Result<StockChange, RepoError> {
        let Some(mut p) = self.products.get_mut(&id) else {
            return Ok(StockChange::Missing);
        };
        if p.stock < qty {
            return Ok(StockChange::Insufficient {
                name: p.name.clone(),
                available: p.stock,
            });
        }
        let remaining = p.stock - qty;
        p.set_stock(remaining);
        Ok(StockChange::Applied(p.clone()))
    }

    async fn increment_stock(&self, id: Uuid, qty: u32) -> Result<Option<Product>, RepoError> {
        if let Some(mut p) = self.products.get_mut(&id) {
            let restored = p.stock.checked_add(qty).ok_or_else(|| {
                RepoError::DbError(format!("stock overflow for product {id}"))
            })?;
            p.set_stock(restored);
            return Ok(Some(p.clone()));
        }
        Ok(None)
    }
}

#[async_trait]
impl OrderRepository for InMemoryRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        match self.order_codes.entry(order.order_code.clone()) {
            Entry::Occupied(_) => return Err(RepoError::Duplicate(order.order_code)),
            Entry::Vacant(v) => {
                v.insert(order.id);
            }
        }
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        Ok(self.orders.get(&id).map(|r| r.clone()))
    }

    async fn get_order_by_code(&self, code: &str) -> Result<Option<Order>, RepoError> {
        let Some(id) = self.order_codes.get(code).map(|r| *r) else {
            return Ok(None);
        };
        self.get_order(id).await
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepoError> {
        let rows = self
            .orders
            .iter()
            .filter(|kv| filter.matches(kv.value()))
            .map(|kv| kv.value().clone())
            .collect();
        Ok(page(rows, offset, limit, |o: &Order| o.created_at))
    }

    async fn count_orders(&self, filter: OrderFilter) -> Result<u64, RepoError> {
        Ok(self.orders.iter().filter(|kv| filter.matches(kv.value())).count() as u64)
    }

    async fn transition_order(
        &self,
        id: Uuid,
        transition: OrderTransition,
    ) -> Result<Option<Order>, RepoError> {
        if let Some(mut o) = self.orders.get_mut(&id) {
            o.apply(transition)?;
            return Ok(Some(o.clone()));
        }
        Ok(None)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        match self.emails.entry(normalize_email(&user.email)) {
            Entry::Occupied(e) => return Err(RepoError::Duplicate(e.key().clone())),
            Entry::Vacant(v) => {
                v.insert(user.id);
            }
        }
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.users.get(&id).map(|r| r.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let Some(id) = self.emails.get(&normalize_email(email)).map(|r| *r) else {
            return Ok(None);
        };
        self.get_user(id).await
    }
}
