#[cfg(not(any(feature = "memory", feature = "sqlite")))]
compile_error!("Enable a repo feature: `memory` or `sqlite`.");

use async_trait::async_trait;
use shop_types::domain::order::{Order, OrderTransition};
use shop_types::domain::product::Product;
use shop_types::domain::user::User;
use shop_types::ports::order_repository::{OrderFilter, OrderRepository};
use shop_types::ports::product_repository::{ProductRepository, StockChange};
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use uuid::Uuid;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Store adapter chosen at startup from the database URL.
#[derive(Clone)]
pub enum Repo {
    #[cfg(feature = "memory")]
    Memory(memory::InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteRepo),
}

pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Repo> {
    Repo::build_repo(url).await
}

impl Repo {
    #[cfg(all(feature = "memory", not(feature = "sqlite")))]
    pub async fn build_repo(url: Option<&str>) -> anyhow::Result<Self> {
        if let Some(url) = url {
            anyhow::bail!("database url {url} given but the `sqlite` feature is disabled");
        }
        Ok(Self::Memory(memory::InMemoryRepo::new()))
    }

    #[cfg(all(feature = "sqlite", not(feature = "memory")))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        let url = database_url.unwrap_or("sqlite://shop.db");
        Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?))
    }

    // If both features are enabled a URL selects SQLite, otherwise memory.
    #[cfg(all(feature = "sqlite", feature = "memory"))]
    pub async fn build_repo(database_url: Option<&str>) -> anyhow::Result<Self> {
        match database_url {
            Some(url) => Ok(Self::Sqlite(sqlite::SqliteRepo::new(url).await?)),
            None => Ok(Self::Memory(memory::InMemoryRepo::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            #[cfg(feature = "memory")]
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "memory")]
            Repo::Memory($repo) => $call,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
        }
    };
}

#[async_trait]
impl ProductRepository for Repo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        dispatch!(self, r => r.create_product(product).await)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.get_product(id).await)
    }

    async fn list_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, RepoError> {
        dispatch!(self, r => r.list_products(offset, limit).await)
    }

    async fn count_products(&self) -> Result<u64, RepoError> {
        dispatch!(self, r => r.count_products().await)
    }

    async fn set_stock(&self, id: Uuid, stock: u32) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.set_stock(id, stock).await)
    }

    async fn decrement_stock(&self, id: Uuid, qty: u32) -> Result<StockChange, RepoError> {
        dispatch!(self, r => r.decrement_stock(id, qty).await)
    }

    async fn increment_stock(&self, id: Uuid, qty: u32) -> Result<Option<Product>, RepoError> {
        dispatch!(self, r => r.increment_stock(id, qty).await)
    }
}

#[async_trait]
impl OrderRepository for Repo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        dispatch!(self, r => r.create_order(order).await)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order(id).await)
    }

    async fn get_order_by_code(&self, code: &str) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.get_order_by_code(code).await)
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepoError> {
        dispatch!(self, r => r.list_orders(filter, offset, limit).await)
    }

    async fn count_orders(&self, filter: OrderFilter) -> Result<u64, RepoError> {
        dispatch!(self, r => r.count_orders(filter).await)
    }

    async fn transition_order(
        &self,
        id: Uuid,
        transition: OrderTransition,
    ) -> Result<Option<Order>, RepoError> {
        dispatch!(self, r => r.transition_order(id, transition).await)
    }
}

#[async_trait]
impl UserRepository for Repo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        dispatch!(self, r => r.create_user(user).await)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.get_user(id).await)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        dispatch!(self, r => r.find_user_by_email(email).await)
    }
}
