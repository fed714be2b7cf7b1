use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use shop_types::domain::order::{Order, OrderItem, OrderStatus, OrderTransition, PaymentStatus};
use shop_types::domain::product::Product;
use shop_types::domain::user::{normalize_email, Role, User};
use shop_types::ports::order_repository::{OrderFilter, OrderRepository};
use shop_types::ports::product_repository::{ProductRepository, StockChange};
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions};
use sqlx::{Arguments, FromRow, SqlitePool};
use std::str::FromStr;
use uuid::Uuid;

const MIGRATIONS: [&str; 4] = [
    include_str!("../migrations/0001_create_products.sql"),
    include_str!("../migrations/0002_create_users.sql"),
    include_str!("../migrations/0003_create_orders.sql"),
    include_str!("../migrations/0004_index_orders_user.sql"),
];

/// Compare-and-set retries before a transition gives up under contention.
const MAX_TRANSITION_ATTEMPTS: usize = 8;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock, category, created_at, updated_at";
const ORDER_COLUMNS: &str =
    "id, order_code, user_id, items_json, total_cents, status, payment_status, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

#[derive(Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::DbError(e.to_string())
}

fn ts(t: &DateTime<Utc>) -> String {
    // Fixed width so that TEXT ordering matches time ordering.
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

#[derive(FromRow)]
struct DbProduct {
    id: String,
    name: String,
    description: String,
    price_cents: i64,
    stock: i64,
    category: String,
    created_at: String,
    updated_at: String,
}

impl DbProduct {
    fn into_product(self) -> Result<Product, RepoError> {
        Ok(Product {
            id: parse_id(&self.id)?,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            stock: u32::try_from(self.stock).map_err(db_err)?,
            category: self.category,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbOrder {
    id: String,
    order_code: String,
    user_id: String,
    items_json: String,
    total_cents: i64,
    status: String,
    payment_status: String,
    created_at: String,
    updated_at: String,
}

impl DbOrder {
    fn into_order(self) -> Result<Order, RepoError> {
        let status = OrderStatus::from_str(&self.status).map_err(db_err)?;
        let payment_status = PaymentStatus::parse(&self.payment_status)
            .ok_or_else(|| db_err(format!("unknown payment status {}", self.payment_status)))?;
        let items: Vec<OrderItem> = serde_json::from_str(&self.items_json).map_err(db_err)?;
        Ok(Order {
            id: parse_id(&self.id)?,
            order_code: self.order_code,
            user_id: parse_id(&self.user_id)?,
            items,
            total_cents: self.total_cents,
            status,
            payment_status,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct DbUser {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl DbUser {
    fn into_user(self) -> Result<User, RepoError> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| db_err(format!("unknown role {}", self.role)))?;
        Ok(User {
            id: parse_id(&self.id)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn order_where(filter: &OrderFilter) -> (String, SqliteArguments<'static>) {
    let mut clauses = Vec::new();
    let mut args = SqliteArguments::default();
    if let Some(user_id) = filter.user_id {
        clauses.push("user_id = ?");
        args.add(user_id.to_string());
    }
    if let Some(status) = filter.status {
        clauses.push("status = ?");
        args.add(status.as_str().to_string());
    }
    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (sql, args)
}

impl SqliteRepo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        for ddl in MIGRATIONS {
            sqlx::query(ddl).execute(&pool).await?;
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl ProductRepository for SqliteRepo {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        sqlx::query(
            "INSERT INTO products (id, name, description, price_cents, stock, category, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(product.id.to_string())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(i64::from(product.stock))
        .bind(&product.category)
        .bind(ts(&product.created_at))
        .bind(ts(&product.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError> {
        let row: Option<DbProduct> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbProduct::into_product).transpose()
    }

    async fn list_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, RepoError> {
        let rows: Vec<DbProduct> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter().map(DbProduct::into_product).collect()
    }

    async fn count_products(&self) -> Result<u64, RepoError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        u64::try_from(n).map_err(db_err)
    }

    async fn set_stock(&self, id: Uuid, stock: u32) -> Result<Option<Product>, RepoError> {
        let updated = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(i64::from(stock))
            .bind(ts(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_product(id).await
    }

    async fn decrement_stock(&self, id: Uuid, qty: u32) -> Result<StockChange, RepoError> {
        let updated = sqlx::query(
            "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
        )
        .bind(i64::from(qty))
        .bind(ts(&Utc::now()))
        .bind(id.to_string())
        .bind(i64::from(qty))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let current = self.get_product(id).await?;
        Ok(match current {
            None => StockChange::Missing,
            Some(p) if updated.rows_affected() == 1 => StockChange::Applied(p),
            Some(p) => StockChange::Insufficient {
                name: p.name,
                available: p.stock,
            },
        })
    }

    async fn increment_stock(&self, id: Uuid, qty: u32) -> Result<Option<Product>, RepoError> {
        let updated = sqlx::query(
            "UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ? AND stock + ? <= ?",
        )
        .bind(i64::from(qty))
        .bind(ts(&Utc::now()))
        .bind(id.to_string())
        .bind(i64::from(qty))
        .bind(i64::from(u32::MAX))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if updated.rows_affected() == 0 {
            return match self.get_product(id).await? {
                None => Ok(None),
                Some(_) => Err(RepoError::DbError(format!("stock overflow for product {id}"))),
            };
        }
        self.get_product(id).await
    }
}

#[async_trait]
impl OrderRepository for SqliteRepo {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError> {
        let items_json = serde_json::to_string(&order.items).map_err(db_err)?;
        sqlx::query(
            "INSERT INTO orders (id, order_code, user_id, items_json, total_cents, status, payment_status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(order.id.to_string())
        .bind(&order.order_code)
        .bind(order.user_id.to_string())
        .bind(items_json)
        .bind(order.total_cents)
        .bind(order.status.as_str())
        .bind(order.payment_status.as_str())
        .bind(ts(&order.created_at))
        .bind(ts(&order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::Duplicate(order.order_code.clone())
            } else {
                db_err(e)
            }
        })?;
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn get_order_by_code(&self, code: &str) -> Result<Option<Order>, RepoError> {
        let row: Option<DbOrder> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_code = ?"))
                .bind(code)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbOrder::into_order).transpose()
    }

    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepoError> {
        let (clause, mut args) = order_where(&filter);
        args.add(i64::from(limit));
        args.add(i64::try_from(offset).unwrap_or(i64::MAX));
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders{clause} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let rows: Vec<DbOrder> = sqlx::query_as_with(&sql, args)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(DbOrder::into_order).collect()
    }

    async fn count_orders(&self, filter: OrderFilter) -> Result<u64, RepoError> {
        let (clause, args) = order_where(&filter);
        let sql = format!("SELECT COUNT(*) FROM orders{clause}");
        let (n,): (i64,) = sqlx::query_as_with(&sql, args)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        u64::try_from(n).map_err(db_err)
    }

    async fn transition_order(
        &self,
        id: Uuid,
        transition: OrderTransition,
    ) -> Result<Option<Order>, RepoError> {
        // The domain decides whether the transition is legal; the UPDATE only
        // lands if nobody changed the status pair since we read it.
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let Some(current) = self.get_order(id).await? else {
                return Ok(None);
            };
            let mut next = current.clone();
            next.apply(transition)?;

            let updated = sqlx::query(
                "UPDATE orders SET status = ?, payment_status = ?, updated_at = ?
                 WHERE id = ? AND status = ? AND payment_status = ?",
            )
            .bind(next.status.as_str())
            .bind(next.payment_status.as_str())
            .bind(ts(&next.updated_at))
            .bind(id.to_string())
            .bind(current.status.as_str())
            .bind(current.payment_status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

            if updated.rows_affected() == 1 {
                return Ok(Some(next));
            }
        }
        Err(RepoError::DbError(format!(
            "order {id} kept changing during {transition:?}"
        )))
    }
}

#[async_trait]
impl UserRepository for SqliteRepo {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let email = normalize_email(&user.email);
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(ts(&user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RepoError::Duplicate(email.clone())
            } else {
                db_err(e)
            }
        })?;
        Ok(User { email, ..user })
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbUser::into_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let row: Option<DbUser> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;
        row.map(DbUser::into_user).transpose()
    }
}
