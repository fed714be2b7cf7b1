use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::product::Product;

/// Result of a conditional stock decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockChange {
    Applied(Product),
    Insufficient { name: String, available: u32 },
    Missing,
}

#[async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, RepoError>;
    /// Newest first.
    async fn list_products(&self, offset: u64, limit: u32) -> Result<Vec<Product>, RepoError>;
    async fn count_products(&self) -> Result<u64, RepoError>;
    async fn set_stock(&self, id: Uuid, stock: u32) -> Result<Option<Product>, RepoError>;
    /// Atomically subtracts `qty` only when at least `qty` units are in stock.
    async fn decrement_stock(&self, id: Uuid, qty: u32) -> Result<StockChange, RepoError>;
    async fn increment_stock(&self, id: Uuid, qty: u32) -> Result<Option<Product>, RepoError>;
}
