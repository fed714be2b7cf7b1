use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::domain::order::{Order, OrderStatus, OrderTransition};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.user_id.map_or(true, |u| order.user_id == u)
            && self.status.map_or(true, |s| order.status == s)
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    async fn create_order(&self, order: Order) -> Result<Order, RepoError>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, RepoError>;
    async fn get_order_by_code(&self, code: &str) -> Result<Option<Order>, RepoError>;
    /// Newest first.
    async fn list_orders(
        &self,
        filter: OrderFilter,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Order>, RepoError>;
    async fn count_orders(&self, filter: OrderFilter) -> Result<u64, RepoError>;
    /// Applies `transition` atomically. `Ok(None)` when the order does not
    /// exist, `Err(RepoError::Rejected(_))` when the current state forbids it.
    async fn transition_order(
        &self,
        id: Uuid,
        transition: OrderTransition,
    ) -> Result<Option<Order>, RepoError>;
}
