use async_trait::async_trait;

use crate::domain::order::{Order, PaymentOutcome};

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn charge(&self, order: &Order) -> PaymentOutcome;
}
