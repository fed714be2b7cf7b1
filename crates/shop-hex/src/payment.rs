//! Payment collaborators. Nothing here talks to a real processor.

use async_trait::async_trait;
use rand::Rng;
use shop_types::domain::order::{Order, PaymentOutcome};
use shop_types::ports::payment::PaymentGateway;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Approves a charge with probability `success_rate`, after an optional
/// artificial latency.
#[derive(Debug, Clone)]
pub struct SimulatedPayment {
    success_rate: f64,
    latency: Duration,
}

impl SimulatedPayment {
    pub fn new(success_rate: f64) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl PaymentGateway for SimulatedPayment {
    async fn charge(&self, order: &Order) -> PaymentOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let approved = rand::thread_rng().gen_bool(self.success_rate);
        tracing::info!(
            order_id = %order.order_code,
            amount_cents = order.total_cents,
            approved,
            "simulated payment"
        );
        if approved {
            PaymentOutcome::Approved
        } else {
            PaymentOutcome::Declined
        }
    }
}

/// Deterministic gateway whose answer can be switched at runtime.
#[derive(Debug, Default)]
pub struct FixedPayment {
    decline: AtomicBool,
}

impl FixedPayment {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self {
            decline: AtomicBool::new(true),
        }
    }

    pub fn set_decline(&self, decline: bool) {
        self.decline.store(decline, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for FixedPayment {
    async fn charge(&self, _order: &Order) -> PaymentOutcome {
        if self.decline.load(Ordering::SeqCst) {
            PaymentOutcome::Declined
        } else {
            PaymentOutcome::Approved
        }
    }
}
