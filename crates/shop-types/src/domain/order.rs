use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::user::Principal;
use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Confirmed,
    Cancelled,
    Shipped,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Confirmed,
        OrderStatus::Cancelled,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    /// Case-insensitive; `"confirmed"` and `"CONFIRMED"` are the same status.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == upper)
            .ok_or_else(|| {
                ValidationError::single(format!(
                    "status must be one of [CREATED, CONFIRMED, CANCELLED, SHIPPED, DELIVERED], got {s:?}"
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "SUCCESS" => Some(PaymentStatus::Success),
            "FAILED" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// What the payment collaborator answered for one charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved,
    Declined,
}

/// One line of an order. `price_cents` is the unit price captured when the
/// order was placed and never follows later catalogue changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub quantity: u32,
    pub price_cents: i64,
}

impl OrderItem {
    /// `None` when the line total does not fit in an `i64`.
    pub fn line_total(&self) -> Option<i64> {
        i64::from(self.quantity).checked_mul(self.price_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_code: String,
    pub user_id: Uuid,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A guarded state change. The store applies it atomically and only when
/// [`Order::apply`] accepts it for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Settle(PaymentOutcome),
    Cancel,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Payment failed and cannot be cancelled.")]
    PaymentFailed,
    #[error("Order already cancelled")]
    AlreadyCancelled,
    #[error("Cannot cancel delivered order")]
    Delivered,
    #[error("Order is not awaiting payment")]
    NotAwaitingPayment,
}

impl Order {
    pub fn new(order_code: String, user_id: Uuid, items: Vec<OrderItem>) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::single("items must contain at least 1 item"));
        }
        if items.iter().any(|it| it.quantity == 0) {
            return Err(ValidationError::single("quantity must be greater than or equal to 1"));
        }
        let total = items
            .iter()
            .try_fold(0i64, |acc, it| acc.checked_add(it.line_total()?))
            .ok_or_else(|| ValidationError::single("total amount overflows"))?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            order_code,
            user_id,
            items,
            total_cents: total,
            status: OrderStatus::Created,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn visible_to(&self, principal: &Principal) -> bool {
        principal.is_admin() || principal.user_id == self.user_id
    }

    /// Checks whether `transition` is allowed from the current state.
    pub fn check(&self, transition: OrderTransition) -> Result<(), TransitionError> {
        match transition {
            OrderTransition::Settle(_) => {
                if self.status != OrderStatus::Created || self.payment_status != PaymentStatus::Pending {
                    return Err(TransitionError::NotAwaitingPayment);
                }
            }
            OrderTransition::Cancel => {
                if self.payment_status == PaymentStatus::Failed {
                    return Err(TransitionError::PaymentFailed);
                }
                match self.status {
                    OrderStatus::Cancelled => return Err(TransitionError::AlreadyCancelled),
                    OrderStatus::Delivered => return Err(TransitionError::Delivered),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    pub fn apply(&mut self, transition: OrderTransition) -> Result<(), TransitionError> {
        self.check(transition)?;
        match transition {
            OrderTransition::Settle(PaymentOutcome::Approved) => {
                self.payment_status = PaymentStatus::Success;
                self.status = OrderStatus::Confirmed;
            }
            OrderTransition::Settle(PaymentOutcome::Declined) => {
                self.payment_status = PaymentStatus::Failed;
            }
            OrderTransition::Cancel => {
                self.status = OrderStatus::Cancelled;
            }
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewOrder {
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderLineRequest {
    pub product: String,
    pub quantity: Option<i64>,
}

/// A requested line after shape validation; the product reference is still raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedLine {
    pub product: String,
    pub quantity: u32,
}

impl NewOrder {
    pub fn validate(&self) -> Result<Vec<RequestedLine>, ValidationError> {
        let mut details = Vec::new();
        if self.items.is_empty() {
            details.push("items must contain at least 1 item".to_string());
        }
        let mut lines = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.iter().enumerate() {
            if item.product.trim().is_empty() {
                details.push(format!("items[{idx}].product is required"));
            }
            match item.quantity {
                None => details.push(format!("items[{idx}].quantity is required")),
                Some(q) => match u32::try_from(q) {
                    Ok(q) if q >= 1 => lines.push(RequestedLine {
                        product: item.product.trim().to_string(),
                        quantity: q,
                    }),
                    _ => details.push(format!(
                        "items[{idx}].quantity must be greater than or equal to 1"
                    )),
                },
            }
        }
        ValidationError::check(details)?;
        Ok(lines)
    }
}
