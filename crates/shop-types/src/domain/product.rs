use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{require_text, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin payload for a new catalogue entry. Numbers stay signed so that a
/// negative value is reported as a validation detail instead of a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StockUpdate {
    pub stock: Option<i64>,
}

impl StockUpdate {
    pub fn validate(&self) -> Result<u32, ValidationError> {
        let mut details = Vec::new();
        let stock = parse_stock(&mut details, self.stock);
        ValidationError::check(details)?;
        Ok(stock)
    }
}

fn parse_stock(details: &mut Vec<String>, stock: Option<i64>) -> u32 {
    match stock {
        None => {
            details.push("stock is required".into());
            0
        }
        Some(v) => match u32::try_from(v) {
            Ok(s) => s,
            Err(_) => {
                details.push("stock must be an integer between 0 and 4294967295".into());
                0
            }
        },
    }
}

/// Upper bound on a unit price: 10 billion in major units.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

impl Product {
    pub fn new(input: NewProduct) -> Result<Self, ValidationError> {
        let mut details = Vec::new();
        require_text(&mut details, "name", &input.name);
        require_text(&mut details, "description", &input.description);
        require_text(&mut details, "category", &input.category);
        let price_cents = match input.price_cents {
            None => {
                details.push("priceCents is required".into());
                0
            }
            Some(p) if p < 0 => {
                details.push("priceCents must be greater than or equal to 0".into());
                0
            }
            Some(p) if p > MAX_PRICE_CENTS => {
                details.push(format!("priceCents must be less than or equal to {MAX_PRICE_CENTS}"));
                0
            }
            Some(p) => p,
        };
        let stock = parse_stock(&mut details, input.stock);
        ValidationError::check(details)?;

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description.trim().to_string(),
            price_cents,
            stock,
            category: input.category.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn set_stock(&mut self, stock: u32) {
        self.stock = stock;
        self.updated_at = Utc::now();
    }
}
