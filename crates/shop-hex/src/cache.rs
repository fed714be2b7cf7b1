//! Process-wide response cache.
//!
//! Entries are JSON snapshots of service responses with a per-entry TTL.
//! Invalidation is by substring: `clear(Some("ord_"))` drops every key that
//! *contains* `ord_`, not only keys starting with it. Each process owns its
//! cache, so several instances may serve data up to one TTL stale.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub const PRODUCT_TTL: Duration = Duration::from_secs(300);
pub const ORDER_TTL: Duration = Duration::from_secs(60);

/// Key fragments. A mutation clears all of them.
pub mod keys {
    pub const PRODUCT: &str = "prod_";
    pub const PRODUCTS: &str = "products_";
    pub const ORDER: &str = "ord_";
    pub const USER_ORDERS: &str = "user_orders";
    pub const ALL_ORDERS: &str = "all_orders";

    pub const MUTATION_SCOPE: [&str; 5] = [PRODUCT, PRODUCTS, ORDER, USER_ORDERS, ALL_ORDERS];
}

#[derive(Debug, Clone)]
struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, Entry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        if self.entries.remove_if(key, |_, e| e.expires_at <= now).is_some() {
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// `Some(pattern)` removes every key containing `pattern`; `None` flushes.
    pub fn clear(&self, pattern: Option<&str>) {
        match pattern {
            Some(p) => self.entries.retain(|k, _| !k.contains(p)),
            None => self.entries.clear(),
        }
    }

    pub fn invalidate_after_mutation(&self) {
        for pattern in keys::MUTATION_SCOPE {
            self.clear(Some(pattern));
        }
        tracing::debug!(remaining = self.entries.len(), "cache invalidated");
    }

    /// Typed read. A value that no longer decodes counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => {
                tracing::debug!(key, "cache hit");
                Some(v)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "dropping undecodable cache entry");
                self.entries.remove(key);
                None
            }
        }
    }

    pub fn put<T: Serialize>(&self, key: impl Into<String>, value: &T, ttl: Duration) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(v) => self.set(key, v, ttl),
            Err(e) => tracing::warn!(key = %key, error = %e, "skipping cache write"),
        }
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.tick().await;
            loop {
                tick.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "expired cache entries removed");
                }
            }
        })
    }
}

pub fn product_key(id: &str) -> String {
    format!("{}{id}", keys::PRODUCT)
}

pub fn products_key(page: u32, limit: u32) -> String {
    format!("{}p{page}_l{limit}", keys::PRODUCTS)
}

pub fn order_key(code: &str, user_id: &uuid::Uuid) -> String {
    format!("{}{code}_{user_id}", keys::ORDER)
}

pub fn user_orders_key(user_id: &uuid::Uuid, page: u32, limit: u32, status: Option<&str>) -> String {
    format!(
        "{}_{user_id}_p{page}_l{limit}_{}",
        keys::USER_ORDERS,
        status.unwrap_or("all")
    )
}

pub fn all_orders_key(page: u32, limit: u32, status: Option<&str>) -> String {
    format!(
        "{}_p{page}_l{limit}_{}",
        keys::ALL_ORDERS,
        status.unwrap_or("all")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_set_and_expiry() {
        let cache = ResponseCache::new();
        cache.set("products_p1_l10", json!({"a": 1}), Duration::from_secs(60));
        assert_eq!(cache.get("products_p1_l10"), Some(json!({"a": 1})));

        cache.set("short", json!(1), Duration::ZERO);
        assert_eq!(cache.get("short"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_uses_substring_match() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        cache.set("prod_1", json!(1), ttl);
        cache.set("x_prod_2", json!(2), ttl);
        cache.set("products_p1_l10", json!(3), ttl);

        cache.clear(Some("prod_"));
        assert!(cache.get("prod_1").is_none());
        assert!(cache.get("x_prod_2").is_none());
        assert!(cache.get("products_p1_l10").is_some());

        cache.clear(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn mutation_scope_spares_nothing_order_or_product_related() {
        let cache = ResponseCache::new();
        let ttl = Duration::from_secs(60);
        let user = uuid::Uuid::new_v4();
        for key in [
            product_key("abc"),
            products_key(1, 10),
            order_key("ORD-1", &user),
            user_orders_key(&user, 1, 10, None),
            all_orders_key(1, 10, Some("CREATED")),
        ] {
            cache.set(key, json!(true), ttl);
        }
        cache.set("unrelated", json!(true), ttl);
        cache.invalidate_after_mutation();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("unrelated").is_some());
    }

    #[test]
    fn personalised_keys_differ_per_user() {
        let a = uuid::Uuid::new_v4();
        let b = uuid::Uuid::new_v4();
        assert_ne!(user_orders_key(&a, 1, 10, None), user_orders_key(&b, 1, 10, None));
        assert_ne!(order_key("ORD-1", &a), order_key("ORD-1", &b));
    }

    #[test]
    fn undecodable_entries_are_misses() {
        let cache = ResponseCache::new();
        cache.set("k", json!("text"), Duration::from_secs(60));
        assert_eq!(cache.get_as::<u32>("k"), None);
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn purge_drops_only_expired() {
        let cache = ResponseCache::new();
        cache.set("gone", json!(1), Duration::ZERO);
        cache.set("kept", json!(2), Duration::from_secs(60));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }
}
