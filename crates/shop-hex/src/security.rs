//! Credential hashing and bearer-token sessions.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use shop_types::domain::user::Principal;
use shop_types::ports::auth::{PasswordHasher, TokenIssuer};
use std::sync::Arc;
use tokio::task::JoinHandle;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;

/// Stores `hex(salt)$hex(sha256(salt || password))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256;

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl PasswordHasher for SaltedSha256 {
    fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        format!("{}${}", hex::encode(salt), digest(&salt, password))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        let Some((salt_hex, expected)) = stored.split_once('$') else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        let actual = digest(&salt, password);
        // length is fixed, compare without early exit
        actual.len() == expected.len()
            && actual
                .bytes()
                .zip(expected.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }
}

#[derive(Debug, Clone, Copy)]
struct Session {
    principal: Principal,
    expires_at: DateTime<Utc>,
}

/// Opaque random tokens mapped to sessions held in process memory.
#[derive(Debug)]
pub struct SessionTokens {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
        }
    }

    pub fn active(&self) -> usize {
        self.sessions.len()
    }

    /// Drops every expired session, used or not.
    pub fn prune(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        let tokens = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.tick().await;
            loop {
                tick.tick().await;
                let dropped = tokens.prune();
                if dropped > 0 {
                    tracing::debug!(dropped, active = tokens.active(), "expired sessions pruned");
                }
            }
        })
    }
}

impl TokenIssuer for SessionTokens {
    fn issue(&self, principal: Principal) -> String {
        let mut raw = [0u8; TOKEN_LEN];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        self.sessions.insert(
            token.clone(),
            Session {
                principal,
                expires_at: Utc::now() + self.ttl,
            },
        );
        token
    }

    fn resolve(&self, token: &str) -> Option<Principal> {
        let now = Utc::now();
        if self.sessions.remove_if(token, |_, s| s.expires_at <= now).is_some() {
            return None;
        }
        self.sessions.get(token).map(|s| s.principal)
    }
}
