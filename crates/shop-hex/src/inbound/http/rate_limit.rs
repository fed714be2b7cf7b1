use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use shop_types::ports::Store;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use super::auth::bearer_token;
use super::server::AppState;
use crate::errors::AppError;

const LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

/// Fixed-window request counter keyed by caller.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Seconds until the current window closes.
    pub reset_secs: u64,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }
        let allowed = entry.hits < self.limit;
        if allowed {
            entry.hits += 1;
        }
        let left = self.window.saturating_sub(now.duration_since(entry.started));
        RateDecision {
            allowed,
            limit: self.limit,
            remaining: self.limit - entry.hits,
            reset_secs: left.as_secs() + u64::from(left.subsec_nanos() > 0),
        }
    }

    /// Drops windows that have already closed.
    pub fn prune(&self) -> usize {
        let before = self.windows.len();
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before - self.windows.len()
    }
}

impl RateDecision {
    fn write_headers(&self, headers: &mut HeaderMap) {
        headers.insert(LIMIT, HeaderValue::from(self.limit));
        headers.insert(REMAINING, HeaderValue::from(self.remaining));
        headers.insert(RESET, HeaderValue::from(self.reset_secs));
        if !self.allowed {
            headers.insert(RETRY_AFTER, HeaderValue::from(self.reset_secs));
        }
    }
}

fn client_key<S: Store>(state: &AppState<S>, req: &Request) -> String {
    let principal = bearer_token(req.headers()).and_then(|t| state.auth.authenticate(t).ok());
    if let Some(p) = principal {
        return format!("user:{}", p.user_id);
    }
    match req.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "ip:unknown".to_owned(),
    }
}

pub(crate) async fn enforce<S: Store>(State(state): State<AppState<S>>, req: Request, next: Next) -> Response {
    let key = client_key(&state, &req);
    let decision = state.limiter.check(&key);
    if !decision.allowed {
        tracing::warn!(
            %key,
            authenticated = req.headers().contains_key(AUTHORIZATION),
            "rate limit exceeded"
        );
        let mut resp = AppError::TooManyRequests.into_response();
        decision.write_headers(resp.headers_mut());
        return resp;
    }
    let mut resp = next.run(req).await;
    decision.write_headers(resp.headers_mut());
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::per_minute(3);
        for expected in [2, 1, 0] {
            let d = limiter.check("a");
            assert!(d.allowed);
            assert_eq!(d.remaining, expected);
        }
        let blocked = limiter.check("a");
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert!(blocked.reset_secs <= 60 && blocked.reset_secs > 0);

        // other callers have their own window
        assert!(limiter.check("b").allowed);
    }

    #[test]
    fn window_rolls_over() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("a").allowed);
        assert!(!limiter.check("a").allowed);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(limiter.prune(), 1);
        assert!(limiter.check("a").allowed);
    }

    #[test]
    fn retry_after_only_when_blocked() {
        let mut headers = HeaderMap::new();
        let limiter = RateLimiter::per_minute(1);
        limiter.check("a").write_headers(&mut headers);
        assert!(headers.get(RETRY_AFTER).is_none());
        assert_eq!(headers.get(&REMAINING).unwrap(), "0");
        limiter.check("a").write_headers(&mut headers);
        assert!(headers.get(RETRY_AFTER).is_some());
    }
}
