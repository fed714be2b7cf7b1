//! Axum adapter: routing, extractors, rate limiting and handlers.

mod auth;
mod inventory;
mod orders;
mod rate_limit;
mod server;

pub use auth::Authenticated;
pub use rate_limit::{RateDecision, RateLimiter};
pub use server::{AppState, HttpServer, HttpServerConfig};
