//! shop-hex: shop backend core (services, cache, collaborators) and the
//! inbound HTTP adapter.

pub mod cache;
pub mod config;
pub mod errors;
pub mod payment;
pub mod security;

pub mod application;

pub use shop_types::{domain, ports};

pub mod inbound; // HTTP adapter (router, extractors, handlers)
