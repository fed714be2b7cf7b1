//! shop-types: domain model and ports shared by the storefront crates.

pub mod domain;
pub mod ports;
