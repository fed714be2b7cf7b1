pub mod order;
pub mod pagination;
pub mod product;
pub mod user;
pub mod validation;
