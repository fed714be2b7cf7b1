pub mod auth;
pub mod order_repository;
pub mod payment;
pub mod product_repository;
pub mod user_repository;

use crate::domain::order::TransitionError;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("db error: {0}")]
    DbError(String),
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
}

/// Everything the services need from persistence, implemented by one adapter.
pub trait Store:
    product_repository::ProductRepository
    + order_repository::OrderRepository
    + user_repository::UserRepository
{
}

impl<T> Store for T where
    T: product_repository::ProductRepository
        + order_repository::OrderRepository
        + user_repository::UserRepository
{
}
