//! PostgreSQL persistence adapters for the repository ports.

pub mod diesel_cart_repository;
pub mod diesel_product_repository;
pub mod diesel_user_repository;
pub mod models;
pub mod pool;
pub mod schema;

pub use diesel_cart_repository::DieselCartRepository;
pub use diesel_product_repository::DieselProductRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
