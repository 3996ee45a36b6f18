//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain expects to interact with driven adapters
//! (databases, remote catalogs). Each trait exposes strongly typed errors so
//! adapters map their failures into predictable variants instead of
//! returning a catch-all error type. Every port ships an in-memory or
//! fixture implementation used by tests and pool-less deployments.

pub mod cart_repository;
pub mod catalog_source;
pub mod login_service;
pub mod product_repository;
pub mod user_repository;

pub use cart_repository::{CartPersistenceError, CartRepository, InMemoryCartRepository};
#[cfg(test)]
pub use catalog_source::MockCatalogSource;
pub use catalog_source::{CatalogProduct, CatalogSource, CatalogSourceError, NoCatalogSource};
pub use login_service::{LoginService, LoginServiceError, RepositoryLoginService};
pub use product_repository::{
    InMemoryProductRepository, ProductPatch, ProductPersistenceError, ProductRepository,
};
pub use user_repository::{
    InMemoryUserRepository, NewUser, UserPersistenceError, UserRepository, UserUpdate,
};
