//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CartRepository, CatalogSource, InMemoryCartRepository, InMemoryProductRepository,
    InMemoryUserRepository, LoginService, NoCatalogSource, ProductRepository,
    RepositoryLoginService, UserRepository,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub catalog: Arc<dyn CatalogSource>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(
        login: Arc<dyn LoginService>,
        users: Arc<dyn UserRepository>,
        products: Arc<dyn ProductRepository>,
        carts: Arc<dyn CartRepository>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        Self {
            login,
            users,
            products,
            carts,
            catalog,
        }
    }

    /// In-memory state for tests and pool-less deployments.
    ///
    /// # Examples
    /// ```
    /// use storefront_backend::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::in_memory();
    /// let _products = state.products.clone();
    /// ```
    pub fn in_memory() -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        Self {
            login: Arc::new(RepositoryLoginService::new(users.clone())),
            users,
            products: Arc::new(InMemoryProductRepository::new()),
            carts: Arc::new(InMemoryCartRepository::new()),
            catalog: Arc::new(NoCatalogSource),
        }
    }

    /// Swap the catalog fallback source (builder style).
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = catalog;
        self
    }
}
