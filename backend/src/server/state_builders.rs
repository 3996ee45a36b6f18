//! Assembly of the HTTP port bundle from configuration.

use std::sync::Arc;

use storefront_backend::domain::ports::{
    CartRepository, CatalogSource, NoCatalogSource, ProductRepository, RepositoryLoginService,
    UserRepository,
};
use storefront_backend::inbound::http::state::HttpState;
use storefront_backend::outbound::catalog::HttpCatalogSource;
use storefront_backend::outbound::persistence::{
    DieselCartRepository, DieselProductRepository, DieselUserRepository,
};

use super::ServerConfig;

/// Choose port implementations: Diesel-backed when a pool is configured,
/// in-memory otherwise.
pub(crate) fn build_http_state(config: &ServerConfig) -> std::io::Result<HttpState> {
    let catalog: Arc<dyn CatalogSource> = match &config.catalog_base_url {
        Some(base_url) => Arc::new(HttpCatalogSource::new(base_url.clone()).map_err(|err| {
            std::io::Error::other(format!("failed to build catalog client: {err}"))
        })?),
        None => Arc::new(NoCatalogSource),
    };

    let state = match &config.db_pool {
        Some(pool) => {
            let users: Arc<dyn UserRepository> =
                Arc::new(DieselUserRepository::new(pool.clone()));
            let products: Arc<dyn ProductRepository> =
                Arc::new(DieselProductRepository::new(pool.clone()));
            let carts: Arc<dyn CartRepository> = Arc::new(DieselCartRepository::new(pool.clone()));
            HttpState::new(
                Arc::new(RepositoryLoginService::new(users.clone())),
                users,
                products,
                carts,
                catalog,
            )
        }
        None => HttpState::in_memory().with_catalog(catalog),
    };

    Ok(state)
}
