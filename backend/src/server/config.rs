//! HTTP server configuration object and helpers.

use actix_web::cookie::{Key, SameSite};
use url::Url;
use std::net::SocketAddr;
use storefront_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) catalog_base_url: Option<Url>,
}

impl ServerConfig {
    /// Construct a server configuration from session and binding settings.
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            db_pool: None,
            catalog_base_url: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server uses the Diesel-backed repositories; without
    /// it every port runs in-memory with the process lifecycle.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Attach the base URL of the remote catalog used as the product-detail
    /// fallback.
    #[must_use]
    pub fn with_catalog_base_url(mut self, base_url: Url) -> Self {
        self.catalog_base_url = Some(base_url);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
