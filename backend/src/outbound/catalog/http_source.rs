//! Reqwest-backed remote catalog adapter.
//!
//! Owns transport details only: URL construction, timeout and HTTP error
//! mapping, and JSON decoding into the domain catalog product.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::RemoteProductDto;
use crate::domain::ports::{CatalogProduct, CatalogSource, CatalogSourceError};
use crate::domain::product::ProductId;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Catalog adapter performing HTTP GET requests against one base URL.
pub struct HttpCatalogSource {
    client: Client,
    base_url: Url,
}

impl HttpCatalogSource {
    /// Build an adapter with the default request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Build an adapter with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn product_url(&self, id: &ProductId) -> Result<Url, CatalogSourceError> {
        self.base_url
            .join(&format!("products/{id}/"))
            .map_err(|err| CatalogSourceError::transport(format!("invalid catalog URL: {err}")))
    }
}

fn map_transport_error(error: reqwest::Error) -> CatalogSourceError {
    CatalogSourceError::transport(error.to_string())
}

fn parse_product(body: &[u8]) -> Result<CatalogProduct, CatalogSourceError> {
    let dto: RemoteProductDto = serde_json::from_slice(body).map_err(|error| {
        CatalogSourceError::decode(format!("invalid catalog JSON payload: {error}"))
    })?;
    dto.into_domain().map_err(CatalogSourceError::decode)
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch_product(
        &self,
        id: &ProductId,
    ) -> Result<Option<CatalogProduct>, CatalogSourceError> {
        let url = self.product_url(id)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(CatalogSourceError::status(status.as_u16()));
        }

        parse_product(body.as_ref()).map(Some)
    }
}
