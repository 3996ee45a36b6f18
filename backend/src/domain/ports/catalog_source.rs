//! Driven port for the remote product catalog.
//!
//! Product detail reads consult this source when the local store has no
//! record, before reporting not-found.

use async_trait::async_trait;

use crate::domain::product::{Price, ProductId, ProductName};

/// Errors raised by remote catalog adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogSourceError {
    /// The remote endpoint could not be reached.
    #[error("catalog transport failed: {message}")]
    Transport { message: String },
    /// The remote endpoint answered with an unexpected status.
    #[error("catalog returned status {status}")]
    Status { status: u16 },
    /// The response body could not be decoded.
    #[error("catalog payload could not be decoded: {message}")]
    Decode { message: String },
}

impl CatalogSourceError {
    /// Create a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a status error for the given HTTP status.
    pub fn status(status: u16) -> Self {
        Self::Status { status }
    }

    /// Create a decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Product payload served by a remote catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogProduct {
    pub name: ProductName,
    pub description: String,
    pub price: Price,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

/// Port for fetching products from a remote catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one product by id; `None` when the remote catalog has no match.
    async fn fetch_product(
        &self,
        id: &ProductId,
    ) -> Result<Option<CatalogProduct>, CatalogSourceError>;
}

/// Fixture source for deployments without a catalog fallback configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCatalogSource;

#[async_trait]
impl CatalogSource for NoCatalogSource {
    async fn fetch_product(
        &self,
        _id: &ProductId,
    ) -> Result<Option<CatalogProduct>, CatalogSourceError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn no_catalog_source_always_misses() {
        let source = NoCatalogSource;
        let result = source
            .fetch_product(&ProductId::random())
            .await
            .expect("fetch");
        assert!(result.is_none());
    }

    #[test]
    fn error_display_includes_context() {
        assert_eq!(
            CatalogSourceError::status(502).to_string(),
            "catalog returned status 502"
        );
        assert!(
            CatalogSourceError::transport("timed out")
                .to_string()
                .contains("timed out")
        );
    }
}
