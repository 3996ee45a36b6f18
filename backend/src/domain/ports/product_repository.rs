//! Driven port for product catalog persistence.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::product::{Price, Product, ProductId, ProductName};

/// Errors raised by product persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductPersistenceError {
    /// Repository connection could not be established.
    #[error("product store connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution or row conversion.
    #[error("product store query failed: {message}")]
    Query { message: String },
}

impl ProductPersistenceError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Partial update applied to an existing product.
///
/// Absent fields keep their stored values; `modified_at` is refreshed on
/// every successful update.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<ProductName>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
}

/// Port for storing and querying catalog products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// List every product ordered by id.
    async fn list(&self) -> Result<Vec<Product>, ProductPersistenceError>;

    /// Store a new product.
    async fn create(&self, product: Product) -> Result<Product, ProductPersistenceError>;

    /// Fetch one product by id.
    async fn find_by_id(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, ProductPersistenceError>;

    /// Apply a partial update; `None` when the product does not exist.
    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, ProductPersistenceError>;

    /// Delete a product; `false` when nothing was stored under the id.
    async fn delete(&self, id: &ProductId) -> Result<bool, ProductPersistenceError>;
}

/// Process-lifetime product store used by tests and pool-less deployments.
#[derive(Default)]
pub struct InMemoryProductRepository {
    state: Mutex<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap_or_else(|e| e.into_inner());
            for product in products {
                state.insert(product.id, product);
            }
        }
        store
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self) -> Result<Vec<Product>, ProductPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.values().cloned().collect())
    }

    async fn create(&self, product: Product) -> Result<Product, ProductPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.get(id).cloned())
    }

    async fn update(
        &self,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Option<Product>, ProductPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let Some(stored) = state.get(id) else {
            return Ok(None);
        };
        let updated = Product {
            id: stored.id,
            name: patch.name.unwrap_or_else(|| stored.name.clone()),
            description: patch
                .description
                .unwrap_or_else(|| stored.description.clone()),
            price: patch.price.unwrap_or(stored.price),
            category: patch.category.unwrap_or_else(|| stored.category.clone()),
            image_url: patch.image_url.unwrap_or_else(|| stored.image_url.clone()),
            is_available: patch.is_available.unwrap_or(stored.is_available),
            created_at: stored.created_at,
            modified_at: Utc::now(),
        };
        state.insert(*id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: &ProductId) -> Result<bool, ProductPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.remove(id).is_some())
    }
}
