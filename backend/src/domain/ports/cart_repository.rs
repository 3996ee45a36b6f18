//! Driven port for cart snapshot persistence.
//!
//! One cart per user, created lazily on first access. Adapters load and
//! replace whole [`Cart`] snapshots; the mutation semantics themselves live
//! on the value type.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::cart::Cart;
use crate::domain::user::UserId;

/// Errors raised by cart persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartPersistenceError {
    /// Repository connection could not be established.
    #[error("cart store connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution or row conversion.
    #[error("cart store query failed: {message}")]
    Query { message: String },
}

impl CartPersistenceError {
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

/// Port for storing per-user cart snapshots.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Fetch the user's cart, yielding an empty one on first access.
    async fn fetch(&self, user_id: &UserId) -> Result<Cart, CartPersistenceError>;

    /// Replace the stored snapshot with the given cart.
    async fn replace(&self, user_id: &UserId, cart: &Cart) -> Result<(), CartPersistenceError>;

    /// Drop the user's cart entirely.
    async fn clear(&self, user_id: &UserId) -> Result<(), CartPersistenceError>;
}

/// Process-lifetime cart store: the session-revision analogue, keyed by
/// user rather than stuffed into the session cookie.
#[derive(Default)]
pub struct InMemoryCartRepository {
    state: Mutex<HashMap<UserId, Cart>>,
}

impl InMemoryCartRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn fetch(&self, user_id: &UserId) -> Result<Cart, CartPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.get(user_id).cloned().unwrap_or_default())
    }

    async fn replace(&self, user_id: &UserId, cart: &Cart) -> Result<(), CartPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.insert(user_id.clone(), cart.clone());
        Ok(())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CartPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::Quantity;
    use crate::domain::product::{Price, ProductId};
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[rstest]
    #[tokio::test]
    async fn first_fetch_yields_empty_cart() {
        let repo = InMemoryCartRepository::new();
        let cart = repo.fetch(&UserId::random()).await.expect("fetch");
        assert!(cart.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn replace_then_fetch_round_trips() {
        let repo = InMemoryCartRepository::new();
        let user = UserId::random();

        let mut cart = Cart::new();
        cart.add(
            ProductId::random(),
            Price::new(Decimal::new(500, 2)).expect("price"),
            Quantity::new(2).expect("quantity"),
            false,
        );
        repo.replace(&user, &cart).await.expect("replace");

        let fetched = repo.fetch(&user).await.expect("fetch");
        assert_eq!(fetched, cart);
    }

    #[rstest]
    #[tokio::test]
    async fn clear_is_scoped_to_one_user() {
        let repo = InMemoryCartRepository::new();
        let first = UserId::random();
        let second = UserId::random();

        let mut cart = Cart::new();
        cart.add(
            ProductId::random(),
            Price::new(Decimal::ONE).expect("price"),
            Quantity::one(),
            false,
        );
        repo.replace(&first, &cart).await.expect("replace");
        repo.replace(&second, &cart).await.expect("replace");

        repo.clear(&first).await.expect("clear");
        assert!(repo.fetch(&first).await.expect("fetch").is_empty());
        assert!(!repo.fetch(&second).await.expect("fetch").is_empty());
    }
}
