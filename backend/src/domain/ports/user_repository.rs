//! Driven port for user account persistence.
//!
//! Inbound adapters use this port for registration, listing, and detail
//! operations without importing outbound persistence concerns. Uniqueness of
//! username and email is the port's responsibility so the database adapter
//! can rely on unique indexes while the in-memory adapter checks its map.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::user::{Email, PasswordHash, User, UserId, Username};

/// Errors raised by user persistence adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user store connection failed: {message}")]
    Connection { message: String },
    /// Query failed during execution or row conversion.
    #[error("user store query failed: {message}")]
    Query { message: String },
    /// The username is already taken.
    #[error("username already exists")]
    DuplicateUsername,
    /// The email is already registered.
    #[error("email already exists")]
    DuplicateEmail,
}

impl UserPersistenceError {
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

/// Material needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: PasswordHash,
    pub is_staff: bool,
}

/// Partial update applied to an existing account.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
}

/// Port for storing and querying user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account, rejecting duplicate usernames or emails.
    async fn create(&self, new_user: NewUser) -> Result<User, UserPersistenceError>;

    /// List every account ordered by username.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Fetch one account by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account plus its password digest for credential checks.
    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, UserPersistenceError>;

    /// Apply a partial update; `None` when the account does not exist.
    async fn update(
        &self,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Delete an account; `false` when nothing was stored under the id.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}

#[derive(Default)]
struct UserStoreState {
    users: HashMap<UserId, (User, PasswordHash)>,
}

/// Process-lifetime user store used by tests and pool-less deployments.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<UserStoreState>,
}

impl InMemoryUserRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with one account (handy for login fixtures).
    pub fn with_user(user: User, password_hash: PasswordHash) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap_or_else(|e| e.into_inner());
            state.users.insert(user.id().clone(), (user, password_hash));
        }
        store
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, UserPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state
            .users
            .values()
            .any(|(user, _)| user.username() == &new_user.username)
        {
            return Err(UserPersistenceError::DuplicateUsername);
        }
        if state
            .users
            .values()
            .any(|(user, _)| user.email() == &new_user.email)
        {
            return Err(UserPersistenceError::DuplicateEmail);
        }
        let user = User::new(
            UserId::random(),
            new_user.username,
            new_user.email,
            new_user.first_name,
            new_user.last_name,
            new_user.is_staff,
        );
        state
            .users
            .insert(user.id().clone(), (user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut users: Vec<User> = state.users.values().map(|(user, _)| user.clone()).collect();
        users.sort_by(|a, b| a.username().as_str().cmp(b.username().as_str()));
        Ok(users)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.get(id).map(|(user, _)| user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, UserPersistenceError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state
            .users
            .values()
            .find(|(user, _)| user.username() == username)
            .cloned())
    }

    async fn update(
        &self,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(updated_email) = &update.email {
            let taken = state
                .users
                .iter()
                .any(|(other_id, (user, _))| other_id != id && user.email() == updated_email);
            if taken {
                return Err(UserPersistenceError::DuplicateEmail);
            }
        }
        let Some((user, hash)) = state.users.get(id).cloned() else {
            return Ok(None);
        };
        let updated = User::new(
            user.id().clone(),
            user.username().clone(),
            update.email.unwrap_or_else(|| user.email().clone()),
            update
                .first_name
                .unwrap_or_else(|| user.first_name().to_owned()),
            update
                .last_name
                .unwrap_or_else(|| user.last_name().to_owned()),
            update.is_staff.unwrap_or(user.is_staff()),
        );
        state.users.insert(id.clone(), (updated.clone(), hash));
        Ok(Some(updated))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.users.remove(id).is_some())
    }
}
