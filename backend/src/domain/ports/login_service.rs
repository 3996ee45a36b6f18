//! Driving port for credential verification.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::user_repository::{UserPersistenceError, UserRepository};
use crate::domain::user::{User, Username};

/// Errors raised when verifying credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginServiceError {
    /// Unknown username or wrong password. Deliberately indistinct.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The backing user store could not be reached.
    #[error("login store connection failed: {message}")]
    Connection { message: String },
    /// The backing user store failed during the lookup.
    #[error("login store query failed: {message}")]
    Query { message: String },
}

/// Port for authenticating a username/password pair.
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Verify credentials and yield the authenticated user.
    async fn authenticate(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<User, LoginServiceError>;
}

/// Login service backed by any [`UserRepository`].
#[derive(Clone)]
pub struct RepositoryLoginService {
    users: Arc<dyn UserRepository>,
}

impl RepositoryLoginService {
    /// Create a service over the given repository.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

fn map_persistence_error(error: UserPersistenceError) -> LoginServiceError {
    match error {
        UserPersistenceError::Connection { message } => LoginServiceError::Connection { message },
        UserPersistenceError::Query { message } => LoginServiceError::Query { message },
        // Uniqueness violations cannot occur on a read path.
        other => LoginServiceError::Query {
            message: other.to_string(),
        },
    }
}

#[async_trait]
impl LoginService for RepositoryLoginService {
    async fn authenticate(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<User, LoginServiceError> {
        let credentials = self
            .users
            .find_credentials(username)
            .await
            .map_err(map_persistence_error)?;

        match credentials {
            Some((user, hash)) if hash.verify(password) => Ok(user),
            Some(_) => {
                debug!(username = %username, "password mismatch");
                Err(LoginServiceError::InvalidCredentials)
            }
            None => Err(LoginServiceError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::user_repository::InMemoryUserRepository;
    use crate::domain::user::{Email, PasswordHash, UserId};
    use rstest::rstest;

    fn seeded_service() -> RepositoryLoginService {
        let user = User::new(
            UserId::random(),
            Username::new("ada_lovelace").expect("username"),
            Email::new("ada@example.com").expect("email"),
            "Ada",
            "Lovelace",
            false,
        );
        let hash = PasswordHash::generate("s3cret-pass").expect("hash");
        RepositoryLoginService::new(Arc::new(InMemoryUserRepository::with_user(user, hash)))
    }

    #[rstest]
    #[tokio::test]
    async fn authenticates_valid_credentials() {
        let service = seeded_service();
        let username = Username::new("ada_lovelace").expect("username");
        let user = service
            .authenticate(&username, "s3cret-pass")
            .await
            .expect("login");
        assert_eq!(user.username().as_str(), "ada_lovelace");
    }

    #[rstest]
    #[case("ada_lovelace", "wrong-pass")]
    #[case("grace_hopper", "s3cret-pass")]
    #[tokio::test]
    async fn rejects_bad_credentials(#[case] username: &str, #[case] password: &str) {
        let service = seeded_service();
        let username = Username::new(username).expect("username");
        let err = service
            .authenticate(&username, password)
            .await
            .expect_err("should fail");
        assert_eq!(err, LoginServiceError::InvalidCredentials);
    }
}
