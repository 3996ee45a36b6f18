//! PostgreSQL-backed `UserRepository` implementation using Diesel.
//!
//! Uniqueness of username and email is enforced by database constraints;
//! unique violations are folded into the port's duplicate variants so the
//! HTTP layer can report per-field errors.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{NewUser, UserPersistenceError, UserRepository, UserUpdate};
use crate::domain::user::{Email, PasswordHash, User, UserId, Username};

use super::models::{NewUserRow, UserChanges, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            UserPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            let constraint = info.constraint_name().unwrap_or_default();
            if constraint.contains("email") {
                UserPersistenceError::DuplicateEmail
            } else {
                UserPersistenceError::DuplicateUsername
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselError::NotFound => UserPersistenceError::query("record not found"),
        _ => UserPersistenceError::query("database error"),
    }
}

/// Convert a stored row to a domain user plus its password hash.
///
/// Stored values should always satisfy domain validation; rows written by an
/// older schema that no longer validate surface as query errors.
fn row_to_user(row: UserRow) -> Result<(User, PasswordHash), UserPersistenceError> {
    let username = Username::new(row.username)
        .map_err(|err| UserPersistenceError::query(format!("stored username invalid: {err}")))?;
    let email = Email::new(row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored email invalid: {err}")))?;
    let hash = PasswordHash::parse(&row.password_hash)
        .map_err(|err| UserPersistenceError::query(format!("stored password hash invalid: {err}")))?;
    let user = User::new(
        UserId::from_uuid(row.id),
        username,
        email,
        row.first_name,
        row.last_name,
        row.is_staff,
    );
    Ok((user, hash))
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let id = UserId::random();
        let encoded = new_user.password_hash.encoded();
        let row = NewUserRow {
            id: *id.as_uuid(),
            username: new_user.username.as_str(),
            email: new_user.email.as_str(),
            first_name: &new_user.first_name,
            last_name: &new_user.last_name,
            password_hash: &encoded,
            is_staff: new_user.is_staff,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(User::new(
            id,
            new_user.username,
            new_user.email,
            new_user.first_name,
            new_user.last_name,
            new_user.is_staff,
        ))
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .order(users::username.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|row| row_to_user(row).map(|(user, _)| user))
            .collect()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row_to_user(row).map(|(user, _)| user))
            .transpose()
    }

    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username.as_str()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn update(
        &self,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<Option<User>, UserPersistenceError> {
        // Diesel rejects an empty changeset; treat it as a plain read.
        if update.email.is_none()
            && update.first_name.is_none()
            && update.last_name.is_none()
            && update.is_staff.is_none()
        {
            return self.find_by_id(id).await;
        }

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = UserChanges {
            email: update.email.as_ref().map(Email::as_str),
            first_name: update.first_name.as_deref(),
            last_name: update.last_name.as_deref(),
            is_staff: update.is_staff,
        };

        let row: Option<UserRow> = diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set(&changes)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row_to_user(row).map(|(user, _)| user))
            .transpose()
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, UserPersistenceError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn not_found_maps_to_query_error() {
        let err = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(err, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn row_conversion_rejects_corrupt_hash() {
        let row = UserRow {
            id: uuid::Uuid::new_v4(),
            username: "ada_lovelace".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password_hash: "not-an-encoded-hash".into(),
            is_staff: false,
            created_at: chrono::Utc::now(),
        };
        assert!(matches!(
            row_to_user(row),
            Err(UserPersistenceError::Query { .. })
        ));
    }

    #[rstest]
    fn row_conversion_yields_domain_user() {
        let hash = PasswordHash::generate("s3cret-pass").expect("hash");
        let row = UserRow {
            id: uuid::Uuid::new_v4(),
            username: "ada_lovelace".into(),
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            password_hash: hash.encoded(),
            is_staff: true,
            created_at: chrono::Utc::now(),
        };
        let (user, parsed) = row_to_user(row).expect("conversion");
        assert_eq!(user.username().as_str(), "ada_lovelace");
        assert!(user.is_staff());
        assert!(parsed.verify("s3cret-pass"));
    }
}
