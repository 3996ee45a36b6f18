//! User account data model.

use std::fmt;
use std::sync::OnceLock;

use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Validation errors returned by the user value-object constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    UsernameTooShort { min: usize },
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmailTooShort { min: usize },
    EmailTooLong { max: usize },
    EmailInvalidShape,
    PasswordTooShort { min: usize },
    PasswordTooLong { max: usize },
    InvalidPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::UsernameTooShort { min } => {
                write!(f, "username must be at least {min} characters")
            }
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, numbers, dots, hyphens, or underscores",
            ),
            Self::EmailTooShort { min } => write!(f, "email must be at least {min} characters"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::EmailInvalidShape => write!(f, "email must look like local@domain"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::PasswordTooLong { max } => {
                write!(f, "password must be at most {max} characters")
            }
            Self::InvalidPasswordHash => write!(f, "password hash must be salt$digest hex"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Minimum allowed length for a username.
pub const USERNAME_MIN: usize = 6;
/// Maximum allowed length for a username.
pub const USERNAME_MAX: usize = 50;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = r"^[A-Za-z0-9._-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

/// Unique login name for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`] from owned input.
    pub fn new(username: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(username.into())
    }

    fn from_owned(username: String) -> Result<Self, UserValidationError> {
        let length = username.chars().count();
        if length < USERNAME_MIN {
            return Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN });
        }
        if length > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        if !username_regex().is_match(&username) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(username))
    }

    /// Borrow the username as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Minimum allowed length for an email address.
pub const EMAIL_MIN: usize = 6;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 50;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Shape check only; deliverability is not the domain's concern.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Contact email address for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`] from owned input.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let length = email.chars().count();
        if length < EMAIL_MIN {
            return Err(UserValidationError::EmailTooShort { min: EMAIL_MIN });
        }
        if length > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::EmailInvalidShape);
        }
        Ok(Self(email))
    }

    /// Borrow the email as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Minimum allowed length for a raw password.
pub const PASSWORD_MIN: usize = 6;
/// Maximum allowed length for a raw password.
pub const PASSWORD_MAX: usize = 150;

const SALT_BYTES: usize = 16;

/// Salted SHA-256 password digest stored as `salt$digest` hex.
///
/// The raw password never leaves this module once hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    salt: Vec<u8>,
    digest: Vec<u8>,
}

impl PasswordHash {
    /// Hash a raw password with a fresh random salt.
    pub fn generate(password: &str) -> Result<Self, UserValidationError> {
        validate_password(password)?;
        let mut salt = vec![0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);
        Ok(Self::derive(password, salt))
    }

    /// Parse a stored `salt$digest` hex representation.
    pub fn parse(stored: &str) -> Result<Self, UserValidationError> {
        let (salt_hex, digest_hex) = stored
            .split_once('$')
            .ok_or(UserValidationError::InvalidPasswordHash)?;
        let salt = hex::decode(salt_hex).map_err(|_| UserValidationError::InvalidPasswordHash)?;
        let digest =
            hex::decode(digest_hex).map_err(|_| UserValidationError::InvalidPasswordHash)?;
        if salt.is_empty() || digest.len() != Sha256::output_size() {
            return Err(UserValidationError::InvalidPasswordHash);
        }
        Ok(Self { salt, digest })
    }

    /// Check a raw password against this digest.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::derive(password, self.salt.clone());
        candidate.digest == self.digest
    }

    /// Render the stored `salt$digest` hex form.
    pub fn encoded(&self) -> String {
        format!("{}${}", hex::encode(&self.salt), hex::encode(&self.digest))
    }

    fn derive(password: &str, salt: Vec<u8>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&salt);
        hasher.update(password.as_bytes());
        let digest = hasher.finalize().to_vec();
        Self { salt, digest }
    }
}

fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let length = password.chars().count();
    if length < PASSWORD_MIN {
        return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
    }
    if length > PASSWORD_MAX {
        return Err(UserValidationError::PasswordTooLong { max: PASSWORD_MAX });
    }
    Ok(())
}

/// Domain user identity.
///
/// The password digest is intentionally absent; credential material is only
/// handled by the registration and login ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    first_name: String,
    last_name: String,
    is_staff: bool,
}

impl User {
    /// Assemble a user from validated parts.
    pub fn new(
        id: UserId,
        username: Username,
        email: Email,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        is_staff: bool,
    ) -> Self {
        Self {
            id,
            username,
            email,
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_staff,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Contact address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Given name; may be empty.
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Family name; may be empty.
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Whether the user may manage the catalog and other users.
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("short", Err(UserValidationError::UsernameTooShort { min: USERNAME_MIN }))]
    #[case("valid_user", Ok(()))]
    #[case("has spaces!", Err(UserValidationError::UsernameInvalidCharacters))]
    fn username_validation(
        #[case] raw: &str,
        #[case] expected: Result<(), UserValidationError>,
    ) {
        let result = Username::new(raw).map(|_| ());
        assert_eq!(result, expected);
    }

    #[rstest]
    #[case("a@b.c", false)] // below minimum length
    #[case("user@example.com", true)]
    #[case("not-an-email", false)]
    #[case("two@@example.com", false)]
    fn email_validation(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(Email::new(raw).is_ok(), ok);
    }

    #[test]
    fn user_id_rejects_non_uuid() {
        assert_eq!(
            UserId::new("not-a-uuid"),
            Err(UserValidationError::InvalidId)
        );
    }

    #[test]
    fn password_hash_round_trips_through_encoding() {
        let hash = PasswordHash::generate("correct horse").expect("hash");
        let parsed = PasswordHash::parse(&hash.encoded()).expect("parse");
        assert!(parsed.verify("correct horse"));
        assert!(!parsed.verify("wrong horse"));
    }

    #[test]
    fn password_hash_rejects_short_password() {
        assert_eq!(
            PasswordHash::generate("tiny"),
            Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN })
        );
    }

    #[test]
    fn password_hash_rejects_malformed_stored_value() {
        assert_eq!(
            PasswordHash::parse("deadbeef"),
            Err(UserValidationError::InvalidPasswordHash)
        );
    }
}
