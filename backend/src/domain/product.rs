//! Product catalog data model.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the product value-object constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyId,
    InvalidId,
    EmptyName,
    NameTooLong { max: usize },
    NegativePrice,
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "product id must not be empty"),
            Self::InvalidId => write!(f, "product id must be a valid UUID"),
            Self::EmptyName => write!(f, "product name must not be empty"),
            Self::NameTooLong { max } => {
                write!(f, "product name must be at most {max} characters")
            }
            Self::NegativePrice => write!(f, "product price must not be negative"),
        }
    }
}

impl std::error::Error for ProductValidationError {}

/// Stable product identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
    /// Validate and construct a [`ProductId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ProductValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(ProductValidationError::EmptyId);
        }
        let parsed = Uuid::parse_str(raw).map_err(|_| ProductValidationError::InvalidId)?;
        Ok(Self(parsed))
    }

    /// Generate a new random [`ProductId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum allowed length for a product name.
pub const PRODUCT_NAME_MAX: usize = 150;

/// Validated product display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName(String);

impl ProductName {
    /// Validate and construct a [`ProductName`] from owned input.
    pub fn new(name: impl Into<String>) -> Result<Self, ProductValidationError> {
        Self::from_owned(name.into())
    }

    fn from_owned(name: String) -> Result<Self, ProductValidationError> {
        if name.trim().is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        if name.chars().count() > PRODUCT_NAME_MAX {
            return Err(ProductValidationError::NameTooLong {
                max: PRODUCT_NAME_MAX,
            });
        }
        Ok(Self(name))
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProductName> for String {
    fn from(value: ProductName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProductName {
    type Error = ProductValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Non-negative decimal price.
///
/// Totals computed from prices use exact decimal arithmetic; floats never
/// enter the money path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Validate and construct a [`Price`].
    pub fn new(amount: Decimal) -> Result<Self, ProductValidationError> {
        if amount.is_sign_negative() {
            return Err(ProductValidationError::NegativePrice);
        }
        Ok(Self(amount))
    }

    /// A zero price.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Access the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Price> for Decimal {
    fn from(value: Price) -> Self {
        value.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ProductValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Catalog product entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: ProductName,
    pub description: String,
    pub price: Price,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Product {
    /// Assemble a new product with fresh timestamps.
    pub fn create(
        name: ProductName,
        description: impl Into<String>,
        price: Price,
        category: Option<String>,
        image_url: Option<String>,
        is_available: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::random(),
            name,
            description: description.into(),
            price,
            category,
            image_url,
            is_available,
            created_at: now,
            modified_at: now,
        }
    }
}
