//! Domain primitives and aggregates.
//!
//! Purpose: define strongly typed domain entities used by the API and
//! persistence layers. Keep types immutable and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic error payload.
//! - `User`, `UserId`, `Username`, `Email`, `PasswordHash`: account types.
//! - `Product`, `ProductId`, `ProductName`, `Price`: catalog types.
//! - `Cart`, `CartLine`, `Quantity`: the cart mapping and its operations.

pub mod cart;
pub mod error;
pub mod ports;
pub mod product;
pub mod user;

pub use self::cart::{Cart, CartLine, CartValidationError, Quantity};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::product::{Price, Product, ProductId, ProductName, ProductValidationError};
pub use self::user::{Email, PasswordHash, User, UserId, UserValidationError, Username};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use storefront_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
