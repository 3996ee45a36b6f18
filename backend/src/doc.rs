//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] generates the OpenAPI specification for the REST API: every
//! endpoint from the inbound layer, the request/response schemas, and the
//! session-cookie security scheme. Swagger UI serves the document in debug
//! builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::cart::{CartItemResponse, CartMutationRequest, CartResponse};
use crate::inbound::http::products::{
    CreateProductRequest, ProductResponse, UpdateProductRequest,
};
use crate::inbound::http::users::{
    CreateUserRequest, LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /login/.",
            ))),
        );
    }
}

/// OpenAPI document for the storefront REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Storefront backend API",
        description = "Session-authenticated shopping cart and product catalog."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::products::home,
        crate::inbound::http::products::list_products,
        crate::inbound::http::products::create_product,
        crate::inbound::http::products::list_products_legacy,
        crate::inbound::http::products::create_product_legacy,
        crate::inbound::http::products::get_product,
        crate::inbound::http::products::update_product,
        crate::inbound::http::products::delete_product,
        crate::inbound::http::cart::get_cart,
        crate::inbound::http::cart::mutate_cart,
        crate::inbound::http::cart::clear_cart,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RegisterRequest,
        CreateUserRequest,
        LoginRequest,
        UpdateUserRequest,
        UserResponse,
        CreateProductRequest,
        UpdateProductRequest,
        ProductResponse,
        CartMutationRequest,
        CartItemResponse,
        CartResponse,
    )),
    tags(
        (name = "users", description = "Registration, login, and account management"),
        (name = "products", description = "Product catalog operations"),
        (name = "cart", description = "Per-user shopping cart operations"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
