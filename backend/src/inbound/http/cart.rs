//! Shopping-cart HTTP handlers.
//!
//! The cart is keyed by the authenticated user and stored server-side; the
//! session cookie only carries the identity. `POST /cart/` accepts a single
//! mutation envelope: a `clear` flag, a `remove` flag plus product id, or an
//! add with `{productId, quantity, overrideQuantity}`. Unit prices are
//! always resolved from the product store, never taken from the client.

use actix_web::{HttpResponse, get, post, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::cart::{Cart, Quantity};
use crate::domain::ports::CartPersistenceError;
use crate::domain::product::ProductId;
use crate::domain::user::UserId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::products::{ProductResponse, parse_product_id};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Cart mutation envelope.
///
/// Exactly one branch applies per request: `clear`, `remove`, or an add.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationRequest {
    pub product_id: Option<String>,
    pub quantity: Option<u32>,
    #[serde(default)]
    pub override_quantity: bool,
    #[serde(default)]
    pub remove: bool,
    #[serde(default)]
    pub clear: bool,
}

/// One cart line with its resolved product payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub product_id: String,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<ProductResponse>,
    pub quantity: u32,
    #[schema(value_type = String, example = "19.99")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "39.98")]
    pub total_price: Decimal,
}

/// Full cart payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub cart_items: Vec<CartItemResponse>,
    pub item_count: u64,
    #[schema(value_type = String, example = "59.97")]
    pub cart_total_price: Decimal,
}

fn map_cart_persistence_error(error: CartPersistenceError) -> Error {
    match error {
        CartPersistenceError::Connection { message } => Error::service_unavailable(message),
        CartPersistenceError::Query { message } => Error::internal(message),
    }
}

fn require_product_id(raw: Option<String>) -> Result<ProductId, Error> {
    let raw = raw.ok_or_else(|| {
        Error::invalid_request("productId is required").with_details(json!({
            "field": "productId"
        }))
    })?;
    parse_product_id(&raw)
}

async fn render_cart(state: &HttpState, cart: &Cart) -> ApiResult<CartResponse> {
    let mut items = Vec::with_capacity(cart.iter().count());
    for (product_id, line) in cart.iter() {
        let product = state
            .products
            .find_by_id(product_id)
            .await
            .map_err(super::products::map_product_persistence_error)?
            .map(ProductResponse::from);
        items.push(CartItemResponse {
            product_id: product_id.to_string(),
            product,
            quantity: line.quantity.get(),
            unit_price: line.unit_price.amount(),
            total_price: line.total_price(),
        });
    }
    Ok(CartResponse {
        cart_items: items,
        item_count: cart.item_count(),
        cart_total_price: cart.total_price(),
    })
}

async fn load_cart(state: &HttpState, user_id: &UserId) -> ApiResult<Cart> {
    state
        .carts
        .fetch(user_id)
        .await
        .map_err(map_cart_persistence_error)
}

async fn store_cart(state: &HttpState, user_id: &UserId, cart: &Cart) -> ApiResult<()> {
    state
        .carts
        .replace(user_id, cart)
        .await
        .map_err(map_cart_persistence_error)
}

fn accepted() -> HttpResponse {
    HttpResponse::Accepted().json(json!({ "message": "cart updated" }))
}

/// Fetch the current user's cart.
#[utoipa::path(
    get,
    path = "/cart/",
    responses(
        (status = 200, description = "Cart contents", body = CartResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["cart"],
    operation_id = "getCart"
)]
#[get("/cart/")]
pub async fn get_cart(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CartResponse>> {
    let user_id = session.require_user_id()?;
    let cart = load_cart(&state, &user_id).await?;
    Ok(web::Json(render_cart(&state, &cart).await?))
}

/// Apply one cart mutation: clear, remove, or add/update a line.
#[utoipa::path(
    post,
    path = "/cart/",
    request_body = CartMutationRequest,
    responses(
        (status = 202, description = "Cart updated"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown product", body = Error)
    ),
    tags = ["cart"],
    operation_id = "mutateCart"
)]
#[post("/cart/")]
pub async fn mutate_cart(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CartMutationRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = payload.into_inner();

    if request.clear {
        state
            .carts
            .clear(&user_id)
            .await
            .map_err(map_cart_persistence_error)?;
        return Ok(accepted());
    }

    if request.remove {
        let product_id = require_product_id(request.product_id)?;
        let mut cart = load_cart(&state, &user_id).await?;
        cart.remove(&product_id);
        store_cart(&state, &user_id, &cart).await?;
        return Ok(accepted());
    }

    let product_id = require_product_id(request.product_id)?;
    let quantity = match request.quantity {
        Some(raw) => Quantity::new(raw).map_err(|err| {
            Error::invalid_request(err.to_string()).with_details(json!({
                "field": "quantity"
            }))
        })?,
        None => Quantity::one(),
    };
    let product = state
        .products
        .find_by_id(&product_id)
        .await
        .map_err(super::products::map_product_persistence_error)?
        .ok_or_else(|| Error::not_found("product not found"))?;

    let mut cart = load_cart(&state, &user_id).await?;
    cart.add(product_id, product.price, quantity, request.override_quantity);
    store_cart(&state, &user_id, &cart).await?;
    tracing::debug!(
        product_id = %product_id,
        quantity = quantity.get(),
        override_quantity = request.override_quantity,
        "cart line updated"
    );
    Ok(accepted())
}

/// Empty the current user's cart.
#[utoipa::path(
    post,
    path = "/cart/clear/",
    responses(
        (status = 202, description = "Cart cleared"),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["cart"],
    operation_id = "clearCart"
)]
#[post("/cart/clear/")]
pub async fn clear_cart(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    state
        .carts
        .clear(&user_id)
        .await
        .map_err(map_cart_persistence_error)?;
    Ok(HttpResponse::Accepted().json(json!({ "message": "cart cleared" })))
}
