//! Product catalog HTTP handlers.
//!
//! Listing and detail reads are public; mutations require a staff session.
//! Detail reads consult the remote catalog fallback before answering 404,
//! and cache any hit in the local store. `/productapi/` is a legacy alias
//! for `/products/` kept for older storefront clients.

use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::ports::{
    CatalogProduct, CatalogSourceError, ProductPatch, ProductPersistenceError,
};
use crate::domain::product::{Price, Product, ProductId, ProductName, ProductValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Product creation request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

/// Partial product update body.
///
/// Optional string fields distinguish "absent" (keep stored value) from an
/// explicit `null` (clear the value).
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "14.99")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "nullable_field")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_field")]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,
    pub is_available: Option<bool>,
}

fn nullable_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Product payload returned by every catalog endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.into(),
            description: product.description,
            price: product.price.amount(),
            category: product.category,
            image_url: product.image_url,
            is_available: product.is_available,
            created_at: product.created_at,
            modified_at: product.modified_at,
        }
    }
}

fn field_error(field: &str, error: &ProductValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

pub(crate) fn map_product_persistence_error(error: ProductPersistenceError) -> Error {
    match error {
        ProductPersistenceError::Connection { message } => Error::service_unavailable(message),
        ProductPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_catalog_error(error: CatalogSourceError) -> Error {
    match error {
        CatalogSourceError::Transport { message } => Error::service_unavailable(message),
        CatalogSourceError::Status { status } => {
            Error::service_unavailable(format!("catalog returned status {status}"))
        }
        CatalogSourceError::Decode { message } => Error::internal(message),
    }
}

pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, Error> {
    ProductId::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

fn parse_new_product(request: CreateProductRequest) -> Result<Product, Error> {
    let name = ProductName::new(request.name).map_err(|err| field_error("name", &err))?;
    let price = Price::new(request.price).map_err(|err| field_error("price", &err))?;
    Ok(Product::create(
        name,
        request.description,
        price,
        request.category,
        request.image_url,
        request.is_available,
    ))
}

/// Import a remote catalog hit into the local store under the requested id.
fn adopt_catalog_product(id: ProductId, remote: CatalogProduct) -> Product {
    let now = Utc::now();
    Product {
        id,
        name: remote.name,
        description: remote.description,
        price: remote.price,
        category: remote.category,
        image_url: remote.image_url,
        is_available: true,
        created_at: now,
        modified_at: now,
    }
}

async fn list_inner(state: &HttpState) -> ApiResult<Vec<ProductResponse>> {
    let products = state
        .products
        .list()
        .await
        .map_err(map_product_persistence_error)?;
    Ok(products.into_iter().map(ProductResponse::from).collect())
}

async fn create_inner(
    state: &HttpState,
    session: &SessionContext,
    request: CreateProductRequest,
) -> ApiResult<ProductResponse> {
    session.require_staff()?;
    let product = parse_new_product(request)?;
    let stored = state
        .products
        .create(product)
        .await
        .map_err(map_product_persistence_error)?;
    Ok(ProductResponse::from(stored))
}

/// List all products.
#[utoipa::path(
    get,
    path = "/products/",
    responses((status = 200, description = "Products", body = [ProductResponse])),
    tags = ["products"],
    operation_id = "listProducts",
    security([])
)]
#[get("/products/")]
pub async fn list_products(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    Ok(web::Json(list_inner(&state).await?))
}

/// Create a product (staff only).
#[utoipa::path(
    post,
    path = "/products/",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["products"],
    operation_id = "createProduct"
)]
#[post("/products/")]
pub async fn create_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProductRequest>,
) -> ApiResult<HttpResponse> {
    let created = create_inner(&state, &session, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Legacy alias for [`list_products`].
#[utoipa::path(
    get,
    path = "/productapi/",
    responses((status = 200, description = "Products", body = [ProductResponse])),
    tags = ["products"],
    operation_id = "listProductsLegacy",
    security([])
)]
#[get("/productapi/")]
pub async fn list_products_legacy(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<ProductResponse>>> {
    Ok(web::Json(list_inner(&state).await?))
}

/// Legacy alias for [`create_product`].
#[utoipa::path(
    post,
    path = "/productapi/",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["products"],
    operation_id = "createProductLegacy"
)]
#[post("/productapi/")]
pub async fn create_product_legacy(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateProductRequest>,
) -> ApiResult<HttpResponse> {
    let created = create_inner(&state, &session, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Fetch one product, consulting the remote catalog on a local miss.
#[utoipa::path(
    get,
    path = "/products/{id}/",
    params(("id" = String, Path, description = "Product id (UUID)")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Catalog unavailable", body = Error)
    ),
    tags = ["products"],
    operation_id = "getProduct",
    security([])
)]
#[get("/products/{id}/")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProductResponse>> {
    let id = parse_product_id(&path.into_inner())?;
    if let Some(product) = state
        .products
        .find_by_id(&id)
        .await
        .map_err(map_product_persistence_error)?
    {
        return Ok(web::Json(ProductResponse::from(product)));
    }

    let Some(remote) = state
        .catalog
        .fetch_product(&id)
        .await
        .map_err(map_catalog_error)?
    else {
        return Err(Error::not_found("product not found"));
    };

    tracing::info!(product_id = %id, "imported product from remote catalog");
    let imported = state
        .products
        .create(adopt_catalog_product(id, remote))
        .await
        .map_err(map_product_persistence_error)?;
    Ok(web::Json(ProductResponse::from(imported)))
}

/// Update one product (staff only).
#[utoipa::path(
    put,
    path = "/products/{id}/",
    params(("id" = String, Path, description = "Product id (UUID)")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}/")]
pub async fn update_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateProductRequest>,
) -> ApiResult<web::Json<ProductResponse>> {
    session.require_staff()?;
    let id = parse_product_id(&path.into_inner())?;
    let request = payload.into_inner();
    let name = request
        .name
        .map(|raw| ProductName::new(raw).map_err(|err| field_error("name", &err)))
        .transpose()?;
    let price = request
        .price
        .map(|raw| Price::new(raw).map_err(|err| field_error("price", &err)))
        .transpose()?;
    let patch = ProductPatch {
        name,
        description: request.description,
        price,
        category: request.category,
        image_url: request.image_url,
        is_available: request.is_available,
    };
    let product = state
        .products
        .update(&id, patch)
        .await
        .map_err(map_product_persistence_error)?
        .ok_or_else(|| Error::not_found("product not found"))?;
    Ok(web::Json(ProductResponse::from(product)))
}

/// Delete one product (staff only).
#[utoipa::path(
    delete,
    path = "/products/{id}/",
    params(("id" = String, Path, description = "Product id (UUID)")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["products"],
    operation_id = "deleteProduct"
)]
#[delete("/products/{id}/")]
pub async fn delete_product(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id = parse_product_id(&path.into_inner())?;
    let deleted = state
        .products
        .delete(&id)
        .await
        .map_err(map_product_persistence_error)?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(Error::not_found("product not found"))
    }
}

/// Storefront landing payload: the product listing under a `products` key.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Storefront listing")),
    tags = ["products"],
    operation_id = "home",
    security([])
)]
#[get("/")]
pub async fn home(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let products = list_inner(&state).await?;
    Ok(HttpResponse::Ok().json(json!({ "products": products })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CatalogProduct, MockCatalogSource};
    use crate::domain::user::{Email, PasswordHash, User, UserId, Username};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;
    use serde_json::Value;
    use std::sync::Arc;

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(state))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(crate::inbound::http::users::login)
            .service(home)
            .service(list_products)
            .service(create_product)
            .service(list_products_legacy)
            .service(create_product_legacy)
            .service(get_product)
            .service(update_product)
            .service(delete_product)
    }

    fn staff_state() -> HttpState {
        let hash = PasswordHash::generate("s3cret-pass").expect("hash");
        let staff = User::new(
            UserId::random(),
            Username::new("grace_hopper").expect("username"),
            Email::new("grace@example.com").expect("email"),
            "Grace",
            "Hopper",
            true,
        );
        let users = crate::domain::ports::InMemoryUserRepository::with_user(staff, hash);
        let users: Arc<dyn crate::domain::ports::UserRepository> = Arc::new(users);
        HttpState {
            login: Arc::new(crate::domain::ports::RepositoryLoginService::new(
                users.clone(),
            )),
            users,
            products: Arc::new(crate::domain::ports::InMemoryProductRepository::new()),
            carts: Arc::new(crate::domain::ports::InMemoryCartRepository::new()),
            catalog: Arc::new(crate::domain::ports::NoCatalogSource),
        }
    }

    async fn staff_cookie(
        app: &impl actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
    ) -> actix_web::cookie::Cookie<'static> {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri("/login/")
                .set_json(serde_json::json!({
                    "username": "grace_hopper",
                    "password": "s3cret-pass"
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        res.response()
            .cookies()
            .find(|c| c.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    fn teapot_body() -> Value {
        serde_json::json!({
            "name": "Teapot",
            "description": "Stoneware teapot",
            "price": "19.99",
            "category": "kitchen"
        })
    }

    #[rstest]
    #[case("/products/")]
    #[case("/productapi/")]
    #[actix_web::test]
    async fn create_requires_staff_session(#[case] path: &str) {
        let app = actix_test::init_service(test_app(HttpState::in_memory())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(path)
                .set_json(teapot_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("/products/")]
    #[case("/productapi/")]
    #[actix_web::test]
    async fn staff_can_create_and_list(#[case] path: &str) {
        let app = actix_test::init_service(test_app(staff_state())).await;
        let cookie = staff_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(path)
                .cookie(cookie)
                .set_json(teapot_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(res).await;
        assert_eq!(created["price"].as_str(), Some("19.99"));
        assert_eq!(created["isAvailable"].as_bool(), Some(true));

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri(path).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let listed: Value = actix_test::read_body_json(res).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[actix_web::test]
    async fn create_rejects_negative_price() {
        let app = actix_test::init_service(test_app(staff_state())).await;
        let cookie = staff_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/products/")
                .cookie(cookie)
                .set_json(serde_json::json!({ "name": "Teapot", "price": "-1.00" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["details"]["field"].as_str(), Some("price"));
    }

    #[actix_web::test]
    async fn detail_miss_without_catalog_is_not_found() {
        let app = actix_test::init_service(test_app(HttpState::in_memory())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/products/{}/", uuid::Uuid::new_v4()))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn detail_miss_falls_back_to_catalog_and_caches() {
        let mut catalog = MockCatalogSource::new();
        catalog.expect_fetch_product().times(1).returning(|_| {
            Ok(Some(CatalogProduct {
                name: ProductName::new("Imported kettle").expect("name"),
                description: "From the remote catalog".into(),
                price: Price::new(Decimal::new(2500, 2)).expect("price"),
                category: None,
                image_url: None,
            }))
        });
        let state = HttpState::in_memory().with_catalog(Arc::new(catalog));
        let app = actix_test::init_service(test_app(state)).await;

        let id = uuid::Uuid::new_v4();
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/products/{id}/"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["name"].as_str(), Some("Imported kettle"));

        // Second read is served locally; the mock allows only one fetch.
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/products/{id}/"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn update_can_clear_category_with_null() {
        let app = actix_test::init_service(test_app(staff_state())).await;
        let cookie = staff_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/products/")
                .cookie(cookie.clone())
                .set_json(teapot_body())
                .to_request(),
        )
        .await;
        let created: Value = actix_test::read_body_json(res).await;
        let id = created["id"].as_str().expect("id").to_owned();

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/products/{id}/"))
                .cookie(cookie)
                .set_json(serde_json::json!({ "category": null, "price": "14.99" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let updated: Value = actix_test::read_body_json(res).await;
        assert!(updated["category"].is_null());
        assert_eq!(updated["price"].as_str(), Some("14.99"));
    }

    #[actix_web::test]
    async fn delete_missing_product_is_not_found() {
        let app = actix_test::init_service(test_app(staff_state())).await;
        let cookie = staff_cookie(&app).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/products/{}/", uuid::Uuid::new_v4()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn home_wraps_listing_under_products_key() {
        let app = actix_test::init_service(test_app(staff_state())).await;
        let cookie = staff_cookie(&app).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/products/")
                .cookie(cookie)
                .set_json(teapot_body())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["products"].as_array().map(Vec::len), Some(1));
    }
}
