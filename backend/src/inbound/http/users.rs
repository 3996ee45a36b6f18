//! User account HTTP handlers.
//!
//! ```text
//! POST /register/        {"username":"ada_lovelace","email":"ada@example.com","password":"..."}
//! POST /login/           {"username":"ada_lovelace","password":"..."}
//! POST /logout/
//! GET  /users/           list accounts
//! POST /users/           create account (staff)
//! GET|PUT|DELETE /users/{id}/
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{NewUser, UserPersistenceError, UserUpdate};
use crate::domain::user::{
    Email, PasswordHash, User, UserId, UserValidationError, Username,
};
use crate::domain::{Error, ports::LoginServiceError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Account creation request body (staff only; may grant the staff flag).
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub registration: RegisterRequest,
    #[serde(default)]
    pub is_staff: bool,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Partial account update body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
}

/// Account payload returned by every user endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            first_name: user.first_name().to_owned(),
            last_name: user.last_name().to_owned(),
            is_staff: user.is_staff(),
        }
    }
}

fn field_error(field: &str, error: &UserValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::DuplicateUsername => Error::invalid_request("username already exists")
            .with_details(json!({ "field": "username", "code": "duplicate" })),
        UserPersistenceError::DuplicateEmail => Error::invalid_request("email already exists")
            .with_details(json!({ "field": "email", "code": "duplicate" })),
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_login_error(error: LoginServiceError) -> Error {
    match error {
        LoginServiceError::InvalidCredentials => Error::unauthorized("invalid credentials"),
        LoginServiceError::Connection { message } => Error::service_unavailable(message),
        LoginServiceError::Query { message } => Error::internal(message),
    }
}

fn parse_new_user(request: RegisterRequest, is_staff: bool) -> Result<NewUser, Error> {
    let username =
        Username::new(request.username).map_err(|err| field_error("username", &err))?;
    let email = Email::new(request.email).map_err(|err| field_error("email", &err))?;
    let password_hash =
        PasswordHash::generate(&request.password).map_err(|err| field_error("password", &err))?;
    Ok(NewUser {
        username,
        email,
        first_name: request.first_name,
        last_name: request.last_name,
        password_hash,
        is_staff,
    })
}

fn parse_user_id(raw: &str) -> Result<UserId, Error> {
    UserId::new(raw).map_err(|err| Error::invalid_request(err.to_string()))
}

/// Register a new account.
#[utoipa::path(
    post,
    path = "/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/register/")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let new_user = parse_new_user(payload.into_inner(), false)?;
    let user = state
        .users
        .create(new_user)
        .await
        .map_err(map_user_persistence_error)?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login/")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let username =
        Username::new(request.username).map_err(|err| field_error("username", &err))?;
    let user = state
        .login
        .authenticate(&username, &request.password)
        .await
        .map_err(map_login_error)?;
    session.persist_user(&user)?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/// Drop the current session.
#[utoipa::path(
    post,
    path = "/logout/",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout"
)]
#[post("/logout/")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

/// List accounts.
#[utoipa::path(
    get,
    path = "/users/",
    responses(
        (status = 200, description = "Accounts", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users/")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    session.require_user_id()?;
    let users = state
        .users
        .list()
        .await
        .map_err(map_user_persistence_error)?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Create an account on behalf of someone else (staff only).
#[utoipa::path(
    post,
    path = "/users/",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users/")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let request = payload.into_inner();
    let new_user = parse_new_user(request.registration, request.is_staff)?;
    let user = state
        .users
        .create(new_user)
        .await
        .map_err(map_user_persistence_error)?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/users/{id}/",
    params(("id" = String, Path, description = "Account id (UUID)")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}/")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    session.require_user_id()?;
    let id = parse_user_id(&path.into_inner())?;
    let user = state
        .users
        .find_by_id(&id)
        .await
        .map_err(map_user_persistence_error)?
        .ok_or_else(|| Error::not_found("user not found"))?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Update one account (staff only).
#[utoipa::path(
    put,
    path = "/users/{id}/",
    params(("id" = String, Path, description = "Account id (UUID)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{id}/")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    session.require_staff()?;
    let id = parse_user_id(&path.into_inner())?;
    let request = payload.into_inner();
    let email = request
        .email
        .map(|raw| Email::new(raw).map_err(|err| field_error("email", &err)))
        .transpose()?;
    let update = UserUpdate {
        email,
        first_name: request.first_name,
        last_name: request.last_name,
        is_staff: request.is_staff,
    };
    let user = state
        .users
        .update(&id, update)
        .await
        .map_err(map_user_persistence_error)?
        .ok_or_else(|| Error::not_found("user not found"))?;
    Ok(web::Json(UserResponse::from(user)))
}

/// Delete one account (staff only).
#[utoipa::path(
    delete,
    path = "/users/{id}/",
    params(("id" = String, Path, description = "Account id (UUID)")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Forbidden", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}/")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    session.require_staff()?;
    let id = parse_user_id(&path.into_inner())?;
    let deleted = state
        .users
        .delete(&id)
        .await
        .map_err(map_user_persistence_error)?;
    if deleted {
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(Error::not_found("user not found"))
    }
}
