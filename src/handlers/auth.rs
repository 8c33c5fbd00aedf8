// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        response::ApiResponse,
        user::{LoginRequest, RegisterRequest},
    },
    services::AuthService,
    store::Store,
    utils::jwt::Claims,
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the new user's public fields.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered"),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn register(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = AuthService::new(store.as_ref(), &config)
        .register(payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("User registered successfully", user),
    ))
}

/// Authenticates by username or email and returns a JWT.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "JWT issued"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let login = AuthService::new(store.as_ref(), &config)
        .login(payload)
        .await?;

    Ok(ApiResponse::success("Login successful", login))
}

/// Returns the caller's own profile.
#[utoipa::path(
    get,
    path = "/api/auth/self",
    tag = "auth",
    responses(
        (status = 200, description = "Caller profile"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_self(
    State(store): State<Arc<dyn Store>>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let profile = AuthService::new(store.as_ref(), &config)
        .profile(claims.user_id()?)
        .await?;

    Ok(ApiResponse::success("User profile retrieved", profile))
}
