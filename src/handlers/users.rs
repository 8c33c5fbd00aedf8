// src/handlers/users.rs
//
// Admin-only user management.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        pagination::ListParams,
        response::ApiResponse,
        user::{BalanceIncrementRequest, UpdateUserRequest},
    },
    services::UserService,
    store::Store,
};

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(ListParams),
    responses(
        (status = 200, description = "Page of users"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(store): State<Arc<dyn Store>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = UserService::new(store.as_ref()).list_users(&params).await?;
    Ok(ApiResponse::page("Users retrieved successfully", page))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User found"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::new(store.as_ref()).get_user(id).await?;
    Ok(ApiResponse::success("User retrieved successfully", user))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/balance",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = BalanceIncrementRequest,
    responses(
        (status = 200, description = "New balance"),
        (status = 400, description = "Invalid amount"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn increment_balance(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BalanceIncrementRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let balance = UserService::new(store.as_ref())
        .increment_balance(id, payload.increment)
        .await?;

    Ok(ApiResponse::success("Balance updated successfully", balance))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username or email taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = UserService::new(store.as_ref())
        .update_user(id, payload)
        .await?;

    Ok(ApiResponse::success("User updated successfully", user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(store): State<Arc<dyn Store>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    UserService::new(store.as_ref()).delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
