// src/handlers/courses.rs

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    docs::CourseForm,
    error::AppError,
    models::{
        course::{CourseChanges, NewCourse},
        pagination::ListParams,
        response::ApiResponse,
    },
    services::{CatalogService, ProgressService, PurchaseService},
    store::Store,
    utils::{
        certificate::CertificateIssuer, jwt::Claims, multipart::FormData, storage::FileStorage,
    },
};

/// Lists courses, newest first. Supports `q`, `page` and `limit`.
#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "courses",
    params(ListParams),
    responses(
        (status = 200, description = "Page of courses")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_courses(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = CatalogService::new(store.as_ref(), files.as_ref())
        .list_courses(&params)
        .await?;

    Ok(ApiResponse::page("Courses retrieved successfully", page))
}

/// Lists the caller's purchased courses with their progress.
#[utoipa::path(
    get,
    path = "/api/courses/my-courses",
    tag = "courses",
    params(ListParams),
    responses(
        (status = 200, description = "Page of purchased courses with progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_courses(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = CatalogService::new(store.as_ref(), files.as_ref())
        .list_my_courses(claims.user_id()?, &params)
        .await?;

    Ok(ApiResponse::page("My courses retrieved successfully", page))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course found"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_course(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let course = CatalogService::new(store.as_ref(), files.as_ref())
        .get_course(id)
        .await?;

    Ok(ApiResponse::success("Course retrieved successfully", course))
}

/// Creates a course from a multipart form (admin only).
///
/// Fields: `title`, `description`, `instructor`, `price`, `topics`,
/// optional file `thumbnail_image`.
#[utoipa::path(
    post,
    path = "/api/courses",
    tag = "courses",
    request_body(content = CourseForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Course created"),
        (status = 400, description = "Invalid form")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_course(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = FormData::read(multipart).await?;

    let course = NewCourse {
        title: form.required_text("title")?,
        description: form.required_text("description")?,
        instructor: form.required_text("instructor")?,
        price: form
            .money("price")?
            .ok_or(AppError::BadRequest("Field 'price' is required".to_string()))?,
        topics: form.topics("topics")?.unwrap_or_default(),
        thumbnail_image: None,
    };
    let thumbnail = form.take_file("thumbnail_image");

    let created = CatalogService::new(store.as_ref(), files.as_ref())
        .create_course(course, thumbnail)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Course created successfully", created),
    ))
}

/// Partially updates a course (admin only). Every field is optional.
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body(content = CourseForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Course updated"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_course(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = FormData::read(multipart).await?;

    let changes = CourseChanges {
        title: form.text("title"),
        description: form.text("description"),
        instructor: form.text("instructor"),
        price: form.money("price")?,
        topics: form.topics("topics")?,
        thumbnail_image: None,
    };
    let thumbnail = form.take_file("thumbnail_image");

    let updated = CatalogService::new(store.as_ref(), files.as_ref())
        .update_course(id, changes, thumbnail)
        .await?;

    Ok(ApiResponse::success("Course updated successfully", updated))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_course(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    CatalogService::new(store.as_ref(), files.as_ref())
        .delete_course(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Buys a course with the caller's balance.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/buy",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 201, description = "Course purchased"),
        (status = 400, description = "Already owned or insufficient balance"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn buy_course(
    State(store): State<Arc<dyn Store>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let purchase = PurchaseService::new(store.as_ref())
        .buy_course(claims.user_id()?, id)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Course purchased successfully", purchase),
    ))
}

/// Ownership and progress of the caller for a course.
#[utoipa::path(
    get,
    path = "/api/courses/{id}/buy-status",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Ownership and progress")
    ),
    security(("bearer_auth" = []))
)]
pub async fn buy_status(
    State(store): State<Arc<dyn Store>>,
    State(certificates): State<Arc<dyn CertificateIssuer>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let status = ProgressService::new(store.as_ref(), certificates.as_ref())
        .ownership_status(claims.user_id()?, id)
        .await?;

    Ok(ApiResponse::success("Ownership status retrieved", status))
}
