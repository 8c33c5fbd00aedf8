// src/handlers/modules.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    docs::ModuleForm,
    error::AppError,
    models::{
        module::{ModuleChanges, NewModule, ReorderRequest},
        pagination::ListParams,
        response::ApiResponse,
    },
    services::{Caller, ModuleMedia, ModuleService, ProgressService},
    store::Store,
    utils::{
        certificate::CertificateIssuer, jwt::Claims, multipart::FormData, storage::FileStorage,
    },
};

/// Lists a course's modules with the caller's completion flags.
/// Requires ownership of the course, or the admin role.
#[utoipa::path(
    get,
    path = "/api/courses/{id}/modules",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Course id"), ListParams),
    responses(
        (status = 200, description = "Page of modules with completion flags"),
        (status = 403, description = "Course not owned")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_course_modules(
    State(store): State<Arc<dyn Store>>,
    State(certificates): State<Arc<dyn CertificateIssuer>>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<Uuid>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let caller = Caller::try_from(&claims)?;
    let page = ProgressService::new(store.as_ref(), certificates.as_ref())
        .list_modules_for_course(caller, course_id, params.page_request())
        .await?;

    Ok(ApiResponse::page("Modules retrieved successfully", page))
}

/// Creates a module from a multipart form (admin only).
///
/// Fields: `title`, `description`, optional files `pdf_content` and `video_content`.
#[utoipa::path(
    post,
    path = "/api/courses/{id}/modules",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body(content = ModuleForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Module created"),
        (status = 400, description = "Invalid form"),
        (status = 404, description = "Course not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_module(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(course_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = FormData::read(multipart).await?;

    let module = NewModule {
        course_id,
        title: form.required_text("title")?,
        description: form.required_text("description")?,
        pdf_content: None,
        video_content: None,
    };
    let media = ModuleMedia {
        pdf: form.take_file("pdf_content"),
        video: form.take_file("video_content"),
    };

    let created = ModuleService::new(store.as_ref(), files.as_ref())
        .create_module(module, media)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success("Module created successfully", created),
    ))
}

/// Assigns new positions to a course's modules (admin only).
#[utoipa::path(
    patch,
    path = "/api/courses/{id}/modules/reorder",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = ReorderRequest,
    responses(
        (status = 200, description = "Modules reordered"),
        (status = 400, description = "Unknown module id")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reorder_modules(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<ReorderRequest>,
) -> Result<impl IntoResponse, AppError> {
    ModuleService::new(store.as_ref(), files.as_ref())
        .reorder_modules(course_id, &payload.module_order)
        .await?;

    Ok(ApiResponse::success(
        "Modules reordered successfully",
        payload.module_order,
    ))
}

#[utoipa::path(
    get,
    path = "/api/modules/{id}",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Module id")),
    responses(
        (status = 200, description = "Module found"),
        (status = 403, description = "Course not owned"),
        (status = 404, description = "Module not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_module(
    State(store): State<Arc<dyn Store>>,
    State(certificates): State<Arc<dyn CertificateIssuer>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let caller = Caller::try_from(&claims)?;
    let module = ProgressService::new(store.as_ref(), certificates.as_ref())
        .get_module(caller, id)
        .await?;

    Ok(ApiResponse::success("Module retrieved successfully", module))
}

#[utoipa::path(
    put,
    path = "/api/modules/{id}",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Module id")),
    request_body(content = ModuleForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Module updated"),
        (status = 404, description = "Module not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_module(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut form = FormData::read(multipart).await?;

    let changes = ModuleChanges {
        title: form.text("title"),
        description: form.text("description"),
        pdf_content: None,
        video_content: None,
    };
    let media = ModuleMedia {
        pdf: form.take_file("pdf_content"),
        video: form.take_file("video_content"),
    };

    let updated = ModuleService::new(store.as_ref(), files.as_ref())
        .update_module(id, changes, media)
        .await?;

    Ok(ApiResponse::success("Module updated successfully", updated))
}

#[utoipa::path(
    delete,
    path = "/api/modules/{id}",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Module id")),
    responses(
        (status = 204, description = "Module deleted"),
        (status = 404, description = "Module not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_module(
    State(store): State<Arc<dyn Store>>,
    State(files): State<Arc<dyn FileStorage>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    ModuleService::new(store.as_ref(), files.as_ref())
        .delete_module(id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Marks a module completed for the caller. Returns a certificate URL
/// once the whole course is done.
#[utoipa::path(
    patch,
    path = "/api/modules/{id}/complete",
    tag = "modules",
    params(("id" = Uuid, Path, description = "Module id")),
    responses(
        (status = 200, description = "Module completed"),
        (status = 403, description = "Course not owned")
    ),
    security(("bearer_auth" = []))
)]
pub async fn complete_module(
    State(store): State<Arc<dyn Store>>,
    State(certificates): State<Arc<dyn CertificateIssuer>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let caller = Caller::try_from(&claims)?;
    let completion = ProgressService::new(store.as_ref(), certificates.as_ref())
        .complete_module(caller, id)
        .await?;

    Ok(ApiResponse::success("Module marked as completed", completion))
}
