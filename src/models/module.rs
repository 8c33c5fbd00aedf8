// src/models/module.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enrollment::CourseProgress;

/// Represents the 'modules' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Module {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,

    /// 1-based position inside the course. Not unique at the storage level.
    #[sqlx(rename = "module_order")]
    pub order: i32,

    pub pdf_content: Option<String>,
    pub video_content: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Module {
    /// Media references attached to this module.
    pub fn media(&self) -> Vec<String> {
        self.pdf_content
            .iter()
            .chain(self.video_content.iter())
            .cloned()
            .collect()
    }
}

/// A module annotated with the caller's completion flag.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleWithProgress {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub module: Module,
    pub is_completed: bool,
}

/// Values for a new module row. The store assigns `order`.
#[derive(Debug, Clone, Validate)]
pub struct NewModule {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    pub pdf_content: Option<String>,
    pub video_content: Option<String>,
}

#[derive(Debug, Clone, Default, Validate)]
pub struct ModuleChanges {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub pdf_content: Option<String>,
    pub video_content: Option<String>,
}

/// One entry of a reorder payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ModuleOrder {
    pub id: Uuid,
    pub order: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReorderRequest {
    pub module_order: Vec<ModuleOrder>,
}

/// Result of marking a module as completed.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionResponse {
    pub module_id: Uuid,
    pub is_completed: bool,
    pub course_progress: CourseProgress,
    pub certificate_url: Option<String>,
}
