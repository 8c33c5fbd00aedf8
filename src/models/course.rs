// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::money::Money;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub instructor: String,

    pub price: Money,

    /// Public URL of the uploaded thumbnail.
    pub thumbnail_image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A course together with its topics and module count.
/// Used by listings and the detail endpoint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub course: Course,
    pub topics: Vec<String>,
    pub total_modules: i64,
}

/// An owned course as read from storage, before progress is derived.
#[derive(Debug, Clone, FromRow)]
pub struct OwnedCourseRecord {
    pub id: Uuid,
    pub title: String,
    pub instructor: String,
    pub thumbnail_image: Option<String>,
    pub topics: Vec<String>,
    pub transaction_id: Uuid,
    pub purchased_at: DateTime<Utc>,
    pub total_modules: i64,
    pub completed_modules: i64,
}

/// Item of the "my courses" listing.
#[derive(Debug, Clone, Serialize)]
pub struct MyCourse {
    pub id: Uuid,
    pub title: String,
    pub instructor: String,
    pub topics: Vec<String>,
    pub thumbnail_image: Option<String>,
    pub progress_percentage: i64,
    pub purchased_at: DateTime<Utc>,
}

/// Values for a new course row plus its topics.
#[derive(Debug, Clone, Validate)]
pub struct NewCourse {
    #[validate(length(min = 1, max = 255, message = "Title is required."))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    #[validate(length(min = 1, max = 255, message = "Instructor is required."))]
    pub instructor: String,
    pub price: Money,
    #[validate(length(min = 1, message = "At least one topic is required."))]
    pub topics: Vec<String>,
    pub thumbnail_image: Option<String>,
}

/// Partial update of a course. `topics`, when present, replaces the set.
#[derive(Debug, Clone, Default, Validate)]
pub struct CourseChanges {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub instructor: Option<String>,
    pub price: Option<Money>,
    #[validate(length(min = 1, message = "At least one topic is required."))]
    pub topics: Option<Vec<String>>,
    pub thumbnail_image: Option<String>,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResponse {
    pub course_id: Uuid,
    pub user_balance: Money,
    pub transaction_id: Uuid,
}

/// Ownership and progress of the caller for one course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnershipStatus {
    pub owns_course: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percentage: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}
