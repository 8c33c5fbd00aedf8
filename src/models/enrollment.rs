// src/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::money::Money;

/// Represents the 'user_courses' table: proof that a user bought a course.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ownership {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub purchased_at: DateTime<Utc>,
    /// Defined by the schema, never written by the completion flow.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Ownership record and the buyer's balance after the debit.
#[derive(Debug, Clone)]
pub struct Purchase {
    pub ownership: Ownership,
    pub balance: Money,
}

/// Represents the 'user_module_progress' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Progress {
    pub user_id: Uuid,
    pub module_id: Uuid,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Derived progress of one user through one course. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub total_modules: i64,
    pub completed_modules: i64,
    pub percentage: i64,
}

impl CourseProgress {
    pub fn from_counts(total_modules: i64, completed_modules: i64) -> Self {
        Self {
            total_modules,
            completed_modules,
            percentage: progress_percentage(total_modules, completed_modules),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percentage == 100
    }
}

/// `round(completed * 100 / total)`, or 0 for an empty course.
/// Halves round away from zero.
pub fn progress_percentage(total_modules: i64, completed_modules: i64) -> i64 {
    if total_modules <= 0 {
        return 0;
    }
    (completed_modules as f64 * 100.0 / total_modules as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(progress_percentage(3, 1), 33);
        assert_eq!(progress_percentage(3, 2), 67);
        assert_eq!(progress_percentage(3, 3), 100);
        assert_eq!(progress_percentage(8, 1), 13);
        assert_eq!(progress_percentage(200, 1), 1);
    }

    #[test]
    fn empty_course_is_zero_percent() {
        assert_eq!(progress_percentage(0, 0), 0);
        assert!(!CourseProgress::from_counts(0, 0).is_complete());
    }

    #[test]
    fn full_course_is_complete() {
        let progress = CourseProgress::from_counts(4, 4);
        assert_eq!(progress.percentage, 100);
        assert!(progress.is_complete());
    }
}
