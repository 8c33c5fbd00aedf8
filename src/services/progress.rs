//! Progress and completion engine.
//!
//! Course progress is never stored: it is recomputed from the module count
//! and the caller's completed progress rows on every request.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::access::{Caller, ensure_course_access};
use crate::{
    error::{AppError, AppResult},
    models::{
        course::OwnershipStatus,
        enrollment::CourseProgress,
        module::{CompletionResponse, ModuleWithProgress},
        pagination::{Page, PageRequest},
    },
    store::Store,
    utils::certificate::{CertificateData, CertificateIssuer},
};

pub struct ProgressService<'a> {
    store: &'a dyn Store,
    certificates: &'a dyn CertificateIssuer,
}

impl<'a> ProgressService<'a> {
    pub fn new(store: &'a dyn Store, certificates: &'a dyn CertificateIssuer) -> Self {
        Self {
            store,
            certificates,
        }
    }

    pub async fn course_progress(&self, user_id: Uuid, course_id: Uuid) -> AppResult<CourseProgress> {
        let total = self.store.count_course_modules(course_id).await?;
        let completed = self.store.count_completed_modules(user_id, course_id).await?;
        Ok(CourseProgress::from_counts(total, completed))
    }

    /// Marks a module completed for the caller.
    ///
    /// Repeat calls keep the first `completed_at`. Whenever the course is at
    /// 100% a certificate is (re)issued and its URL returned.
    #[instrument(skip(self))]
    pub async fn complete_module(
        &self,
        caller: Caller,
        module_id: Uuid,
    ) -> AppResult<CompletionResponse> {
        let module = self
            .store
            .find_module(module_id)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

        ensure_course_access(self.store, &caller, module.course_id).await?;

        let progress = self
            .store
            .mark_module_completed(caller.id, module.id)
            .await?;

        let course_progress = self.course_progress(caller.id, module.course_id).await?;

        let certificate_url = if course_progress.is_complete() {
            Some(self.issue_certificate(caller.id, module.course_id).await?)
        } else {
            None
        };

        Ok(CompletionResponse {
            module_id: module.id,
            is_completed: progress.is_completed,
            course_progress,
            certificate_url,
        })
    }

    async fn issue_certificate(&self, user_id: Uuid, course_id: Uuid) -> AppResult<String> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        let url = self
            .certificates
            .issue(&CertificateData {
                username: user.username,
                course_title: course.title,
                instructor: course.instructor,
                completion_date: Utc::now(),
                user_id,
                course_id,
            })
            .await?;

        info!(user_id = %user_id, course_id = %course_id, "Course completed");
        Ok(url)
    }

    /// Ownership and progress of `user_id` for a course.
    #[instrument(skip(self))]
    pub async fn ownership_status(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<OwnershipStatus> {
        let Some(ownership) = self.store.find_ownership(user_id, course_id).await? else {
            return Ok(OwnershipStatus {
                owns_course: false,
                transaction_id: None,
                progress_percentage: None,
                is_completed: None,
            });
        };

        let progress = self.course_progress(user_id, course_id).await?;

        Ok(OwnershipStatus {
            owns_course: true,
            transaction_id: Some(ownership.transaction_id),
            progress_percentage: Some(progress.percentage),
            is_completed: Some(progress.is_complete()),
        })
    }

    /// Modules of a course in ascending order with the caller's completion flags.
    #[instrument(skip(self))]
    pub async fn list_modules_for_course(
        &self,
        caller: Caller,
        course_id: Uuid,
        page: PageRequest,
    ) -> AppResult<Page<ModuleWithProgress>> {
        if self.store.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }
        ensure_course_access(self.store, &caller, course_id).await?;

        let (modules, total) = self
            .store
            .list_modules_with_progress(course_id, caller.id, page)
            .await?;

        Ok(Page::new(modules, page, total))
    }

    /// A single module with the caller's completion flag.
    #[instrument(skip(self))]
    pub async fn get_module(&self, caller: Caller, module_id: Uuid) -> AppResult<ModuleWithProgress> {
        let module = self
            .store
            .find_module(module_id)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

        ensure_course_access(self.store, &caller, module.course_id).await?;

        let is_completed = self
            .store
            .find_progress(caller.id, module.id)
            .await?
            .is_some_and(|p| p.is_completed);

        Ok(ModuleWithProgress {
            module,
            is_completed,
        })
    }
}
