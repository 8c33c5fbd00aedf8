//! Course listings, search and admin course management.

use std::collections::HashSet;

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        course::{CourseChanges, CourseSummary, MyCourse, NewCourse},
        enrollment::progress_percentage,
        pagination::{ListParams, Page},
    },
    store::Store,
    utils::{
        html::clean_html,
        multipart::UploadedFile,
        storage::{FileStorage, UploadCategory, upload_key},
    },
};

/// Which courses a listing may return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// No search term.
    Unfiltered,
    /// Ids matched by title, instructor or topic.
    Matching(Vec<Uuid>),
    /// A search term that matched nothing.
    NoMatches,
}

impl SearchFilter {
    fn ids(&self) -> Option<&[Uuid]> {
        match self {
            SearchFilter::Matching(ids) => Some(ids),
            _ => None,
        }
    }
}

pub struct CatalogService<'a> {
    store: &'a dyn Store,
    files: &'a dyn FileStorage,
}

impl<'a> CatalogService<'a> {
    pub fn new(store: &'a dyn Store, files: &'a dyn FileStorage) -> Self {
        Self { store, files }
    }

    /// Union of the course-field and topic matches for `q`.
    pub async fn search_filter(&self, q: Option<&str>) -> AppResult<SearchFilter> {
        let Some(term) = q else {
            return Ok(SearchFilter::Unfiltered);
        };

        let by_fields = self.store.course_ids_matching_fields(term).await?;
        let by_topics = self.store.course_ids_matching_topics(term).await?;

        let mut seen = HashSet::new();
        let ids: Vec<Uuid> = by_fields
            .into_iter()
            .chain(by_topics)
            .filter(|id| seen.insert(*id))
            .collect();

        if ids.is_empty() {
            Ok(SearchFilter::NoMatches)
        } else {
            Ok(SearchFilter::Matching(ids))
        }
    }

    /// Newest-first course listing.
    ///
    /// A search that matches nothing returns an empty page without running
    /// the listing query.
    #[instrument(skip(self))]
    pub async fn list_courses(&self, params: &ListParams) -> AppResult<Page<CourseSummary>> {
        let page = params.page_request();
        let filter = self.search_filter(params.query()).await?;
        if filter == SearchFilter::NoMatches {
            return Ok(Page::empty(page));
        }

        let (courses, total) = self.store.list_courses(filter.ids(), page).await?;
        Ok(Page::new(courses, page, total))
    }

    /// The caller's owned courses, most recently purchased first.
    #[instrument(skip(self))]
    pub async fn list_my_courses(
        &self,
        user_id: Uuid,
        params: &ListParams,
    ) -> AppResult<Page<MyCourse>> {
        let page = params.page_request();
        let filter = self.search_filter(params.query()).await?;
        if filter == SearchFilter::NoMatches {
            return Ok(Page::empty(page));
        }

        let (records, total) = self
            .store
            .list_owned_courses(user_id, filter.ids(), page)
            .await?;

        Ok(Page::new(records, page, total).map(|r| MyCourse {
            progress_percentage: progress_percentage(r.total_modules, r.completed_modules),
            id: r.id,
            title: r.title,
            instructor: r.instructor,
            topics: r.topics,
            thumbnail_image: r.thumbnail_image,
            purchased_at: r.purchased_at,
        }))
    }

    pub async fn get_course(&self, id: Uuid) -> AppResult<CourseSummary> {
        self.store
            .course_summary(id)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))
    }

    async fn upload_thumbnail(&self, file: UploadedFile) -> AppResult<String> {
        let key = upload_key(UploadCategory::Thumbnail, &file.file_name);
        self.files
            .put(&key, file.bytes, file.content_type.as_deref())
            .await
    }

    #[instrument(skip(self, course, thumbnail), fields(title = %course.title))]
    pub async fn create_course(
        &self,
        mut course: NewCourse,
        thumbnail: Option<UploadedFile>,
    ) -> AppResult<CourseSummary> {
        course.validate()?;
        course.description = clean_html(&course.description);

        if let Some(file) = thumbnail {
            course.thumbnail_image = Some(self.upload_thumbnail(file).await?);
        }
        let uploaded = course.thumbnail_image.clone();

        let created = match self.store.insert_course(course).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(url) = uploaded {
                    self.files.delete(&url).await;
                }
                return Err(e);
            }
        };

        info!(course_id = %created.id, "Course created");
        self.get_course(created.id).await
    }

    /// Applies a partial update. A new thumbnail replaces the old file.
    #[instrument(skip(self, changes, thumbnail))]
    pub async fn update_course(
        &self,
        id: Uuid,
        mut changes: CourseChanges,
        thumbnail: Option<UploadedFile>,
    ) -> AppResult<CourseSummary> {
        changes.validate()?;

        let existing = self
            .store
            .find_course(id)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        changes.description = changes.description.map(|d| clean_html(&d));
        if let Some(file) = thumbnail {
            changes.thumbnail_image = Some(self.upload_thumbnail(file).await?);
        }
        let replaced_thumbnail = changes.thumbnail_image.is_some();

        self.store
            .update_course(id, changes)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        if replaced_thumbnail {
            if let Some(old) = existing.thumbnail_image {
                self.files.delete(&old).await;
            }
        }

        self.get_course(id).await
    }

    /// Deletes the course and everything hanging off it, then its files.
    #[instrument(skip(self))]
    pub async fn delete_course(&self, id: Uuid) -> AppResult<()> {
        let course = self
            .store
            .find_course(id)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        let mut media: Vec<String> = self
            .store
            .course_modules(id)
            .await?
            .iter()
            .flat_map(|m| m.media())
            .collect();
        media.extend(course.thumbnail_image);

        if !self.store.delete_course_cascade(id).await? {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        self.files.delete_all(&media).await;
        info!(course_id = %id, files = media.len(), "Course deleted");
        Ok(())
    }
}
