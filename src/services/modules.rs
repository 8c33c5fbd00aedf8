//! Admin module management and reordering.

use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::module::{Module, ModuleChanges, ModuleOrder, NewModule},
    store::Store,
    utils::{
        html::clean_html,
        multipart::UploadedFile,
        storage::{FileStorage, UploadCategory, upload_key},
    },
};

/// Optional PDF and video uploads sent with a module form.
#[derive(Debug, Default)]
pub struct ModuleMedia {
    pub pdf: Option<UploadedFile>,
    pub video: Option<UploadedFile>,
}

/// Public URLs of the stored media.
#[derive(Debug, Default)]
struct StoredMedia {
    pdf: Option<String>,
    video: Option<String>,
}

impl StoredMedia {
    fn urls(&self) -> Vec<String> {
        self.pdf.iter().chain(self.video.iter()).cloned().collect()
    }
}

pub struct ModuleService<'a> {
    store: &'a dyn Store,
    files: &'a dyn FileStorage,
}

impl<'a> ModuleService<'a> {
    pub fn new(store: &'a dyn Store, files: &'a dyn FileStorage) -> Self {
        Self { store, files }
    }

    async fn store_media(&self, media: ModuleMedia) -> AppResult<StoredMedia> {
        let mut stored = StoredMedia::default();

        if let Some(file) = media.pdf {
            let key = upload_key(UploadCategory::Pdf, &file.file_name);
            stored.pdf = Some(
                self.files
                    .put(&key, file.bytes, file.content_type.as_deref())
                    .await?,
            );
        }

        if let Some(file) = media.video {
            let key = upload_key(UploadCategory::Video, &file.file_name);
            match self
                .files
                .put(&key, file.bytes, file.content_type.as_deref())
                .await
            {
                Ok(url) => stored.video = Some(url),
                Err(e) => {
                    self.files.delete_all(&stored.urls()).await;
                    return Err(e);
                }
            }
        }

        Ok(stored)
    }

    /// Appends a module to a course: `order = max(order) + 1`.
    #[instrument(skip(self, module, media), fields(course_id = %module.course_id))]
    pub async fn create_module(&self, mut module: NewModule, media: ModuleMedia) -> AppResult<Module> {
        module.validate()?;

        if self.store.find_course(module.course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        module.description = clean_html(&module.description);
        let stored = self.store_media(media).await?;
        module.pdf_content = stored.pdf.clone();
        module.video_content = stored.video.clone();

        match self.store.insert_module(module).await {
            Ok(created) => {
                info!(module_id = %created.id, order = created.order, "Module created");
                Ok(created)
            }
            Err(e) => {
                self.files.delete_all(&stored.urls()).await;
                Err(e)
            }
        }
    }

    /// Partial update. Replaced media files are removed afterwards.
    #[instrument(skip(self, changes, media))]
    pub async fn update_module(
        &self,
        id: Uuid,
        mut changes: ModuleChanges,
        media: ModuleMedia,
    ) -> AppResult<Module> {
        changes.validate()?;

        let existing = self
            .store
            .find_module(id)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

        changes.description = changes.description.map(|d| clean_html(&d));
        let stored = self.store_media(media).await?;

        let mut replaced = Vec::new();
        if let Some(url) = stored.pdf {
            replaced.extend(existing.pdf_content);
            changes.pdf_content = Some(url);
        }
        if let Some(url) = stored.video {
            replaced.extend(existing.video_content);
            changes.video_content = Some(url);
        }

        let updated = self
            .store
            .update_module(id, changes)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

        self.files.delete_all(&replaced).await;
        Ok(updated)
    }

    /// Removes the module and its progress rows. Remaining orders keep their gaps.
    #[instrument(skip(self))]
    pub async fn delete_module(&self, id: Uuid) -> AppResult<()> {
        let module = self
            .store
            .find_module(id)
            .await?
            .ok_or(AppError::NotFound("Module not found".to_string()))?;

        if !self.store.delete_module(id).await? {
            return Err(AppError::NotFound("Module not found".to_string()));
        }

        self.files.delete_all(&module.media()).await;
        info!(module_id = %id, "Module deleted");
        Ok(())
    }

    /// Assigns new order values to modules of a course.
    ///
    /// Every id must belong to the course, otherwise nothing is written.
    /// Orders are taken as given: gaps and duplicates are not rejected.
    #[instrument(skip(self, order), fields(entries = order.len()))]
    pub async fn reorder_modules(&self, course_id: Uuid, order: &[ModuleOrder]) -> AppResult<()> {
        if self.store.find_course(course_id).await?.is_none() {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let ids: Vec<Uuid> = order.iter().map(|entry| entry.id).collect();
        let matched = self.store.count_modules_in_course(course_id, &ids).await?;
        if matched != ids.len() as i64 {
            return Err(AppError::BadRequest(
                "One or more modules do not belong to this course".to_string(),
            ));
        }

        self.store.apply_module_order(course_id, order).await?;
        info!(course_id = %course_id, "Modules reordered");
        Ok(())
    }
}
