// src/utils/storage.rs

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, aws::AmazonS3Builder,
    path::Path as ObjectPath,
};
use url::Url;

use crate::{
    config::{Config, ObjectStorageConfig},
    error::{AppError, AppResult},
};

/// Where an uploaded file belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadCategory {
    Thumbnail,
    Pdf,
    Video,
}

impl UploadCategory {
    fn prefix(self) -> &'static str {
        match self {
            UploadCategory::Thumbnail => "courses/thumbnails",
            UploadCategory::Pdf => "modules/pdfs",
            UploadCategory::Video => "modules/videos",
        }
    }
}

/// Storage key for an upload: `<prefix>/<unix millis>-<sanitized name>`.
pub fn upload_key(category: UploadCategory, file_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = if name.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        name
    };

    format!("{}/{}-{}", category.prefix(), millis, name)
}

/// Binary asset storage (thumbnails, module media, certificates).
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `bytes` at `key`, overwriting, and returns the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>)
    -> AppResult<String>;

    /// Best-effort removal by public URL or key. Failures are logged only.
    async fn delete(&self, reference: &str);

    async fn delete_all(&self, references: &[String]) {
        for reference in references {
            self.delete(reference).await;
        }
    }
}

/// Rejects keys that would escape the storage root.
fn safe_relative(key: &str) -> Option<PathBuf> {
    let path = Path::new(key);
    if key.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(path.to_path_buf())
}

/// Files on local disk below `root`, served by the app under `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base: format!("{}/uploads", base_url.trim_end_matches('/')),
        }
    }

    /// Maps a public URL or a bare key back to a key below `root`.
    fn key_of(&self, reference: &str) -> Option<String> {
        let path = match Url::parse(reference) {
            Ok(url) => url.path().to_string(),
            Err(_) => reference.to_string(),
        };
        let path = path.trim_start_matches('/');
        let key = path.strip_prefix("uploads/").unwrap_or(path);
        Some(key.to_string()).filter(|k| !k.is_empty())
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> AppResult<String> {
        let relative =
            safe_relative(key).ok_or(AppError::BadRequest("Invalid file name".to_string()))?;
        let path = self.root.join(relative);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("Failed to save file {}: {:?}", path.display(), e);
            AppError::InternalServerError("Failed to save file".to_string())
        })?;

        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete(&self, reference: &str) {
        let Some(relative) = self.key_of(reference).as_deref().and_then(safe_relative) else {
            tracing::warn!("Refusing to delete unrecognized file reference {}", reference);
            return;
        };
        let path = self.root.join(relative);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Deleted file: {}", path.display()),
            Err(e) => tracing::warn!("Failed to delete file {}: {}", path.display(), e),
        }
    }
}

/// S3-compatible bucket. Uploads that fail fall back to local disk.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    public_url: String,
    fallback: LocalStorage,
}

impl ObjectStorage {
    pub fn new(config: &ObjectStorageConfig, fallback: LocalStorage) -> AppResult<Self> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_virtual_hosted_style_request(false);

        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder.build()?;
        tracing::info!("Initialized object storage with bucket: {}", config.bucket);

        Ok(Self {
            store: Arc::new(store),
            public_url: config.public_url.clone(),
            fallback,
        })
    }
}

#[async_trait]
impl FileStorage for ObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> AppResult<String> {
        let mut attributes = Attributes::new();
        if let Some(content_type) = content_type {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        match self
            .store
            .put_opts(&ObjectPath::from(key), PutPayload::from(bytes.clone()), options)
            .await
        {
            Ok(_) => {
                tracing::info!("Uploaded {} to object storage", key);
                Ok(format!("{}/{}", self.public_url, key))
            }
            Err(e) => {
                tracing::warn!(
                    "Object storage upload of {} failed, using local disk: {}",
                    key,
                    e
                );
                self.fallback.put(key, bytes, content_type).await
            }
        }
    }

    async fn delete(&self, reference: &str) {
        let Some(key) = reference
            .strip_prefix(&self.public_url)
            .map(|k| k.trim_start_matches('/'))
        else {
            // Not one of ours: it was written by the local fallback.
            self.fallback.delete(reference).await;
            return;
        };

        match self.store.delete(&ObjectPath::from(key)).await {
            Ok(()) => tracing::info!("Deleted {} from object storage", key),
            Err(e) => tracing::warn!("Failed to delete {} from object storage: {}", key, e),
        }
    }
}

/// Object storage when configured and constructible, local disk otherwise.
pub fn storage_from_config(config: &Config) -> Arc<dyn FileStorage> {
    let local = LocalStorage::new(&config.upload_dir, &config.base_url);

    match &config.object_storage {
        Some(settings) => match ObjectStorage::new(settings, local.clone()) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                tracing::warn!("Object storage unavailable, using local disk: {:?}", e);
                Arc::new(local)
            }
        },
        None => Arc::new(local),
    }
}
