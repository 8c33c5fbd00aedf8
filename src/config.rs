// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Credentials and addressing for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct ObjectStorageConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Public base URL objects are served from (no trailing slash).
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    /// Public base URL of this server, used for locally stored files.
    pub base_url: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub admin_username: String,
    pub admin_email: String,
    pub admin_password: String,
    pub object_storage: Option<ObjectStorageConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let max_upload_bytes = upload_limit_bytes(env::var("MAX_UPLOAD_MB").ok().as_deref());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            base_url,
            upload_dir,
            max_upload_bytes,
            allowed_origins,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            object_storage: ObjectStorageConfig::from_env(),
        }
    }
}

/// `MAX_UPLOAD_MB` in bytes, 100 MB when unset or invalid.
fn upload_limit_bytes(megabytes: Option<&str>) -> usize {
    megabytes
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(100)
        .saturating_mul(1024 * 1024)
}

impl ObjectStorageConfig {
    /// Returns `None` unless bucket, public URL and both keys are set.
    fn from_env() -> Option<Self> {
        let bucket = env::var("S3_BUCKET").ok().filter(|v| !v.is_empty())?;
        let public_url = env::var("S3_PUBLIC_URL").ok().filter(|v| !v.is_empty())?;
        let access_key_id = env::var("S3_ACCESS_KEY_ID").ok().filter(|v| !v.is_empty())?;
        let secret_access_key = env::var("S3_SECRET_ACCESS_KEY")
            .ok()
            .filter(|v| !v.is_empty())?;

        Some(Self {
            bucket,
            endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "auto".to_string()),
            access_key_id,
            secret_access_key,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limit_defaults_and_saturates() {
        assert_eq!(upload_limit_bytes(None), 100 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(Some("abc")), 100 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(Some("2")), 2 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(Some(&usize::MAX.to_string())), usize::MAX);
    }
}
