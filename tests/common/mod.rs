// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use coursehub::{
    config::Config,
    routes,
    services::AuthService,
    state::AppState,
    store::{MemoryStore, Store},
    utils::storage::{FileStorage, LocalStorage},
};
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use tempfile::TempDir;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub upload_dir: TempDir,
}

/// Spawns the app on a random port, backed by an in-memory store and a
/// temporary upload directory. The admin account is already seeded.
pub async fn spawn_app() -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");

    let config = Config {
        database_url: String::new(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        port,
        base_url: address.clone(),
        upload_dir: upload_dir.path().to_string_lossy().into_owned(),
        max_upload_bytes: 10 * 1024 * 1024,
        allowed_origins: vec![address.clone()],
        admin_username: ADMIN_USERNAME.to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        object_storage: None,
    };

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    AuthService::new(store.as_ref(), &config)
        .ensure_admin()
        .await
        .expect("Failed to seed admin");

    let files: Arc<dyn FileStorage> =
        Arc::new(LocalStorage::new(upload_dir.path(), &config.base_url));
    let state = AppState::with_files(store, config, files);
    let app = routes::create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        client: reqwest::Client::new(),
        upload_dir,
    }
}

pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, identifier: &str, password: &str) -> String {
        let body: Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        body["data"]["token"]
            .as_str()
            .expect("Token not found")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    /// Registers a user and returns `(id, token)`.
    pub async fn register_user(&self, username: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "first_name": "Test",
                "last_name": "User",
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
                "confirm_password": PASSWORD,
            }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        let id = body["data"]["id"].as_str().unwrap().to_string();
        let token = self.login(username, PASSWORD).await;
        (id, token)
    }

    pub async fn top_up(&self, admin_token: &str, user_id: &str, amount: f64) -> Value {
        let response = self
            .client
            .post(self.url(&format!("/api/users/{}/balance", user_id)))
            .bearer_auth(admin_token)
            .json(&json!({ "increment": amount }))
            .send()
            .await
            .expect("Top up failed");
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    /// Creates a course through the multipart endpoint and returns its id.
    pub async fn create_course(
        &self,
        admin_token: &str,
        title: &str,
        price: &str,
        topics: &[&str],
    ) -> String {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("<p>{}</p>", title))
            .text("instructor", "Ferris".to_string())
            .text("price", price.to_string())
            .text("topics", serde_json::to_string(topics).unwrap());

        let response = self
            .client
            .post(self.url("/api/courses"))
            .bearer_auth(admin_token)
            .multipart(form)
            .send()
            .await
            .expect("Create course failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a module with a small PDF attachment and returns its id.
    pub async fn create_module(&self, admin_token: &str, course_id: &str, title: &str) -> String {
        let pdf = Part::bytes(b"%PDF-1.4 lesson".to_vec())
            .file_name(format!("{}.pdf", title))
            .mime_str("application/pdf")
            .unwrap();
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("{} lesson", title))
            .part("pdf_content", pdf);

        let response = self
            .client
            .post(self.url(&format!("/api/courses/{}/modules", course_id)))
            .bearer_auth(admin_token)
            .multipart(form)
            .send()
            .await
            .expect("Create module failed");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    pub async fn get_json(&self, token: &str, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Request failed");
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}
