//! Registration, login and the startup admin bootstrap.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::user::{
        LoginRequest, LoginResponse, NewUser, RegisterRequest, RegisterResponse, Role,
        UserResponse,
    },
    store::Store,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

pub struct AuthService<'a> {
    store: &'a dyn Store,
    config: &'a Config,
}

impl<'a> AuthService<'a> {
    pub fn new(store: &'a dyn Store, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Creates a `user` account with a zero balance.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        if request.password != request.confirm_password {
            return Err(AppError::BadRequest("Passwords do not match".to_string()));
        }
        if self.store.email_taken(&request.email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if self.store.username_taken(&request.username, None).await? {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                request.username
            )));
        }

        let user = self
            .store
            .insert_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash: hash_password(&request.password)?,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::User,
            })
            .await?;

        info!(user_id = %user.id, "User registered");

        Ok(RegisterResponse {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        })
    }

    /// Verifies a username-or-email and password and issues a bearer token.
    #[instrument(skip(self, request), fields(identifier = %request.identifier))]
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let invalid = || AppError::AuthError("Invalid credentials".to_string());

        let user = self
            .store
            .find_user_by_identifier(&request.identifier)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &user.password)? {
            return Err(invalid());
        }

        let token = sign_jwt(
            user.id,
            &user.username,
            user.role(),
            &self.config.jwt_secret,
            self.config.jwt_expiration,
        )?;

        Ok(LoginResponse {
            username: user.username,
            token,
        })
    }

    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserResponse> {
        self.store
            .find_user(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    /// Creates the configured admin account unless its username or email
    /// is already present. Safe to run on every start.
    pub async fn ensure_admin(&self) -> AppResult<()> {
        let config = self.config;

        if self.store.username_taken(&config.admin_username, None).await?
            || self.store.email_taken(&config.admin_email, None).await?
        {
            tracing::debug!("Admin user already exists, skipping bootstrap");
            return Ok(());
        }

        let admin = self
            .store
            .insert_user(NewUser {
                username: config.admin_username.clone(),
                email: config.admin_email.clone(),
                password_hash: hash_password(&config.admin_password)?,
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
                role: Role::Admin,
            })
            .await?;

        info!(user_id = %admin.id, "Admin user '{}' created", admin.username);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        jwt_expiration: 3600,
        rust_log: "info".to_string(),
        port: 0,
        base_url: "http://localhost".to_string(),
        upload_dir: "uploads".to_string(),
        max_upload_bytes: 1024 * 1024,
        allowed_origins: vec![],
        admin_username: "admin".to_string(),
        admin_email: "admin@example.com".to_string(),
        admin_password: "admin123".to_string(),
        object_storage: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::{MemoryStore, UserRepository},
        utils::jwt::verify_jwt,
    };

    fn registration(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: "Lena".into(),
            last_name: "Park".into(),
            username: username.into(),
            email: email.into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_by_username_or_email() {
        let store = MemoryStore::new();
        let config = test_config();
        let service = AuthService::new(&store, &config);

        let registered = service
            .register(registration("lena", "lena@example.com"))
            .await
            .unwrap();

        for identifier in ["lena", "lena@example.com"] {
            let login = service
                .login(LoginRequest {
                    identifier: identifier.into(),
                    password: "secret1".into(),
                })
                .await
                .unwrap();
            let claims = verify_jwt(&login.token, &config.jwt_secret).unwrap();
            assert_eq!(claims.user_id().unwrap(), registered.id);
            assert_eq!(claims.role(), Role::User);
        }

        let wrong = service
            .login(LoginRequest {
                identifier: "lena".into(),
                password: "nope".into(),
            })
            .await;
        assert!(matches!(wrong, Err(AppError::AuthError(msg)) if msg == "Invalid credentials"));
    }

    #[tokio::test]
    async fn register_rejects_mismatch_and_duplicates() {
        let store = MemoryStore::new();
        let config = test_config();
        let service = AuthService::new(&store, &config);

        let mut mismatched = registration("mo", "mo@example.com");
        mismatched.confirm_password = "different".into();
        assert!(matches!(
            service.register(mismatched).await,
            Err(AppError::BadRequest(msg)) if msg == "Passwords do not match"
        ));

        service
            .register(registration("mo", "mo@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            service.register(registration("mo", "other@example.com")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.register(registration("other", "mo@example.com")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn admin_bootstrap_is_idempotent() {
        let store = MemoryStore::new();
        let config = test_config();
        let service = AuthService::new(&store, &config);

        service.ensure_admin().await.unwrap();
        service.ensure_admin().await.unwrap();

        let admin = store
            .find_user_by_identifier("admin")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role(), Role::Admin);
        let (users, _) = store
            .list_users(None, Default::default())
            .await
            .unwrap();
        assert!(users.is_empty());
    }
}
