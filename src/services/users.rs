//! Admin user management.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        money::Money,
        pagination::{ListParams, Page},
        user::{
            Role, UpdateUserRequest, User, UserBalanceResponse, UserChanges, UserDetailResponse,
            UserResponse,
        },
    },
    store::Store,
    utils::hash::hash_password,
};

pub struct UserService<'a> {
    store: &'a dyn Store,
}

impl<'a> UserService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    async fn find(&self, id: Uuid) -> AppResult<User> {
        self.store
            .find_user(id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))
    }

    /// Finds a user that admins may modify.
    async fn find_manageable(&self, id: Uuid) -> AppResult<User> {
        let user = self.find(id).await?;
        if user.role() == Role::Admin {
            return Err(AppError::Forbidden(
                "Admin accounts cannot be modified".to_string(),
            ));
        }
        Ok(user)
    }

    /// Non-admin users, ordered by first name.
    #[instrument(skip(self))]
    pub async fn list_users(&self, params: &ListParams) -> AppResult<Page<UserResponse>> {
        let page = params.page_request();
        let (users, total) = self.store.list_users(params.query(), page).await?;
        Ok(Page::new(users, page, total).map(UserResponse::from))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> AppResult<UserDetailResponse> {
        let user = self.find(id).await?;
        let courses_purchased = self.store.count_owned_courses(user.id).await?;

        Ok(UserDetailResponse {
            user: UserResponse::from(user),
            courses_purchased,
        })
    }

    #[instrument(skip(self))]
    pub async fn increment_balance(
        &self,
        id: Uuid,
        increment: Money,
    ) -> AppResult<UserBalanceResponse> {
        if increment < Money::from_cents(1) {
            return Err(AppError::BadRequest(
                "Increment must be at least 0.01".to_string(),
            ));
        }

        let user = self
            .store
            .add_balance(id, increment)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        info!(user_id = %user.id, increment = %increment, balance = %user.balance, "Balance incremented");

        Ok(UserBalanceResponse {
            id: user.id,
            username: user.username,
            balance: user.balance,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_user(&self, id: Uuid, request: UpdateUserRequest) -> AppResult<UserResponse> {
        let user = self.find_manageable(id).await?;

        if self.store.email_taken(&request.email, Some(user.id)).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if self
            .store
            .username_taken(&request.username, Some(user.id))
            .await?
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = match request.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let updated = self
            .store
            .update_user(
                user.id,
                UserChanges {
                    username: request.username,
                    email: request.email,
                    first_name: request.first_name,
                    last_name: request.last_name,
                    password_hash,
                },
            )
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(updated))
    }

    /// Deletes a non-admin user with their ownership and progress records.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let user = self.find_manageable(id).await?;

        if !self.store.delete_user(user.id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::testing::{seed_admin, seed_user},
        store::MemoryStore,
    };

    fn update(username: &str, email: &str) -> UpdateUserRequest {
        UpdateUserRequest {
            email: email.into(),
            username: username.into(),
            first_name: "New".into(),
            last_name: "Name".into(),
            password: None,
        }
    }

    #[tokio::test]
    async fn balance_increments_are_additive() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "hana", Money::from_cents(1_000)).await;
        let service = UserService::new(&store);

        service
            .increment_balance(user.id, Money::from_cents(250))
            .await
            .unwrap();
        let result = service
            .increment_balance(user.id, Money::from_cents(1))
            .await
            .unwrap();

        assert_eq!(result.balance, Money::from_cents(1_251));
        assert!(matches!(
            service.increment_balance(user.id, Money::ZERO).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn admins_are_hidden_and_protected() {
        let store = MemoryStore::new();
        let admin = seed_admin(&store, "root").await;
        seed_user(&store, "zoe", Money::ZERO).await;
        seed_user(&store, "adam", Money::ZERO).await;
        let service = UserService::new(&store);

        let page = service.list_users(&ListParams::default()).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["adam", "zoe"]);

        assert!(matches!(
            service.delete_user(admin.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.update_user(admin.id, update("root", "root@example.com")).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_identity_is_a_conflict() {
        let store = MemoryStore::new();
        let ivan = seed_user(&store, "ivan", Money::ZERO).await;
        seed_user(&store, "jade", Money::ZERO).await;
        let service = UserService::new(&store);

        assert!(matches!(
            service
                .update_user(ivan.id, update("ivan", "jade@example.com"))
                .await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service
                .update_user(ivan.id, update("jade", "ivan@example.com"))
                .await,
            Err(AppError::Conflict(_))
        ));

        let updated = service
            .update_user(ivan.id, update("ivan2", "ivan@example.com"))
            .await
            .unwrap();
        assert_eq!(updated.username, "ivan2");
        assert_eq!(updated.first_name, "New");
    }

    #[tokio::test]
    async fn detail_counts_purchases_and_delete_removes() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "kim", Money::ZERO).await;
        let service = UserService::new(&store);

        let detail = service.get_user(user.id).await.unwrap();
        assert_eq!(detail.courses_purchased, 0);

        service.delete_user(user.id).await.unwrap();
        assert!(matches!(
            service.get_user(user.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
