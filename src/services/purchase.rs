//! Purchase engine: balance check, debit and ownership record.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::course::PurchaseResponse,
    store::Store,
};

pub struct PurchaseService<'a> {
    store: &'a dyn Store,
}

impl<'a> PurchaseService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Buys a course for a user.
    ///
    /// Checks run in a fixed order, each failing with its own error: the
    /// course exists, the user exists, the user does not own it yet, the
    /// balance covers the price. The debit and the ownership record are then
    /// written as one unit; the store re-checks both conditions there.
    #[instrument(skip(self))]
    pub async fn buy_course(&self, user_id: Uuid, course_id: Uuid) -> AppResult<PurchaseResponse> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        if self.store.find_ownership(user.id, course.id).await?.is_some() {
            return Err(AppError::AlreadyOwned);
        }

        if user.balance < course.price {
            return Err(AppError::InsufficientBalance);
        }

        let purchase = self
            .store
            .purchase_course(user.id, course.id, course.price)
            .await?;

        info!(
            user_id = %user.id,
            course_id = %course.id,
            transaction_id = %purchase.ownership.transaction_id,
            "Course purchased"
        );

        Ok(PurchaseResponse {
            course_id: course.id,
            user_balance: purchase.balance,
            transaction_id: purchase.ownership.transaction_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::money::Money,
        services::testing::{seed_course, seed_user},
        store::{MemoryStore, UserRepository},
    };

    #[tokio::test]
    async fn second_purchase_is_rejected_and_debits_once() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice", Money::from_cents(10_000)).await;
        let course = seed_course(&store, "Rust", Money::from_cents(2_500)).await;
        let service = PurchaseService::new(&store);

        let first = service.buy_course(user.id, course.id).await.unwrap();
        assert_eq!(first.user_balance, Money::from_cents(7_500));
        assert_eq!(first.course_id, course.id);

        let second = service.buy_course(user.id, course.id).await;
        assert!(matches!(second, Err(AppError::AlreadyOwned)));

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, Money::from_cents(7_500));
    }

    #[tokio::test]
    async fn exact_balance_succeeds_and_leaves_zero() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "bob", Money::from_cents(4_999)).await;
        let course = seed_course(&store, "Go", Money::from_cents(4_999)).await;

        let purchase = PurchaseService::new(&store)
            .buy_course(user.id, course.id)
            .await
            .unwrap();

        assert_eq!(purchase.user_balance, Money::ZERO);
    }

    #[tokio::test]
    async fn insufficient_balance_leaves_balance_untouched() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "carol", Money::from_cents(5_000)).await;
        let course = seed_course(&store, "Expensive", Money::from_cents(9_999)).await;

        let result = PurchaseService::new(&store)
            .buy_course(user.id, course.id)
            .await;
        assert!(matches!(result, Err(AppError::InsufficientBalance)));

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.balance, Money::from_cents(5_000));
    }

    #[tokio::test]
    async fn missing_course_is_reported_before_missing_user() {
        let store = MemoryStore::new();
        let service = PurchaseService::new(&store);

        let result = service.buy_course(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "Course not found"));

        let course = seed_course(&store, "Rust", Money::ZERO).await;
        let result = service.buy_course(Uuid::new_v4(), course.id).await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "User not found"));
    }
}
