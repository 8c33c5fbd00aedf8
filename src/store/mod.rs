//! Repository ports for the identity, catalog, ownership and progress stores.
//!
//! Services depend on these traits only. `PgStore` backs them with
//! PostgreSQL; `MemoryStore` keeps everything in process with the same
//! semantics. The HTTP tests run against `MemoryStore`, the tests in
//! `tests/postgres_tests.rs` exercise `PgStore` when `DATABASE_URL` is set.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        course::{Course, CourseChanges, CourseSummary, NewCourse, OwnedCourseRecord},
        enrollment::{Ownership, Progress, Purchase},
        module::{Module, ModuleChanges, ModuleOrder, ModuleWithProgress, NewModule},
        money::Money,
        pagination::PageRequest,
        user::{NewUser, User, UserChanges},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Finds a user whose username or email equals `identifier`.
    async fn find_user_by_identifier(&self, identifier: &str) -> AppResult<Option<User>>;

    /// True if another user (not `except`) already has this username.
    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool>;

    /// True if another user (not `except`) already has this email.
    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool>;

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>>;

    /// Adds `amount` to the balance and returns the updated user.
    async fn add_balance(&self, id: Uuid, amount: Money) -> AppResult<Option<User>>;

    /// Deletes the user along with their progress and ownership records.
    async fn delete_user(&self, id: Uuid) -> AppResult<bool>;

    /// Non-admin users matching `search` on username, names or email,
    /// ordered by first name. Returns the page and the total match count.
    async fn list_users(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn insert_course(&self, course: NewCourse) -> AppResult<Course>;

    async fn find_course(&self, id: Uuid) -> AppResult<Option<Course>>;

    async fn course_summary(&self, id: Uuid) -> AppResult<Option<CourseSummary>>;

    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> AppResult<Option<Course>>;

    /// Removes progress, ownership, modules, topics and finally the course.
    async fn delete_course_cascade(&self, id: Uuid) -> AppResult<bool>;

    /// Ids of courses whose title or instructor contains `term` (case-insensitive).
    async fn course_ids_matching_fields(&self, term: &str) -> AppResult<Vec<Uuid>>;

    /// Ids of courses with a topic containing `term` (case-insensitive).
    async fn course_ids_matching_topics(&self, term: &str) -> AppResult<Vec<Uuid>>;

    /// Newest-first listing, restricted to `only` when given.
    async fn list_courses(
        &self,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<CourseSummary>, i64)>;

    /// Courses owned by `user_id`, most recent purchase first.
    async fn list_owned_courses(
        &self,
        user_id: Uuid,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<OwnedCourseRecord>, i64)>;
}

#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Inserts with `order = max(order in course) + 1`.
    async fn insert_module(&self, module: NewModule) -> AppResult<Module>;

    async fn find_module(&self, id: Uuid) -> AppResult<Option<Module>>;

    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> AppResult<Option<Module>>;

    /// Deletes progress rows for the module, then the module.
    async fn delete_module(&self, id: Uuid) -> AppResult<bool>;

    /// All modules of a course in ascending order.
    async fn course_modules(&self, course_id: Uuid) -> AppResult<Vec<Module>>;

    async fn count_course_modules(&self, course_id: Uuid) -> AppResult<i64>;

    /// How many distinct ids of `ids` are modules of `course_id`.
    async fn count_modules_in_course(&self, course_id: Uuid, ids: &[Uuid]) -> AppResult<i64>;

    /// Writes every `(id, order)` pair in a single unit of work.
    async fn apply_module_order(&self, course_id: Uuid, order: &[ModuleOrder]) -> AppResult<()>;

    /// Modules of a course in ascending order with `user_id`'s completion flag.
    async fn list_modules_with_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<ModuleWithProgress>, i64)>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    async fn find_ownership(&self, user_id: Uuid, course_id: Uuid)
    -> AppResult<Option<Ownership>>;

    /// Debits `price` and records ownership in one unit of work.
    /// Fails with `InsufficientBalance` or `AlreadyOwned` if the state
    /// changed since the caller's checks.
    async fn purchase_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        price: Money,
    ) -> AppResult<Purchase>;

    async fn count_owned_courses(&self, user_id: Uuid) -> AppResult<i64>;

    async fn find_progress(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Option<Progress>>;

    /// Upserts the progress row to completed. An already completed row is
    /// returned unchanged, keeping its original `completed_at`.
    async fn mark_module_completed(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Progress>;

    /// Completed progress rows of `user_id` joined to modules of `course_id`.
    async fn count_completed_modules(&self, user_id: Uuid, course_id: Uuid) -> AppResult<i64>;
}

/// Every repository the services need, behind one object.
pub trait Store: UserRepository + CourseRepository + ModuleRepository + EnrollmentRepository {}

impl<T> Store for T where
    T: UserRepository + CourseRepository + ModuleRepository + EnrollmentRepository
{
}
