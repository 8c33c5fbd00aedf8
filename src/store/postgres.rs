// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{CourseRepository, EnrollmentRepository, ModuleRepository, UserRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        course::{Course, CourseChanges, CourseSummary, NewCourse, OwnedCourseRecord},
        enrollment::{Ownership, Progress, Purchase},
        module::{Module, ModuleChanges, ModuleOrder, ModuleWithProgress, NewModule},
        money::Money,
        pagination::PageRequest,
        user::{NewUser, Role, User, UserChanges},
    },
};

const USER_COLUMNS: &str =
    "id, username, email, password, first_name, last_name, role, balance, created_at";

const COURSE_COLUMNS: &str =
    "id, title, description, instructor, price, thumbnail_image, created_at, updated_at";

const MODULE_COLUMNS: &str = "id, course_id, title, description, module_order, pdf_content, video_content, created_at, updated_at";

const COURSE_SUMMARY_SELECT: &str = r#"
    SELECT
        c.id, c.title, c.description, c.instructor, c.price,
        c.thumbnail_image, c.created_at, c.updated_at,
        ARRAY(SELECT t.topic FROM course_topics t WHERE t.course_id = c.id ORDER BY t.id) AS topics,
        (SELECT COUNT(*) FROM modules m WHERE m.course_id = c.id) AS total_modules
    FROM courses c
"#;

const OWNERSHIP_UNIQUE_KEY: &str = "user_courses_user_course_key";
const USERNAME_UNIQUE_KEY: &str = "users_username_key";

/// PostgreSQL implementation of every repository port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Name of the violated unique constraint, if `err` is one.
fn unique_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.is_unique_violation() {
        Some(db_err.constraint().unwrap_or_default().to_string())
    } else {
        None
    }
}

/// `ILIKE` pattern matching `term` as a plain substring.
fn search_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// True when a `NUMERIC(12, 2)` column would overflow.
fn numeric_overflow(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| code == "22003")
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $1 ORDER BY created_at LIMIT 1",
            USER_COLUMNS
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND ($2::UUID IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::UUID IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken)
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let inserted = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(key) if key == USERNAME_UNIQUE_KEY => {
                AppError::Conflict(format!("Username '{}' already exists", user.username))
            }
            _ => AppError::from(e),
        })?;

        Ok(inserted)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = $2, email = $3, first_name = $4, last_name = $5,
                password = COALESCE($6, password)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(key) if key == USERNAME_UNIQUE_KEY => {
                AppError::Conflict("Username already exists".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(updated)
    }

    async fn add_balance(&self, id: Uuid, amount: Money) -> AppResult<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET balance = balance + $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if numeric_overflow(&e) {
                AppError::BadRequest("Balance overflow".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(updated)
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_module_progress WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM user_courses WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)> {
        let pattern = search.map(search_pattern);

        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE role = $1
              AND ($2::TEXT IS NULL
                   OR username ILIKE $2 ESCAPE '\' OR first_name ILIKE $2 ESCAPE '\'
                   OR last_name ILIKE $2 ESCAPE '\' OR email ILIKE $2 ESCAPE '\')
            ORDER BY first_name ASC, id
            LIMIT $3 OFFSET $4
            "#,
            USER_COLUMNS
        ))
        .bind(Role::User.as_str())
        .bind(&pattern)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE role = $1
              AND ($2::TEXT IS NULL
                   OR username ILIKE $2 ESCAPE '\' OR first_name ILIKE $2 ESCAPE '\'
                   OR last_name ILIKE $2 ESCAPE '\' OR email ILIKE $2 ESCAPE '\')
            "#,
        )
        .bind(Role::User.as_str())
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((users, total))
    }
}

#[async_trait]
impl CourseRepository for PgStore {
    async fn insert_course(&self, course: NewCourse) -> AppResult<Course> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Course>(&format!(
            r#"
            INSERT INTO courses (id, title, description, instructor, price, thumbnail_image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.instructor)
        .bind(course.price)
        .bind(&course.thumbnail_image)
        .fetch_one(&mut *tx)
        .await?;

        for topic in &course.topics {
            sqlx::query("INSERT INTO course_topics (course_id, topic) VALUES ($1, $2)")
                .bind(inserted.id)
                .bind(topic)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    async fn find_course(&self, id: Uuid) -> AppResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(course)
    }

    async fn course_summary(&self, id: Uuid) -> AppResult<Option<CourseSummary>> {
        let summary =
            sqlx::query_as::<_, CourseSummary>(&format!("{} WHERE c.id = $1", COURSE_SUMMARY_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(summary)
    }

    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> AppResult<Option<Course>> {
        let mut tx = self.pool.begin().await?;

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE courses SET updated_at = NOW()");

        if let Some(title) = changes.title {
            builder.push(", title = ");
            builder.push_bind(title);
        }

        if let Some(description) = changes.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }

        if let Some(instructor) = changes.instructor {
            builder.push(", instructor = ");
            builder.push_bind(instructor);
        }

        if let Some(price) = changes.price {
            builder.push(", price = ");
            builder.push_bind(price);
        }

        if let Some(thumbnail) = changes.thumbnail_image {
            builder.push(", thumbnail_image = ");
            builder.push_bind(thumbnail);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(COURSE_COLUMNS);

        let updated = builder
            .build_query_as::<Course>()
            .fetch_optional(&mut *tx)
            .await?;

        if updated.is_none() {
            return Ok(None);
        }

        if let Some(topics) = changes.topics {
            sqlx::query("DELETE FROM course_topics WHERE course_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for topic in &topics {
                sqlx::query("INSERT INTO course_topics (course_id, topic) VALUES ($1, $2)")
                    .bind(id)
                    .bind(topic)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_course_cascade(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM user_module_progress
            WHERE module_id IN (SELECT id FROM modules WHERE course_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM user_courses WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM modules WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM course_topics WHERE course_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn course_ids_matching_fields(&self, term: &str) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT id FROM courses WHERE title ILIKE $1 ESCAPE '\' OR instructor ILIKE $1 ESCAPE '\'"#,
        )
        .bind(search_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn course_ids_matching_topics(&self, term: &str) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"SELECT DISTINCT course_id FROM course_topics WHERE topic ILIKE $1 ESCAPE '\'"#,
        )
        .bind(search_pattern(term))
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn list_courses(
        &self,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<CourseSummary>, i64)> {
        let only = only.map(<[Uuid]>::to_vec);

        let courses = sqlx::query_as::<_, CourseSummary>(&format!(
            r#"
            {}
            WHERE ($1::UUID[] IS NULL OR c.id = ANY($1))
            ORDER BY c.created_at DESC, c.id
            LIMIT $2 OFFSET $3
            "#,
            COURSE_SUMMARY_SELECT
        ))
        .bind(&only)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM courses c WHERE ($1::UUID[] IS NULL OR c.id = ANY($1))",
        )
        .bind(&only)
        .fetch_one(&self.pool)
        .await?;

        Ok((courses, total))
    }

    async fn list_owned_courses(
        &self,
        user_id: Uuid,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<OwnedCourseRecord>, i64)> {
        let only = only.map(<[Uuid]>::to_vec);

        let courses = sqlx::query_as::<_, OwnedCourseRecord>(
            r#"
            SELECT
                c.id, c.title, c.instructor, c.thumbnail_image,
                ARRAY(SELECT t.topic FROM course_topics t WHERE t.course_id = c.id ORDER BY t.id) AS topics,
                uc.transaction_id, uc.purchased_at,
                (SELECT COUNT(*) FROM modules m WHERE m.course_id = c.id) AS total_modules,
                (SELECT COUNT(*)
                   FROM user_module_progress p
                   JOIN modules m ON m.id = p.module_id
                  WHERE m.course_id = c.id AND p.user_id = uc.user_id AND p.is_completed) AS completed_modules
            FROM user_courses uc
            JOIN courses c ON c.id = uc.course_id
            WHERE uc.user_id = $1
              AND ($2::UUID[] IS NULL OR c.id = ANY($2))
            ORDER BY uc.purchased_at DESC, uc.transaction_id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(&only)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_courses uc
            WHERE uc.user_id = $1
              AND ($2::UUID[] IS NULL OR uc.course_id = ANY($2))
            "#,
        )
        .bind(user_id)
        .bind(&only)
        .fetch_one(&self.pool)
        .await?;

        Ok((courses, total))
    }
}

#[async_trait]
impl ModuleRepository for PgStore {
    async fn insert_module(&self, module: NewModule) -> AppResult<Module> {
        let mut tx = self.pool.begin().await?;

        // Serializes concurrent inserts into the same course.
        sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
            .bind(module.course_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Course not found".to_string()))?;

        let next_order = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(module_order), 0) + 1 FROM modules WHERE course_id = $1",
        )
        .bind(module.course_id)
        .fetch_one(&mut *tx)
        .await?;

        let inserted = sqlx::query_as::<_, Module>(&format!(
            r#"
            INSERT INTO modules (id, course_id, title, description, module_order, pdf_content, video_content)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MODULE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(module.course_id)
        .bind(&module.title)
        .bind(&module.description)
        .bind(next_order)
        .bind(&module.pdf_content)
        .bind(&module.video_content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted)
    }

    async fn find_module(&self, id: Uuid) -> AppResult<Option<Module>> {
        let module = sqlx::query_as::<_, Module>(&format!(
            "SELECT {} FROM modules WHERE id = $1",
            MODULE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(module)
    }

    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> AppResult<Option<Module>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE modules SET updated_at = NOW()");

        if let Some(title) = changes.title {
            builder.push(", title = ");
            builder.push_bind(title);
        }

        if let Some(description) = changes.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }

        if let Some(pdf) = changes.pdf_content {
            builder.push(", pdf_content = ");
            builder.push_bind(pdf);
        }

        if let Some(video) = changes.video_content {
            builder.push(", video_content = ");
            builder.push_bind(video);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" RETURNING ");
        builder.push(MODULE_COLUMNS);

        let updated = builder
            .build_query_as::<Module>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn delete_module(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_module_progress WHERE module_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    async fn course_modules(&self, course_id: Uuid) -> AppResult<Vec<Module>> {
        let modules = sqlx::query_as::<_, Module>(&format!(
            "SELECT {} FROM modules WHERE course_id = $1 ORDER BY module_order ASC, created_at ASC",
            MODULE_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(modules)
    }

    async fn count_course_modules(&self, course_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM modules WHERE course_id = $1")
            .bind(course_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_modules_in_course(&self, course_id: Uuid, ids: &[Uuid]) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM modules WHERE course_id = $1 AND id = ANY($2)",
        )
        .bind(course_id)
        .bind(ids.to_vec())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn apply_module_order(&self, course_id: Uuid, order: &[ModuleOrder]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for entry in order {
            sqlx::query(
                "UPDATE modules SET module_order = $1, updated_at = NOW() WHERE id = $2 AND course_id = $3",
            )
            .bind(entry.order)
            .bind(entry.id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_modules_with_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<ModuleWithProgress>, i64)> {
        let modules = sqlx::query_as::<_, ModuleWithProgress>(
            r#"
            SELECT
                m.id, m.course_id, m.title, m.description, m.module_order,
                m.pdf_content, m.video_content, m.created_at, m.updated_at,
                COALESCE(p.is_completed, FALSE) AS is_completed
            FROM modules m
            LEFT JOIN user_module_progress p ON p.module_id = m.id AND p.user_id = $2
            WHERE m.course_id = $1
            ORDER BY m.module_order ASC, m.created_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = self.count_course_modules(course_id).await?;

        Ok((modules, total))
    }
}

#[async_trait]
impl EnrollmentRepository for PgStore {
    async fn find_ownership(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Option<Ownership>> {
        let ownership = sqlx::query_as::<_, Ownership>(
            r#"
            SELECT transaction_id, user_id, course_id, purchased_at, completed_at
            FROM user_courses
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ownership)
    }

    async fn purchase_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        price: Money,
    ) -> AppResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let balance = sqlx::query_scalar::<_, Money>(
            r#"
            UPDATE users
            SET balance = balance - $2
            WHERE id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(price)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::InsufficientBalance)?;

        let ownership = sqlx::query_as::<_, Ownership>(
            r#"
            INSERT INTO user_courses (transaction_id, user_id, course_id)
            VALUES ($1, $2, $3)
            RETURNING transaction_id, user_id, course_id, purchased_at, completed_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(key) if key == OWNERSHIP_UNIQUE_KEY => AppError::AlreadyOwned,
            _ => AppError::from(e),
        })?;

        tx.commit().await?;

        Ok(Purchase { ownership, balance })
    }

    async fn count_owned_courses(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_courses WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find_progress(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Option<Progress>> {
        let progress = sqlx::query_as::<_, Progress>(
            r#"
            SELECT user_id, module_id, is_completed, completed_at
            FROM user_module_progress
            WHERE user_id = $1 AND module_id = $2
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }

    async fn mark_module_completed(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Progress> {
        let progress = sqlx::query_as::<_, Progress>(
            r#"
            INSERT INTO user_module_progress (user_id, module_id, is_completed, completed_at)
            VALUES ($1, $2, TRUE, NOW())
            ON CONFLICT (user_id, module_id) DO UPDATE
            SET is_completed = TRUE,
                completed_at = CASE
                    WHEN user_module_progress.is_completed THEN user_module_progress.completed_at
                    ELSE EXCLUDED.completed_at
                END
            RETURNING user_id, module_id, is_completed, completed_at
            "#,
        )
        .bind(user_id)
        .bind(module_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(progress)
    }

    async fn count_completed_modules(&self, user_id: Uuid, course_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM user_module_progress p
            JOIN modules m ON m.id = p.module_id
            WHERE p.user_id = $1 AND m.course_id = $2 AND p.is_completed
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
