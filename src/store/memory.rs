// src/store/memory.rs

use std::{
    collections::{HashMap, HashSet},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::Utc;
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

/// Rows are kept in insertion order; listings sort on top of that.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    courses: Vec<Course>,
    topics: Vec<(Uuid, String)>,
    modules: Vec<Module>,
    ownerships: Vec<Ownership>,
    progress: HashMap<(Uuid, Uuid), Progress>,
}

impl Tables {
    fn topics_of(&self, course_id: Uuid) -> Vec<String> {
        self.topics
            .iter()
            .filter(|(id, _)| *id == course_id)
            .map(|(_, topic)| topic.clone())
            .collect()
    }

    fn module_count(&self, course_id: Uuid) -> i64 {
        self.modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .count() as i64
    }

    fn completed_count(&self, user_id: Uuid, course_id: Uuid) -> i64 {
        self.modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .filter(|m| {
                self.progress
                    .get(&(user_id, m.id))
                    .is_some_and(|p| p.is_completed)
            })
            .count() as i64
    }

    fn summary(&self, course: &Course) -> CourseSummary {
        CourseSummary {
            course: course.clone(),
            topics: self.topics_of(course.id),
            total_modules: self.module_count(course.id),
        }
    }

    fn sorted_modules(&self, course_id: Uuid) -> Vec<Module> {
        let mut modules: Vec<Module> = self
            .modules
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.order);
        modules
    }
}

/// In-process store with the same observable behavior as `PgStore`.
///
/// Multi-step writes happen under one lock, which gives them the same
/// all-or-nothing behavior as the Postgres transactions.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn window<T>(items: Vec<T>, page: PageRequest) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .collect();
    (items, total)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> AppResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned())
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.username == username && Some(u.id) != except))
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> AppResult<bool> {
        Ok(self
            .tables()?
            .users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except))
    }

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables()?;

        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role.as_str().to_string(),
            balance: Money::ZERO,
            created_at: Utc::now(),
        };
        tables.users.push(row.clone());

        Ok(row)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>> {
        let mut tables = self.tables()?;

        if tables
            .users
            .iter()
            .any(|u| u.username == changes.username && u.id != id)
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.username = changes.username;
        user.email = changes.email;
        user.first_name = changes.first_name;
        user.last_name = changes.last_name;
        if let Some(hash) = changes.password_hash {
            user.password = hash;
        }

        Ok(Some(user.clone()))
    }

    async fn add_balance(&self, id: Uuid, amount: Money) -> AppResult<Option<User>> {
        let mut tables = self.tables()?;

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        user.balance = user
            .balance
            .checked_add(amount)
            .ok_or_else(|| AppError::BadRequest("Balance overflow".to_string()))?;

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables()?;

        tables.progress.retain(|(user_id, _), _| *user_id != id);
        tables.ownerships.retain(|o| o.user_id != id);

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);

        Ok(tables.users.len() < before)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<User>, i64)> {
        let tables = self.tables()?;

        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| u.role() == Role::User)
            .filter(|u| match search {
                Some(term) => {
                    contains_ignore_case(&u.username, term)
                        || contains_ignore_case(&u.first_name, term)
                        || contains_ignore_case(&u.last_name, term)
                        || contains_ignore_case(&u.email, term)
                }
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.first_name.cmp(&b.first_name));

        Ok(window(users, page))
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert_course(&self, course: NewCourse) -> AppResult<Course> {
        let mut tables = self.tables()?;

        let now = Utc::now();
        let row = Course {
            id: Uuid::new_v4(),
            title: course.title,
            description: course.description,
            instructor: course.instructor,
            price: course.price,
            thumbnail_image: course.thumbnail_image,
            created_at: now,
            updated_at: now,
        };

        tables.courses.push(row.clone());
        for topic in course.topics {
            tables.topics.push((row.id, topic));
        }

        Ok(row)
    }

    async fn find_course(&self, id: Uuid) -> AppResult<Option<Course>> {
        Ok(self.tables()?.courses.iter().find(|c| c.id == id).cloned())
    }

    async fn course_summary(&self, id: Uuid) -> AppResult<Option<CourseSummary>> {
        let tables = self.tables()?;
        Ok(tables
            .courses
            .iter()
            .find(|c| c.id == id)
            .map(|c| tables.summary(c)))
    }

    async fn update_course(&self, id: Uuid, changes: CourseChanges) -> AppResult<Option<Course>> {
        let mut tables = self.tables()?;

        let Some(course) = tables.courses.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            course.title = title;
        }
        if let Some(description) = changes.description {
            course.description = description;
        }
        if let Some(instructor) = changes.instructor {
            course.instructor = instructor;
        }
        if let Some(price) = changes.price {
            course.price = price;
        }
        if let Some(thumbnail) = changes.thumbnail_image {
            course.thumbnail_image = Some(thumbnail);
        }
        course.updated_at = Utc::now();
        let updated = course.clone();

        if let Some(topics) = changes.topics {
            tables.topics.retain(|(course_id, _)| *course_id != id);
            for topic in topics {
                tables.topics.push((id, topic));
            }
        }

        Ok(Some(updated))
    }

    async fn delete_course_cascade(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables()?;

        let module_ids: HashSet<Uuid> = tables
            .modules
            .iter()
            .filter(|m| m.course_id == id)
            .map(|m| m.id)
            .collect();

        tables
            .progress
            .retain(|(_, module_id), _| !module_ids.contains(module_id));
        tables.ownerships.retain(|o| o.course_id != id);
        tables.modules.retain(|m| m.course_id != id);
        tables.topics.retain(|(course_id, _)| *course_id != id);

        let before = tables.courses.len();
        tables.courses.retain(|c| c.id != id);

        Ok(tables.courses.len() < before)
    }

    async fn course_ids_matching_fields(&self, term: &str) -> AppResult<Vec<Uuid>> {
        Ok(self
            .tables()?
            .courses
            .iter()
            .filter(|c| contains_ignore_case(&c.title, term) || contains_ignore_case(&c.instructor, term))
            .map(|c| c.id)
            .collect())
    }

    async fn course_ids_matching_topics(&self, term: &str) -> AppResult<Vec<Uuid>> {
        let ids: HashSet<Uuid> = self
            .tables()?
            .topics
            .iter()
            .filter(|(_, topic)| contains_ignore_case(topic, term))
            .map(|(id, _)| *id)
            .collect();

        Ok(ids.into_iter().collect())
    }

    async fn list_courses(
        &self,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<CourseSummary>, i64)> {
        let tables = self.tables()?;

        // Reverse insertion order first so equal timestamps stay newest-first.
        let mut courses: Vec<&Course> = tables
            .courses
            .iter()
            .rev()
            .filter(|c| only.is_none_or(|ids| ids.contains(&c.id)))
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let summaries = courses.into_iter().map(|c| tables.summary(c)).collect();

        Ok(window(summaries, page))
    }

    async fn list_owned_courses(
        &self,
        user_id: Uuid,
        only: Option<&[Uuid]>,
        page: PageRequest,
    ) -> AppResult<(Vec<OwnedCourseRecord>, i64)> {
        let tables = self.tables()?;

        let mut owned: Vec<&Ownership> = tables
            .ownerships
            .iter()
            .rev()
            .filter(|o| o.user_id == user_id)
            .filter(|o| only.is_none_or(|ids| ids.contains(&o.course_id)))
            .collect();
        owned.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));

        let records = owned
            .into_iter()
            .filter_map(|o| {
                let course = tables.courses.iter().find(|c| c.id == o.course_id)?;
                Some(OwnedCourseRecord {
                    id: course.id,
                    title: course.title.clone(),
                    instructor: course.instructor.clone(),
                    thumbnail_image: course.thumbnail_image.clone(),
                    topics: tables.topics_of(course.id),
                    transaction_id: o.transaction_id,
                    purchased_at: o.purchased_at,
                    total_modules: tables.module_count(course.id),
                    completed_modules: tables.completed_count(user_id, course.id),
                })
            })
            .collect();

        Ok(window(records, page))
    }
}

#[async_trait]
impl ModuleRepository for MemoryStore {
    async fn insert_module(&self, module: NewModule) -> AppResult<Module> {
        let mut tables = self.tables()?;

        if !tables.courses.iter().any(|c| c.id == module.course_id) {
            return Err(AppError::NotFound("Course not found".to_string()));
        }

        let next_order = tables
            .modules
            .iter()
            .filter(|m| m.course_id == module.course_id)
            .map(|m| m.order)
            .max()
            .unwrap_or(0)
            + 1;

        let now = Utc::now();
        let row = Module {
            id: Uuid::new_v4(),
            course_id: module.course_id,
            title: module.title,
            description: module.description,
            order: next_order,
            pdf_content: module.pdf_content,
            video_content: module.video_content,
            created_at: now,
            updated_at: now,
        };
        tables.modules.push(row.clone());

        Ok(row)
    }

    async fn find_module(&self, id: Uuid) -> AppResult<Option<Module>> {
        Ok(self.tables()?.modules.iter().find(|m| m.id == id).cloned())
    }

    async fn update_module(&self, id: Uuid, changes: ModuleChanges) -> AppResult<Option<Module>> {
        let mut tables = self.tables()?;

        let Some(module) = tables.modules.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            module.title = title;
        }
        if let Some(description) = changes.description {
            module.description = description;
        }
        if let Some(pdf) = changes.pdf_content {
            module.pdf_content = Some(pdf);
        }
        if let Some(video) = changes.video_content {
            module.video_content = Some(video);
        }
        module.updated_at = Utc::now();

        Ok(Some(module.clone()))
    }

    async fn delete_module(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables()?;

        tables.progress.retain(|(_, module_id), _| *module_id != id);

        let before = tables.modules.len();
        tables.modules.retain(|m| m.id != id);

        Ok(tables.modules.len() < before)
    }

    async fn course_modules(&self, course_id: Uuid) -> AppResult<Vec<Module>> {
        Ok(self.tables()?.sorted_modules(course_id))
    }

    async fn count_course_modules(&self, course_id: Uuid) -> AppResult<i64> {
        Ok(self.tables()?.module_count(course_id))
    }

    async fn count_modules_in_course(&self, course_id: Uuid, ids: &[Uuid]) -> AppResult<i64> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(self
            .tables()?
            .modules
            .iter()
            .filter(|m| m.course_id == course_id && wanted.contains(&m.id))
            .count() as i64)
    }

    async fn apply_module_order(&self, course_id: Uuid, order: &[ModuleOrder]) -> AppResult<()> {
        let mut tables = self.tables()?;
        let now = Utc::now();

        for entry in order {
            if let Some(module) = tables
                .modules
                .iter_mut()
                .find(|m| m.id == entry.id && m.course_id == course_id)
            {
                module.order = entry.order;
                module.updated_at = now;
            }
        }

        Ok(())
    }

    async fn list_modules_with_progress(
        &self,
        course_id: Uuid,
        user_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(Vec<ModuleWithProgress>, i64)> {
        let tables = self.tables()?;

        let modules = tables
            .sorted_modules(course_id)
            .into_iter()
            .map(|module| {
                let is_completed = tables
                    .progress
                    .get(&(user_id, module.id))
                    .is_some_and(|p| p.is_completed);
                ModuleWithProgress {
                    module,
                    is_completed,
                }
            })
            .collect();

        Ok(window(modules, page))
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryStore {
    async fn find_ownership(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> AppResult<Option<Ownership>> {
        Ok(self
            .tables()?
            .ownerships
            .iter()
            .find(|o| o.user_id == user_id && o.course_id == course_id)
            .cloned())
    }

    async fn purchase_course(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        price: Money,
    ) -> AppResult<Purchase> {
        let mut tables = self.tables()?;

        if tables
            .ownerships
            .iter()
            .any(|o| o.user_id == user_id && o.course_id == course_id)
        {
            return Err(AppError::AlreadyOwned);
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        if user.balance < price {
            return Err(AppError::InsufficientBalance);
        }
        user.balance = user
            .balance
            .checked_sub(price)
            .ok_or(AppError::InsufficientBalance)?;
        let balance = user.balance;

        let ownership = Ownership {
            transaction_id: Uuid::new_v4(),
            user_id,
            course_id,
            purchased_at: Utc::now(),
            completed_at: None,
        };
        tables.ownerships.push(ownership.clone());

        Ok(Purchase { ownership, balance })
    }

    async fn count_owned_courses(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .tables()?
            .ownerships
            .iter()
            .filter(|o| o.user_id == user_id)
            .count() as i64)
    }

    async fn find_progress(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Option<Progress>> {
        Ok(self.tables()?.progress.get(&(user_id, module_id)).cloned())
    }

    async fn mark_module_completed(&self, user_id: Uuid, module_id: Uuid) -> AppResult<Progress> {
        let mut tables = self.tables()?;

        let progress = tables
            .progress
            .entry((user_id, module_id))
            .or_insert_with(|| Progress {
                user_id,
                module_id,
                is_completed: false,
                completed_at: None,
            });

        if !progress.is_completed {
            progress.is_completed = true;
            progress.completed_at = Some(Utc::now());
        }

        Ok(progress.clone())
    }

    async fn count_completed_modules(&self, user_id: Uuid, course_id: Uuid) -> AppResult<i64> {
        Ok(self.tables()?.completed_count(user_id, course_id))
    }
}
