//! Fixtures for service tests.

use crate::{
    models::{
        course::{Course, NewCourse},
        module::{Module, NewModule},
        money::Money,
        user::{NewUser, Role, User},
    },
    store::{CourseRepository, MemoryStore, ModuleRepository, UserRepository},
};

async fn insert(store: &MemoryStore, username: &str, role: Role, balance: Money) -> User {
    let user = store
        .insert_user(NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "not-a-real-hash".to_string(),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            role,
        })
        .await
        .unwrap();

    store.add_balance(user.id, balance).await.unwrap().unwrap()
}

pub async fn seed_user(store: &MemoryStore, username: &str, balance: Money) -> User {
    insert(store, username, Role::User, balance).await
}

pub async fn seed_admin(store: &MemoryStore, username: &str) -> User {
    insert(store, username, Role::Admin, Money::ZERO).await
}

pub async fn seed_course_with_topics(
    store: &MemoryStore,
    title: &str,
    price: Money,
    topics: &[&str],
) -> Course {
    store
        .insert_course(NewCourse {
            title: title.to_string(),
            description: format!("All about {}", title),
            instructor: "Ferris".to_string(),
            price,
            topics: topics.iter().map(|t| t.to_string()).collect(),
            thumbnail_image: None,
        })
        .await
        .unwrap()
}

pub async fn seed_course(store: &MemoryStore, title: &str, price: Money) -> Course {
    seed_course_with_topics(store, title, price, &["programming"]).await
}

pub async fn seed_module(store: &MemoryStore, course: &Course, title: &str) -> Module {
    store
        .insert_module(NewModule {
            course_id: course.id,
            title: title.to_string(),
            description: format!("{} lesson", title),
            pdf_content: None,
            video_content: Some(format!("http://localhost/uploads/{}.mp4", title)),
        })
        .await
        .unwrap()
}
