// tests/catalog_tests.rs

mod common;

use common::{spawn_app, unique};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[tokio::test]
async fn search_matches_topics_and_reports_empty_results() {
    // Arrange
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, token) = app.register_user(&unique("u")).await;
    let tagged = app
        .create_course(&admin, "Systems Programming", "10", &["Rust", "Embedded"])
        .await;
    app.create_course(&admin, "Web Design", "10", &["CSS"]).await;

    // Act
    let (status, by_topic) = app.get_json(&token, "/api/courses?q=embed").await;
    let (_, by_title) = app.get_json(&token, "/api/courses?q=WEB").await;
    let (_, nothing) = app.get_json(&token, "/api/courses?q=cobol").await;

    // Assert
    assert_eq!(status, 200);
    let items = by_topic["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], tagged.as_str());
    assert_eq!(items[0]["topics"], serde_json::json!(["Rust", "Embedded"]));
    assert_eq!(items[0]["total_modules"], 0);

    assert_eq!(by_title["data"][0]["title"], "Web Design");

    assert_eq!(nothing["status"], "success");
    assert_eq!(nothing["data"], serde_json::json!([]));
    assert_eq!(nothing["pagination"]["total_items"], 0);
    assert_eq!(nothing["pagination"]["total_pages"], 0);
    assert_eq!(nothing["pagination"]["current_page"], 1);
}

#[tokio::test]
async fn search_treats_wildcards_as_text() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let percent = app.create_course(&admin, "Rust 100% Safe", "1", &["Safety"]).await;
    app.create_course(&admin, "Plain Course", "1", &["Basics"]).await;

    let (_, by_percent) = app.get_json(&admin, "/api/courses?q=%25").await;
    let (_, by_underscore) = app.get_json(&admin, "/api/courses?q=_").await;

    assert_eq!(by_percent["pagination"]["total_items"], 1);
    assert_eq!(by_percent["data"][0]["id"], percent.as_str());
    assert_eq!(by_underscore["pagination"]["total_items"], 0);
}

#[tokio::test]
async fn listing_is_newest_first_and_limit_is_capped() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    for i in 0..52 {
        app.create_course(&admin, &format!("Course {:02}", i), "1", &["bulk"])
            .await;
    }

    let (_, capped) = app.get_json(&admin, "/api/courses?limit=1000").await;
    assert_eq!(capped["data"].as_array().unwrap().len(), 50);
    assert_eq!(capped["data"][0]["title"], "Course 51");
    assert_eq!(capped["pagination"]["total_pages"], 2);
    assert_eq!(capped["pagination"]["total_items"], 52);

    let (_, default) = app.get_json(&admin, "/api/courses").await;
    assert_eq!(default["data"].as_array().unwrap().len(), 15);
    assert_eq!(default["pagination"]["total_pages"], 4);

    let (_, last) = app.get_json(&admin, "/api/courses?page=4").await;
    assert_eq!(last["data"].as_array().unwrap().len(), 7);
    assert_eq!(last["data"][6]["title"], "Course 00");
}

#[tokio::test]
async fn my_courses_lists_purchases_with_progress() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, token) = app.register_user(&unique("u")).await;
    app.top_up(&admin, &user_id, 100.0).await;
    let owned = app.create_course(&admin, "Owned", "5", &["rust"]).await;
    app.create_course(&admin, "Not Owned", "5", &["rust"]).await;

    app.client
        .post(app.url(&format!("/api/courses/{}/buy", owned)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let (status, body) = app.get_json(&token, "/api/courses/my-courses").await;
    assert_eq!(status, 200);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], owned.as_str());
    assert_eq!(items[0]["progress_percentage"], 0);
    assert!(items[0]["purchased_at"].is_string());

    let (_, none) = app
        .get_json(&token, "/api/courses/my-courses?q=python")
        .await;
    assert_eq!(none["pagination"]["total_items"], 0);
}

#[tokio::test]
async fn admin_course_lifecycle() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, token) = app.register_user(&unique("u")).await;

    let thumbnail = Part::bytes(vec![0x89, b'P', b'N', b'G'])
        .file_name("cover image.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("title", "Lifecycle")
        .text("description", "<b>Bold</b><script>alert(1)</script>")
        .text("instructor", "Ferris")
        .text("price", "12.30")
        .text("topics", "rust, testing")
        .part("thumbnail_image", thumbnail);

    // Non-admins cannot create courses
    let forbidden = app
        .client
        .post(app.url("/api/courses"))
        .bearer_auth(&token)
        .multipart(Form::new().text("title", "Nope"))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let created = app
        .client
        .post(app.url("/api/courses"))
        .bearer_auth(&admin)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let body: Value = created.json().await.unwrap();
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["description"], "<b>Bold</b>");
    assert_eq!(body["data"]["price"].as_f64(), Some(12.3));
    assert_eq!(body["data"]["topics"], serde_json::json!(["rust", "testing"]));

    // The thumbnail is served back from /uploads
    let thumbnail_url = body["data"]["thumbnail_image"].as_str().unwrap().to_string();
    assert!(thumbnail_url.starts_with(&app.url("/uploads/courses/thumbnails/")));
    let served = app.client.get(&thumbnail_url).send().await.unwrap();
    assert_eq!(served.status().as_u16(), 200);

    let updated = app
        .client
        .put(app.url(&format!("/api/courses/{}", id)))
        .bearer_auth(&admin)
        .multipart(Form::new().text("title", "Lifecycle II"))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Lifecycle II");
    assert_eq!(body["data"]["instructor"], "Ferris");

    app.create_module(&admin, &id, "intro").await;

    let deleted = app
        .client
        .delete(app.url(&format!("/api/courses/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    let (status, _) = app.get_json(&token, &format!("/api/courses/{}", id)).await;
    assert_eq!(status, 404);
    let gone = app.client.get(&thumbnail_url).send().await.unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn course_creation_requires_topics() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .client
        .post(app.url("/api/courses"))
        .bearer_auth(&admin)
        .multipart(
            Form::new()
                .text("title", "No topics")
                .text("description", "desc")
                .text("instructor", "Ferris")
                .text("price", "1"),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}
