// tests/purchase_tests.rs

mod common;

use common::{spawn_app, unique};
use serde_json::Value;

#[tokio::test]
async fn purchase_debits_once_and_rejects_repeat() {
    // Arrange
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, token) = app.register_user(&unique("buyer")).await;
    app.top_up(&admin, &user_id, 100.0).await;
    let course_id = app.create_course(&admin, "Rust Basics", "25.50", &["rust"]).await;
    let buy_url = app.url(&format!("/api/courses/{}/buy", course_id));

    // Act
    let first = app.client.post(&buy_url).bearer_auth(&token).send().await.unwrap();
    let second = app.client.post(&buy_url).bearer_auth(&token).send().await.unwrap();

    // Assert
    assert_eq!(first.status().as_u16(), 201);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["data"]["course_id"], course_id.as_str());
    assert_eq!(body["data"]["user_balance"].as_f64(), Some(74.5));
    let transaction_id = body["data"]["transaction_id"].as_str().unwrap().to_string();

    assert_eq!(second.status().as_u16(), 400);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["message"], "You already own this course");

    let (_, me) = app.get_json(&token, "/api/auth/self").await;
    assert_eq!(me["data"]["balance"].as_f64(), Some(74.5));

    let (status, body) = app
        .get_json(&token, &format!("/api/courses/{}/buy-status", course_id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["owns_course"], true);
    assert_eq!(body["data"]["transaction_id"], transaction_id.as_str());
    assert_eq!(body["data"]["progress_percentage"], 0);
    assert_eq!(body["data"]["is_completed"], false);
}

#[tokio::test]
async fn insufficient_balance_keeps_balance() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, token) = app.register_user(&unique("buyer")).await;
    app.top_up(&admin, &user_id, 50.0).await;
    let course_id = app.create_course(&admin, "Advanced Rust", "99.99", &["rust"]).await;

    let response = app
        .client
        .post(app.url(&format!("/api/courses/{}/buy", course_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Insufficient balance");

    let (_, me) = app.get_json(&token, "/api/auth/self").await;
    assert_eq!(me["data"]["balance"].as_f64(), Some(50.0));

    let (_, status) = app
        .get_json(&token, &format!("/api/courses/{}/buy-status", course_id))
        .await;
    assert_eq!(status["data"], serde_json::json!({ "owns_course": false }));
}

#[tokio::test]
async fn exact_balance_purchase_leaves_zero() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, token) = app.register_user(&unique("buyer")).await;
    app.top_up(&admin, &user_id, 19.99).await;
    let course_id = app.create_course(&admin, "Go Basics", "19.99", &["go"]).await;

    let response = app
        .client
        .post(app.url(&format!("/api/courses/{}/buy", course_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["user_balance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn buying_unknown_course_is_404() {
    let app = spawn_app().await;
    let (_, token) = app.register_user(&unique("buyer")).await;

    let response = app
        .client
        .post(app.url(&format!("/api/courses/{}/buy", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn balance_increment_must_be_positive() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, _) = app.register_user(&unique("buyer")).await;

    let response = app
        .client
        .post(app.url(&format!("/api/users/{}/balance", user_id)))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "increment": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    app.top_up(&admin, &user_id, 12.5).await;
    let body = app.top_up(&admin, &user_id, 0.01).await;
    assert_eq!(body["data"]["balance"].as_f64(), Some(12.51));
}
