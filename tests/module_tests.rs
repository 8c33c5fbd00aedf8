// tests/module_tests.rs

mod common;

use common::{TestApp, spawn_app, unique};
use serde_json::{Value, json};

async fn complete(app: &TestApp, token: &str, module_id: &str) -> (u16, Value) {
    let response = app
        .client
        .patch(app.url(&format!("/api/modules/{}/complete", module_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn completing_every_module_issues_a_certificate() {
    // Arrange: admin creates a course with 3 modules, a user buys it
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, token) = app.register_user(&unique("learner")).await;
    app.top_up(&admin, &user_id, 20.0).await;
    let course_id = app.create_course(&admin, "Three Steps", "20", &["rust"]).await;
    let m1 = app.create_module(&admin, &course_id, "one").await;
    let m2 = app.create_module(&admin, &course_id, "two").await;
    let m3 = app.create_module(&admin, &course_id, "three").await;
    app.client
        .post(app.url(&format!("/api/courses/{}/buy", course_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let status_path = format!("/api/courses/{}/buy-status", course_id);

    // Act + Assert: two of three
    let (status, first) = complete(&app, &token, &m1).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["module_id"], m1.as_str());
    assert_eq!(first["data"]["is_completed"], true);
    assert_eq!(first["data"]["course_progress"]["percentage"], 33);
    assert!(first["data"]["certificate_url"].is_null());

    complete(&app, &token, &m2).await;
    let (_, progress) = app.get_json(&token, &status_path).await;
    assert_eq!(progress["data"]["progress_percentage"], 67);
    assert_eq!(progress["data"]["is_completed"], false);

    // Third module completes the course
    let (_, last) = complete(&app, &token, &m3).await;
    assert_eq!(last["data"]["course_progress"]["percentage"], 100);
    assert_eq!(last["data"]["course_progress"]["completed_modules"], 3);
    assert_eq!(last["data"]["course_progress"]["total_modules"], 3);
    let certificate_url = last["data"]["certificate_url"].as_str().unwrap().to_string();
    assert!(certificate_url.ends_with(&format!(
        "certificates/certificate-{}-{}.pdf",
        user_id, course_id
    )));

    let (_, progress) = app.get_json(&token, &status_path).await;
    assert_eq!(progress["data"]["progress_percentage"], 100);
    assert_eq!(progress["data"]["is_completed"], true);

    let pdf = app.client.get(&certificate_url).send().await.unwrap();
    assert_eq!(pdf.status().as_u16(), 200);
    assert!(pdf.bytes().await.unwrap().starts_with(b"%PDF"));

    // Completing again is a no-op that still reports 100%
    let (status, again) = complete(&app, &token, &m3).await;
    assert_eq!(status, 200);
    assert_eq!(again["data"]["course_progress"]["completed_modules"], 3);
    assert!(again["data"]["certificate_url"].is_string());

    let (_, my_courses) = app.get_json(&token, "/api/courses/my-courses").await;
    assert_eq!(my_courses["data"][0]["progress_percentage"], 100);
}

#[tokio::test]
async fn module_content_requires_ownership_or_admin() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (_, stranger) = app.register_user(&unique("stranger")).await;
    let course_id = app.create_course(&admin, "Gated", "5", &["rust"]).await;
    let module_id = app.create_module(&admin, &course_id, "secret").await;
    let modules_path = format!("/api/courses/{}/modules", course_id);
    let module_path = format!("/api/modules/{}", module_id);

    let (status, _) = app.get_json(&stranger, &modules_path).await;
    assert_eq!(status, 403);
    let (status, _) = app.get_json(&stranger, &module_path).await;
    assert_eq!(status, 403);
    let (status, body) = complete(&app, &stranger, &module_id).await;
    assert_eq!(status, 403);
    assert_eq!(body["status"], "error");

    let (status, listed) = app.get_json(&admin, &modules_path).await;
    assert_eq!(status, 200);
    assert_eq!(listed["data"][0]["id"], module_id.as_str());
    assert_eq!(listed["data"][0]["order"], 1);
    assert_eq!(listed["data"][0]["is_completed"], false);
    assert_eq!(listed["pagination"]["total_items"], 1);

    let (status, detail) = app.get_json(&admin, &module_path).await;
    assert_eq!(status, 200);
    assert!(
        detail["data"]["pdf_content"]
            .as_str()
            .unwrap()
            .contains("/uploads/modules/pdfs/")
    );

    let (status, _) = app
        .get_json(&admin, &format!("/api/courses/{}/modules", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn reorder_is_all_or_nothing() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let course_id = app.create_course(&admin, "Ordered", "1", &["rust"]).await;
    let other_id = app.create_course(&admin, "Other", "1", &["go"]).await;
    let a = app.create_module(&admin, &course_id, "a").await;
    let b = app.create_module(&admin, &course_id, "b").await;
    let foreign = app.create_module(&admin, &other_id, "x").await;
    let reorder_url = app.url(&format!("/api/courses/{}/modules/reorder", course_id));
    let modules_path = format!("/api/courses/{}/modules", course_id);

    let rejected = app
        .client
        .patch(&reorder_url)
        .bearer_auth(&admin)
        .json(&json!({ "module_order": [
            { "id": a, "order": 2 },
            { "id": b, "order": 1 },
            { "id": foreign, "order": 3 }
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status().as_u16(), 400);

    let (_, unchanged) = app.get_json(&admin, &modules_path).await;
    assert_eq!(unchanged["data"][0]["id"], a.as_str());
    assert_eq!(unchanged["data"][1]["id"], b.as_str());

    let accepted = app
        .client
        .patch(&reorder_url)
        .bearer_auth(&admin)
        .json(&json!({ "module_order": [
            { "id": a, "order": 2 },
            { "id": b, "order": 1 }
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status().as_u16(), 200);

    let (_, reordered) = app.get_json(&admin, &modules_path).await;
    assert_eq!(reordered["data"][0]["id"], b.as_str());
    assert_eq!(reordered["data"][1]["id"], a.as_str());
}

#[tokio::test]
async fn module_update_and_delete() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let course_id = app.create_course(&admin, "Editable", "1", &["rust"]).await;
    let first = app.create_module(&admin, &course_id, "first").await;
    let second = app.create_module(&admin, &course_id, "second").await;

    let updated = app
        .client
        .put(app.url(&format!("/api/modules/{}", first)))
        .bearer_auth(&admin)
        .multipart(reqwest::multipart::Form::new().text("title", "renamed"))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let body: Value = updated.json().await.unwrap();
    assert_eq!(body["data"]["title"], "renamed");
    assert_eq!(body["data"]["description"], "first lesson");

    let deleted = app
        .client
        .delete(app.url(&format!("/api/modules/{}", first)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 204);

    // Orders are not compacted after a delete
    let (_, listed) = app
        .get_json(&admin, &format!("/api/courses/{}/modules", course_id))
        .await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["id"], second.as_str());
    assert_eq!(listed["data"][0]["order"], 2);

    let third = app.create_module(&admin, &course_id, "third").await;
    let (_, detail) = app.get_json(&admin, &format!("/api/modules/{}", third)).await;
    assert_eq!(detail["data"]["order"], 3);
}
