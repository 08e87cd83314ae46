mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{Value, json};

fn application(class_id: i64, name: &str) -> Value {
    json!({
        "class_id": class_id,
        "name": name,
        "phone": "010-1234-5678",
        "email": "member@example.com",
        "age": 31,
        "gender": "FEMALE",
        "experience": "two years of swimming",
        "message": "evening classes preferred"
    })
}

#[tokio::test]
async fn public_submission_then_admin_review() {
    let app = TestApp::new().await;
    let cookie = app.login().await;

    let (status, created) = app
        .send(Method::POST, "/api/v1/enrollments", None, Some(application(3, "Jung")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["status"], "PENDING");
    assert_eq!(created["data"]["approval_date"], Value::Null);
    let id = created["data"]["id"].as_i64().unwrap();

    let (status, approved) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/admin/enrollments/{id}"),
            Some(cookie.as_str()),
            Some(json!({ "status": "APPROVED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["data"]["status"], "APPROVED");
    assert!(approved["data"]["approval_date"].is_string());

    let (status, detail) = app
        .send(
            Method::GET,
            &format!("/api/v1/admin/enrollments/{id}"),
            Some(cookie.as_str()),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["name"], "Jung");
    assert_eq!(detail["data"]["status"], "APPROVED");

    let (status, _) = app
        .send(Method::GET, &format!("/api/v1/admin/enrollments/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(Method::GET, "/api/v1/admin/enrollments/404", Some(cookie.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PATCH,
            "/api/v1/admin/enrollments/404",
            Some(cookie.as_str()),
            Some(json!({ "status": "REJECTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_is_newest_first_and_filterable_by_class() {
    let app = TestApp::new().await;
    let cookie = app.login().await;
    for (class_id, name) in [(1, "a"), (2, "b"), (1, "c")] {
        app.send(Method::POST, "/api/v1/enrollments", None, Some(application(class_id, name)))
            .await;
    }

    let names = |body: &Value| {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect::<Vec<_>>()
    };

    let (_, all) = app
        .send(Method::GET, "/api/v1/admin/enrollments", Some(cookie.as_str()), None)
        .await;
    assert_eq!(names(&all), vec!["c", "b", "a"]);

    let (_, by_query) = app
        .send(Method::GET, "/api/v1/admin/enrollments?class_id=1", Some(cookie.as_str()), None)
        .await;
    let (_, by_path) = app
        .send(Method::GET, "/api/v1/admin/classes/1/enrollments", Some(cookie.as_str()), None)
        .await;
    assert_eq!(names(&by_query), vec!["c", "a"]);
    assert_eq!(names(&by_path), names(&by_query));
}

#[tokio::test]
async fn invalid_submissions_are_rejected() {
    let app = TestApp::new().await;

    let mut bad_email = application(1, "Jung");
    bad_email["email"] = json!("not-an-address");
    let mut bad_age = application(1, "Jung");
    bad_age["age"] = json!(0);
    let mut blank_name = application(1, "  ");
    blank_name["class_id"] = json!(1);
    let bad_class = application(0, "Jung");
    let mut long_phone = application(1, "Jung");
    long_phone["phone"] = json!("0".repeat(21));
    let mut long_emergency_phone = application(1, "Jung");
    long_emergency_phone["emergency_phone"] = json!("0".repeat(21));
    let long_name = application(1, &"가".repeat(101));
    let mut long_contact = application(1, "Jung");
    long_contact["emergency_contact"] = json!("x".repeat(101));

    for payload in [
        bad_email,
        bad_age,
        blank_name,
        bad_class,
        long_phone,
        long_emergency_phone,
        long_name,
        long_contact,
    ] {
        let (status, body) = app
            .send(Method::POST, "/api/v1/enrollments", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "validation");
    }
    assert!(app.repos.enrollments.list(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn fields_at_column_width_are_accepted() {
    let app = TestApp::new().await;
    let mut payload = application(1, &"가".repeat(100));
    payload["phone"] = json!(format!(" {} ", "0".repeat(20)));
    payload["emergency_contact"] = json!("x".repeat(100));
    payload["emergency_phone"] = json!("1".repeat(20));

    let (status, body) = app
        .send(Method::POST, "/api/v1/enrollments", None, Some(payload))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["phone"], "0".repeat(20));
}

#[tokio::test]
async fn delete_and_guard() {
    let app = TestApp::new().await;
    let (_, created) = app
        .send(Method::POST, "/api/v1/enrollments", None, Some(application(1, "Jung")))
        .await;
    let uri = format!("/api/v1/admin/enrollments/{}", created["data"]["id"]);

    let (status, _) = app.send(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login().await;
    let (status, _) = app.send(Method::DELETE, &uri, Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.send(Method::DELETE, &uri, Some(cookie.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
