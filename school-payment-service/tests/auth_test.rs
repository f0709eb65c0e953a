mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::TestApp;
use mongodb::bson::doc;
use serde_json::json;

#[tokio::test]
async fn register_returns_created_with_token() {
    let app = TestApp::spawn().await;

    let res = app
        .post(
            "/auth/register",
            json!({ "email": "bursar@school.test", "password": "fees-2024" }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    assert_eq!(body["email"], "bursar@school.test");
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body.get("password_hash").is_none());

    let stored = app
        .db
        .users()
        .find_one(doc! { "email": "bursar@school.test" }, None)
        .await
        .unwrap()
        .expect("user persisted");
    assert!(stored.password_hash.starts_with("$argon2id$"));

    app.cleanup().await;
}

#[tokio::test]
async fn duplicate_registration_is_rejected_case_insensitively() {
    let app = TestApp::spawn().await;
    let creds = json!({ "email": "bursar@school.test", "password": "fees-2024" });
    assert_eq!(
        app.post("/auth/register", creds, None).await.status,
        StatusCode::CREATED
    );

    let res = app
        .post(
            "/auth/register",
            json!({ "email": "  Bursar@School.TEST ", "password": "other" }),
            None,
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "User already exists");

    app.cleanup().await;
}

#[tokio::test]
async fn register_requires_email_and_password() {
    let app = TestApp::spawn().await;

    for body in [
        json!({ "email": "bursar@school.test" }),
        json!({ "password": "fees-2024" }),
        json!({ "email": "", "password": "fees-2024" }),
    ] {
        let res = app.post("/auth/register", body, None).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.json()["error"], "Please provide email and password");
    }

    app.cleanup().await;
}

#[tokio::test]
async fn login_succeeds_with_correct_password() {
    let app = TestApp::spawn().await;
    app.post(
        "/auth/register",
        json!({ "email": "bursar@school.test", "password": "fees-2024" }),
        None,
    )
    .await;

    let res = app
        .post(
            "/auth/login",
            json!({ "email": "BURSAR@school.test", "password": "fees-2024" }),
            None,
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["email"], "bursar@school.test");
    let token = body["token"].as_str().unwrap();

    let res = app.get("/transactions", Some(token)).await;
    assert_eq!(res.status, StatusCode::OK);

    app.cleanup().await;
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::spawn().await;
    app.post(
        "/auth/register",
        json!({ "email": "bursar@school.test", "password": "fees-2024" }),
        None,
    )
    .await;

    let wrong_password = app
        .post(
            "/auth/login",
            json!({ "email": "bursar@school.test", "password": "nope" }),
            None,
        )
        .await;
    let unknown_user = app
        .post(
            "/auth/login",
            json!({ "email": "nobody@school.test", "password": "fees-2024" }),
            None,
        )
        .await;

    for res in [wrong_password, unknown_user] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.json()["error"], "Invalid email or password");
    }

    app.cleanup().await;
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = TestApp::spawn().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.send(request).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.json()["error"].is_string());

    app.cleanup().await;
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::spawn().await;

    let res = app.get("/transactions", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Not authorized, no token");

    let res = app.get("/transactions", Some("not-a-jwt")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Not authorized, token failed");

    let res = app
        .post("/payment/create", json!({}), Some("not-a-jwt"))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}

#[tokio::test]
async fn auth_routes_are_rate_limited_per_ip() {
    let app = TestApp::spawn_with(|config| {
        config.rate_limit.auth_attempts = 2;
        config.rate_limit.auth_window_seconds = 60;
    })
    .await;

    let attempt = |ip: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(
                json!({ "email": "x@school.test", "password": "pw" }).to_string(),
            ))
            .unwrap()
    };

    assert_eq!(app.send(attempt("203.0.113.7")).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.send(attempt("203.0.113.7")).await.status, StatusCode::UNAUTHORIZED);

    let limited = app.send(attempt("203.0.113.7")).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));

    assert_eq!(app.send(attempt("203.0.113.8")).await.status, StatusCode::UNAUTHORIZED);

    app.cleanup().await;
}
