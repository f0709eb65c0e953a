mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn root_serves_banner() {
    let app = TestApp::spawn().await;

    let res = app.get("/", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.text(), "School Payment API is running...");

    app.cleanup().await;
}

#[tokio::test]
async fn health_reports_service_identity() {
    let app = TestApp::spawn().await;

    let res = app.get("/health", None).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "school-payment-service-test");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    app.cleanup().await;
}

#[tokio::test]
async fn ready_and_metrics_respond() {
    let app = TestApp::spawn().await;

    let res = app.get("/ready", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "ready");

    let res = app.get("/metrics", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    app.cleanup().await;
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn().await;

    let res = app.get("/ready", None).await;
    assert!(res.headers.contains_key("x-request-id"));
    assert_eq!(res.headers["x-content-type-options"], "nosniff");
    assert_eq!(res.headers["x-frame-options"], "DENY");

    app.cleanup().await;
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = TestApp::spawn().await;

    let res = app.get("/api/nothing-here", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    app.cleanup().await;
}
