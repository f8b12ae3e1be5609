//! Tests for the `GET /activities` query endpoint.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn test_empty_table_returns_empty_array() {
    let ctx = TestContext::new();
    let server = ctx.server();

    let response = server.get("/activities").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_rows_are_newest_first() {
    let ctx = TestContext::new();
    ctx.store.seed(fixtures::activity_at("u1", "login", 1));
    ctx.store.seed(fixtures::activity_at("u2", "logout", 30));
    ctx.store.seed(fixtures::activity_at("u3", "click", 10));
    let server = ctx.server();

    let response = server.get("/activities").await;
    response.assert_status_ok();

    let rows: Vec<serde_json::Value> = response.json();
    let users: Vec<&str> = rows.iter().map(|r| r["user_id"].as_str().unwrap()).collect();
    assert_eq!(users, vec!["u2", "u3", "u1"]);

    let stamps: Vec<chrono::DateTime<chrono::Utc>> = rows
        .iter()
        .map(|r| r["created_at"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_query_failure_returns_500_without_rows() {
    let ctx = TestContext::new();
    ctx.store.seed(fixtures::activity_at("u1", "login", 1));
    ctx.store.set_fail_queries(true);
    let server = ctx.server();

    let response = server.get("/activities").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "DB_002");
    assert!(body.get("user_id").is_none());
}

#[tokio::test]
async fn test_non_get_methods_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();

    server
        .post("/activities")
        .json(&fixtures::track_body("u1", "login"))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    server
        .delete("/activities")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    server
        .put("/activities")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
