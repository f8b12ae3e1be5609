//! End-to-end pipeline: HTTP ingress → queue → worker → store → HTTP query.
//!
//! The router and the real worker loop share an in-memory queue, so the whole
//! flow runs without Docker.

use axum::http::StatusCode;
use integration_tests::{
    fixtures,
    setup::{wait_until, PipelineContext},
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker::CommitPolicy;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_tracked_events_become_queryable() {
    let ctx = PipelineContext::new(3);
    let server = ctx.server();

    let worker = Arc::new(ctx.worker(CommitPolicy::AfterPersist));
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let worker = worker.clone();
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    for minute in 0..6 {
        server
            .post("/track")
            .json(&fixtures::track_body_at(
                &format!("u{}", minute),
                "page_view",
                fixtures::at_minute(minute),
            ))
            .await
            .assert_status(StatusCode::ACCEPTED);
    }
    server
        .post("/track")
        .json(&fixtures::track_body("u-now", "login"))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let store = ctx.store.clone();
    assert!(wait_until(WAIT, || store.row_count() == 7).await);

    let rows: Vec<serde_json::Value> = server.get("/activities").await.json();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["user_id"], "u-now", "server-stamped event is newest");
    assert_eq!(rows[6]["user_id"], "u0");

    shutdown.cancel();
    let stats = tokio::time::timeout(WAIT, handle)
        .await
        .expect("worker did not stop")
        .unwrap();

    assert_eq!(stats.persisted, 7);
    assert_eq!(ctx.queue.uncommitted(), 0);
    assert!(ctx.queue.is_closed());
}

#[tokio::test]
async fn test_events_spread_across_partitions() {
    let ctx = PipelineContext::new(3);
    let server = ctx.server();

    let mut partitions = Vec::new();
    for i in 0..3 {
        let body: serde_json::Value = server
            .post("/track")
            .json(&fixtures::track_body(&format!("u{}", i), "click"))
            .await
            .json();
        partitions.push(body["partition"].as_i64().unwrap());
    }

    partitions.sort_unstable();
    assert_eq!(partitions, vec![0, 1, 2]);
    assert_eq!(ctx.queue.len(), 3);
}

#[tokio::test]
async fn test_rejected_requests_never_reach_storage() {
    let ctx = PipelineContext::new(1);
    let server = ctx.server();

    let worker = Arc::new(ctx.worker(CommitPolicy::AfterPersist));
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let worker = worker.clone();
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    server
        .post("/track")
        .json(&serde_json::json!({ "user_id": "u1" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .post("/track")
        .json(&fixtures::track_body("u2", "login"))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let store = ctx.store.clone();
    assert!(wait_until(WAIT, || store.row_count() == 1).await);
    shutdown.cancel();
    handle.await.unwrap();

    assert_eq!(ctx.queue.len(), 1);
    assert_eq!(ctx.store.rows()[0].user_id, "u2");
}
