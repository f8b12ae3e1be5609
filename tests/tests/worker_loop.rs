//! Tests for the consumer worker loop against the in-memory queue.

use activity_core::Activity;
use integration_tests::{fixtures, setup::{wait_until, PipelineContext}};
use redpanda::EventProducer;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use worker::{CommitPolicy, WorkerState};

const WAIT: Duration = Duration::from_secs(5);

/// Runs the worker until `done` holds, then cancels it.
async fn run_until<F>(ctx: &PipelineContext, policy: CommitPolicy, done: F) -> worker::WorkerStats
where
    F: FnMut() -> bool,
{
    let worker = ctx.worker(policy);
    let shutdown = CancellationToken::new();

    let run = worker.run(shutdown.clone());
    tokio::pin!(run);

    let reached = tokio::select! {
        stats = &mut run => panic!("worker exited early: {:?}", stats),
        reached = wait_until(WAIT, done) => reached,
    };
    assert!(reached, "condition not reached in time");

    shutdown.cancel();
    tokio::time::timeout(WAIT, run)
        .await
        .expect("worker did not stop after cancellation")
}

#[tokio::test]
async fn test_events_are_persisted_and_committed() {
    let ctx = PipelineContext::new(2);
    for activity in fixtures::activities(4) {
        ctx.queue.publish(&activity).await.unwrap();
    }

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 4).await;

    assert_eq!(stats.consumed, 4);
    assert_eq!(stats.persisted, 4);
    assert_eq!(ctx.queue.uncommitted(), 0);
    assert!(ctx.queue.is_closed());
}

#[tokio::test]
async fn test_malformed_payloads_are_discarded_and_committed() {
    let ctx = PipelineContext::new(1);
    for payload in fixtures::malformed_payloads() {
        ctx.queue.push_raw(payload);
    }
    ctx.queue
        .publish(&fixtures::activity_at("u1", "login", 0))
        .await
        .unwrap();

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 1).await;

    let malformed = fixtures::malformed_payloads().len() as u64;
    assert_eq!(stats.discarded, malformed);
    assert_eq!(stats.persisted, 1);
    assert_eq!(ctx.store.insert_attempts(), 1, "malformed payloads never reach storage");
    assert_eq!(ctx.queue.uncommitted(), 0);
}

#[tokio::test]
async fn test_redelivery_produces_duplicate_rows() {
    let ctx = PipelineContext::new(1);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "login", 0))
        .await
        .unwrap();
    ctx.queue.push_raw(br#"{"user_id":"u1","action":"login","created_at":"2024-05-01T12:00:00Z"}"#);

    let store = ctx.store.clone();
    run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 2).await;

    let rows = ctx.store.rows();
    assert_eq!(rows[0], rows[1]);
}

#[tokio::test]
async fn test_restart_resumes_at_committed_position() {
    let ctx = PipelineContext::new(1);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "login", 0))
        .await
        .unwrap();

    let store = ctx.store.clone();
    run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 1).await;

    ctx.queue.restart_from_committed();
    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() >= 1).await;

    assert_eq!(stats.consumed, 0, "committed messages are not redelivered");
    assert_eq!(ctx.store.row_count(), 1);
}

#[tokio::test]
async fn test_failed_write_is_retried_after_persist() {
    let ctx = PipelineContext::new(1);
    ctx.store.fail_next_inserts(2);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "purchase", 0))
        .await
        .unwrap();

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 1).await;

    assert_eq!(stats.persist_failures, 2);
    assert_eq!(stats.rewound, 2);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.consumed, 3, "the same message is read three times");
    assert_eq!(ctx.queue.rewinds(), vec![(0, 0), (0, 0)]);
    assert_eq!(ctx.queue.commits(), vec![(0, 0)]);
}

#[tokio::test]
async fn test_failed_rewind_is_retried_before_reading_further() {
    let ctx = PipelineContext::new(1);
    ctx.store.fail_next_inserts(1);
    ctx.queue.fail_next_rewinds(2);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "purchase", 0))
        .await
        .unwrap();
    ctx.queue
        .publish(&fixtures::activity_at("u2", "purchase", 1))
        .await
        .unwrap();

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 2).await;

    let users: Vec<String> = ctx.store.rows().into_iter().map(|a| a.user_id).collect();
    assert_eq!(users, vec!["u1", "u2"]);
    assert_eq!(stats.rewind_failures, 2);
    assert_eq!(stats.rewound, 1);
    assert_eq!(stats.lost, 0);
    assert_eq!(ctx.queue.rewind_attempts(), 3);
    assert_eq!(ctx.queue.uncommitted(), 0);
}

#[tokio::test]
async fn test_unrewindable_message_is_never_committed_past() {
    let ctx = PipelineContext::new(1);
    ctx.store.fail_next_inserts(1);
    ctx.queue.fail_next_rewinds(usize::MAX);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "purchase", 0))
        .await
        .unwrap();
    ctx.queue
        .publish(&fixtures::activity_at("u2", "purchase", 1))
        .await
        .unwrap();

    let queue = ctx.queue.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || queue.rewind_attempts() >= 3).await;

    assert_eq!(stats.consumed, 1, "nothing is read past the failed message");
    assert_eq!(stats.rewound, 0);
    assert_eq!(ctx.store.row_count(), 0);
    assert_eq!(ctx.queue.committed(0), 0);
    assert_eq!(ctx.queue.uncommitted(), 2);

    ctx.queue.fail_next_rewinds(0);
    ctx.queue.restart_from_committed();
    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 2).await;
    assert_eq!(stats.consumed, 2);
    assert_eq!(ctx.queue.uncommitted(), 0);
}

#[tokio::test]
async fn test_failed_write_is_lost_before_persist() {
    let ctx = PipelineContext::new(1);
    ctx.store.fail_next_inserts(1);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "purchase", 0))
        .await
        .unwrap();
    ctx.queue
        .publish(&fixtures::activity_at("u2", "purchase", 1))
        .await
        .unwrap();

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::BeforePersist, || store.row_count() == 1).await;

    assert_eq!(stats.lost, 1);
    assert_eq!(stats.rewound, 0);
    assert_eq!(ctx.queue.uncommitted(), 0);
    assert_eq!(ctx.store.rows()[0].user_id, "u2");
}

#[tokio::test]
async fn test_read_errors_do_not_stop_the_worker() {
    let ctx = PipelineContext::new(1);
    ctx.queue.fail_next_reads(3);
    ctx.queue
        .publish(&fixtures::activity_at("u1", "login", 0))
        .await
        .unwrap();

    let store = ctx.store.clone();
    let stats = run_until(&ctx, CommitPolicy::AfterPersist, || store.row_count() == 1).await;

    assert_eq!(stats.read_errors, 3);
    assert_eq!(stats.persisted, 1);
}

#[tokio::test]
async fn test_cancelled_before_start_consumes_nothing() {
    let ctx = PipelineContext::new(1);
    ctx.queue
        .publish(&Activity::new("u1", "login"))
        .await
        .unwrap();

    let worker = ctx.worker(CommitPolicy::AfterPersist);
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    let stats = worker.run(shutdown).await;

    assert_eq!(stats.consumed, 0);
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert!(ctx.queue.is_closed());
    assert_eq!(ctx.queue.uncommitted(), 1);
}

#[tokio::test]
async fn test_idle_read_is_interrupted_by_shutdown() {
    let ctx = PipelineContext::new(1);
    let worker = std::sync::Arc::new(ctx.worker(CommitPolicy::AfterPersist));
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn({
        let worker = worker.clone();
        let shutdown = shutdown.clone();
        async move { worker.run(shutdown).await }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(worker.state(), WorkerState::Running);

    shutdown.cancel();
    let stats = tokio::time::timeout(WAIT, handle)
        .await
        .expect("worker did not stop while idle")
        .unwrap();

    assert_eq!(stats.consumed, 0);
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert!(ctx.queue.is_closed());
}
