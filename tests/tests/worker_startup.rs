//! Tests for the worker startup sequence.

use activity_core::Error;
use clickhouse_client::ActivityStore;
use integration_tests::mocks::{InMemoryQueue, MockStore};
use redpanda::MessageSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use streamtrack::start_worker;
use worker::{WorkerSettings, WorkerState};

#[tokio::test]
async fn test_schema_failure_is_fatal_and_never_subscribes() {
    let store = Arc::new(MockStore::new());
    store.set_unreachable(true);
    let subscribed = AtomicBool::new(false);

    let result = start_worker(
        store.clone() as Arc<dyn ActivityStore>,
        || {
            subscribed.store(true, Ordering::SeqCst);
            Ok(Arc::new(InMemoryQueue::new(1)) as Arc<dyn MessageSource>)
        },
        WorkerSettings::default(),
    )
    .await;

    let err = match result {
        Ok(_) => panic!("startup succeeded with an unreachable store"),
        Err(err) => err,
    };
    let cause = err
        .downcast_ref::<Error>()
        .expect("startup error keeps its cause");
    assert!(cause.is_fatal());
    assert!(!subscribed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_subscription_failure_is_reported() {
    let store = Arc::new(MockStore::new());

    let result = start_worker(
        store as Arc<dyn ActivityStore>,
        || Err(Error::startup("no brokers")),
        WorkerSettings::default(),
    )
    .await;

    let err = match result {
        Ok(_) => panic!("startup succeeded without a subscription"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("Redpanda consumer"));
}

#[tokio::test]
async fn test_successful_startup_builds_running_worker() {
    let store = Arc::new(MockStore::new());
    let queue = Arc::new(InMemoryQueue::new(1));

    let worker = start_worker(
        store as Arc<dyn ActivityStore>,
        || Ok(queue.clone() as Arc<dyn MessageSource>),
        WorkerSettings::default(),
    )
    .await
    .expect("startup failed");

    assert_eq!(worker.state(), WorkerState::Running);
    assert!(!queue.is_closed());
}
