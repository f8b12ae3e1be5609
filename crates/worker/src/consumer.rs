//! Consumer worker: read → decode → persist → commit.
//!
//! Messages are handled strictly one at a time. The commit position is
//! governed by [`CommitPolicy`]:
//! - `AfterPersist` commits only after a confirmed write; a failed write
//!   rewinds the partition so the message is read again; nothing further is
//!   read until that rewind succeeds
//! - `BeforePersist` commits first, so a failed write loses the event
//!
//! Malformed payloads are logged and committed; there is no dead-letter path.

use activity_core::Activity;
use clickhouse_client::ActivityStore;
use parking_lot::Mutex;
use redpanda::{MessageSource, QueueMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// When a message position is committed relative to its storage write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Commit after the write is confirmed (at-least-once)
    #[default]
    AfterPersist,
    /// Commit before writing (at-most-once on write failure)
    BeforePersist,
}

/// Worker lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Draining,
    Stopped,
}

/// Worker settings as they appear in configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default)]
    pub commit_policy: CommitPolicy,
    #[serde(default = "default_read_retry_backoff_ms")]
    pub read_retry_backoff_ms: u64,
    #[serde(default = "default_persist_retry_backoff_ms")]
    pub persist_retry_backoff_ms: u64,
}

fn default_read_retry_backoff_ms() -> u64 {
    1_000
}

fn default_persist_retry_backoff_ms() -> u64 {
    1_000
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::default(),
            read_retry_backoff_ms: default_read_retry_backoff_ms(),
            persist_retry_backoff_ms: default_persist_retry_backoff_ms(),
        }
    }
}

/// Consumer worker configuration.
#[derive(Debug, Clone)]
pub struct ConsumerWorkerConfig {
    pub commit_policy: CommitPolicy,
    /// Pause after a failed read
    pub read_retry_backoff: Duration,
    /// Pause after a failed write before the message is read again
    pub persist_retry_backoff: Duration,
}

impl Default for ConsumerWorkerConfig {
    fn default() -> Self {
        WorkerSettings::default().into()
    }
}

impl From<WorkerSettings> for ConsumerWorkerConfig {
    fn from(settings: WorkerSettings) -> Self {
        Self {
            commit_policy: settings.commit_policy,
            read_retry_backoff: Duration::from_millis(settings.read_retry_backoff_ms),
            persist_retry_backoff: Duration::from_millis(settings.persist_retry_backoff_ms),
        }
    }
}

/// Counters for one run of the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Messages taken from the queue
    pub consumed: u64,
    /// Rows written
    pub persisted: u64,
    /// Malformed messages committed without a write
    pub discarded: u64,
    /// Messages handed back to the queue after a failed write
    pub rewound: u64,
    /// Committed messages whose write failed
    pub lost: u64,
    pub read_errors: u64,
    pub persist_failures: u64,
    pub commit_failures: u64,
    /// Rewind attempts that failed and were retried
    pub rewind_failures: u64,
}

/// Worker that consumes events from Redpanda and inserts to ClickHouse.
pub struct ConsumerWorker {
    source: Arc<dyn MessageSource>,
    store: Arc<dyn ActivityStore>,
    config: ConsumerWorkerConfig,
    state: Mutex<WorkerState>,
}

impl ConsumerWorker {
    /// Creates a new consumer worker.
    pub fn new(source: Arc<dyn MessageSource>, store: Arc<dyn ActivityStore>) -> Self {
        Self::with_config(source, store, ConsumerWorkerConfig::default())
    }

    /// Creates a new consumer worker with custom config.
    pub fn with_config(
        source: Arc<dyn MessageSource>,
        store: Arc<dyn ActivityStore>,
        config: ConsumerWorkerConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
            state: Mutex::new(WorkerState::Running),
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn config(&self) -> &ConsumerWorkerConfig {
        &self.config
    }

    fn set_state(&self, state: WorkerState) {
        *self.state.lock() = state;
        debug!(state = ?state, "Worker state changed");
    }

    /// Main run loop, until `shutdown` is cancelled.
    ///
    /// Cancellation is observed before each read, while waiting for a
    /// message, and during retry pauses. A write already in progress always
    /// completes. The subscription is closed before returning.
    pub async fn run(&self, shutdown: CancellationToken) -> WorkerStats {
        info!(commit_policy = ?self.config.commit_policy, "Consumer worker starting");
        self.set_state(WorkerState::Running);

        let mut stats = WorkerStats::default();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                read = self.source.next_message() => read,
            };

            let message = match read {
                Ok(message) => message,
                Err(e) => {
                    stats.read_errors += 1;
                    warn!(
                        error = %e,
                        backoff_ms = %self.config.read_retry_backoff.as_millis(),
                        "Failed to read message, retrying"
                    );
                    if pause(self.config.read_retry_backoff, &shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            stats.consumed += 1;
            if self.handle(&message, &mut stats, &shutdown).await {
                break;
            }
        }

        self.set_state(WorkerState::Draining);
        self.source.close().await;
        self.set_state(WorkerState::Stopped);

        info!(
            consumed = stats.consumed,
            persisted = stats.persisted,
            discarded = stats.discarded,
            rewound = stats.rewound,
            rewind_failures = stats.rewind_failures,
            "Consumer worker stopped"
        );
        stats
    }

    /// Handles one message; returns true when the worker should stop.
    async fn handle(
        &self,
        message: &QueueMessage,
        stats: &mut WorkerStats,
        shutdown: &CancellationToken,
    ) -> bool {
        let activity = match Activity::from_payload(message.payload()) {
            Ok(activity) => activity,
            Err(e) => {
                metrics().deserialization_errors.inc();
                warn!(
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Discarding malformed message"
                );
                stats.discarded += 1;
                self.commit(message, stats).await;
                return false;
            }
        };

        match self.config.commit_policy {
            CommitPolicy::AfterPersist => {
                if self.persist(message, &activity, stats).await {
                    self.commit(message, stats).await;
                    return false;
                }

                if !self.rewind(message, stats, shutdown).await {
                    return true;
                }
                pause(self.config.persist_retry_backoff, shutdown).await
            }
            CommitPolicy::BeforePersist => {
                self.commit(message, stats).await;
                if !self.persist(message, &activity, stats).await {
                    stats.lost += 1;
                    error!(
                        partition = message.partition,
                        offset = message.offset,
                        user_id = %activity.user_id,
                        "Activity lost after failed write"
                    );
                }
                false
            }
        }
    }

    /// Hands `message` back to the queue, retrying until it succeeds.
    ///
    /// Reading past a message that was neither written nor rewound would let
    /// the next commit on its partition skip it. Returns false when cancelled
    /// first; the committed position still precedes the message.
    async fn rewind(
        &self,
        message: &QueueMessage,
        stats: &mut WorkerStats,
        shutdown: &CancellationToken,
    ) -> bool {
        loop {
            match self.source.rewind(message).await {
                Ok(()) => {
                    stats.rewound += 1;
                    return true;
                }
                Err(e) => {
                    stats.rewind_failures += 1;
                    error!(
                        partition = message.partition,
                        offset = message.offset,
                        error = %e,
                        "Failed to rewind, retrying before reading further"
                    );
                    if pause(self.config.persist_retry_backoff, shutdown).await {
                        return false;
                    }
                }
            }
        }
    }

    async fn persist(
        &self,
        message: &QueueMessage,
        activity: &Activity,
        stats: &mut WorkerStats,
    ) -> bool {
        let start = Instant::now();
        match self.store.insert_activity(activity).await {
            Ok(()) => {
                stats.persisted += 1;
                debug!(
                    partition = message.partition,
                    offset = message.offset,
                    latency_ms = %start.elapsed().as_millis(),
                    "Persisted activity"
                );
                true
            }
            Err(e) => {
                stats.persist_failures += 1;
                error!(
                    partition = message.partition,
                    offset = message.offset,
                    error = %e,
                    "Failed to persist activity"
                );
                false
            }
        }
    }

    async fn commit(&self, message: &QueueMessage, stats: &mut WorkerStats) {
        if let Err(e) = self.source.commit(message).await {
            stats.commit_failures += 1;
            warn!(
                partition = message.partition,
                offset = message.offset,
                error = %e,
                "Failed to commit offset, message may be redelivered"
            );
        }
    }
}

/// Sleeps for `backoff`; returns true when cancelled first.
async fn pause(backoff: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(backoff) => false,
    }
}
