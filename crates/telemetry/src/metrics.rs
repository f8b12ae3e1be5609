//! In-process pipeline metrics.
//!
//! Counters are process-global and cheap to bump from any handler or from
//! the worker loop. A snapshot is exposed on `/health` and logged by the
//! worker when it stops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s,
    /// then everything slower
    buckets: [AtomicU64; 12],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 12] = [
        1,
        5,
        10,
        25,
        50,
        100,
        250,
        500,
        1000,
        5000,
        10000,
        u64::MAX,
    ];

    /// Index of the unbounded last bucket.
    const OVERFLOW: usize = Self::BUCKET_BOUNDS.len() - 1;

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::OVERFLOW);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns `(upper bound ms, count)` per bucket. The last bound is
    /// `u64::MAX`.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingress
    pub track_requests: Counter,
    pub track_validation_failures: Counter,
    pub events_published: Counter,
    pub publish_errors: Counter,

    // Worker
    pub events_consumed: Counter,
    pub read_errors: Counter,
    pub deserialization_errors: Counter,
    pub events_persisted: Counter,
    pub persist_errors: Counter,
    pub events_rewound: Counter,

    // Read path
    pub activity_queries: Counter,
    pub query_errors: Counter,

    // Latency histograms
    pub publish_latency_ms: Histogram,
    pub persist_latency_ms: Histogram,
    pub query_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            track_requests: self.track_requests.get(),
            track_validation_failures: self.track_validation_failures.get(),
            events_published: self.events_published.get(),
            publish_errors: self.publish_errors.get(),
            events_consumed: self.events_consumed.get(),
            read_errors: self.read_errors.get(),
            deserialization_errors: self.deserialization_errors.get(),
            events_persisted: self.events_persisted.get(),
            persist_errors: self.persist_errors.get(),
            events_rewound: self.events_rewound.get(),
            activity_queries: self.activity_queries.get(),
            query_errors: self.query_errors.get(),
            publish_latency_mean_ms: self.publish_latency_ms.mean(),
            persist_latency_mean_ms: self.persist_latency_ms.mean(),
            query_latency_mean_ms: self.query_latency_ms.mean(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub track_requests: u64,
    pub track_validation_failures: u64,
    pub events_published: u64,
    pub publish_errors: u64,
    pub events_consumed: u64,
    pub read_errors: u64,
    pub deserialization_errors: u64,
    pub events_persisted: u64,
    pub persist_errors: u64,
    pub events_rewound: u64,
    pub activity_queries: u64,
    pub query_errors: u64,
    pub publish_latency_mean_ms: f64,
    pub persist_latency_mean_ms: f64,
    pub query_latency_mean_ms: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
