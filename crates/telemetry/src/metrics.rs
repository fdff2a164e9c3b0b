//! Internal metrics collection.
//!
//! Collected in-memory with relaxed atomics; exposed through snapshots for
//! logging and health endpoints.

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

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 10ms, 100ms, 1s, 10s, 60s, 600s
    buckets: [AtomicU64; 7],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 7] = [1, 10, 100, 1_000, 10_000, 60_000, 600_000];

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

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[Self::BUCKET_BOUNDS.len() - 1].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }
}

/// Collected metrics for the policy engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Upload gateway
    pub uploads_received: Counter,
    pub uploads_rejected: Counter,

    // Ingestion runs
    pub runs_completed: Counter,
    pub runs_failed: Counter,
    pub rows_processed: Counter,
    pub row_errors: Counter,
    pub run_latency_ms: Histogram,

    // Entities created by ingestion
    pub agents_created: Counter,
    pub users_created: Counter,
    pub accounts_created: Counter,
    pub categories_created: Counter,
    pub carriers_created: Counter,
    pub policies_created: Counter,

    // Scheduled message processing
    pub messages_processed: Counter,
    pub messages_sent: Counter,
    pub messages_failed: Counter,
    pub delivery_latency_ms: Histogram,

    // Watchdog
    pub cpu_usage_percent: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            uploads_received: self.uploads_received.get(),
            uploads_rejected: self.uploads_rejected.get(),
            runs_completed: self.runs_completed.get(),
            runs_failed: self.runs_failed.get(),
            rows_processed: self.rows_processed.get(),
            row_errors: self.row_errors.get(),
            run_latency_mean_ms: self.run_latency_ms.mean(),
            policies_created: self.policies_created.get(),
            messages_sent: self.messages_sent.get(),
            messages_failed: self.messages_failed.get(),
            cpu_usage_percent: self.cpu_usage_percent.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub uploads_received: u64,
    pub uploads_rejected: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub rows_processed: u64,
    pub row_errors: u64,
    pub run_latency_mean_ms: f64,
    pub policies_created: u64,
    pub messages_sent: u64,
    pub messages_failed: u64,
    pub cpu_usage_percent: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
