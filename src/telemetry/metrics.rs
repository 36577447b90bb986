//! Metrics collection across integration runs.

use hdrhistogram::Histogram;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters and latency histogram shared by every run of one integrator
#[derive(Debug)]
pub struct Metrics {
    runs: AtomicU64,
    failed_runs: AtomicU64,
    intervals_taken: AtomicU64,
    evaluations: AtomicU64,
    migrations: AtomicU64,
    migrated_entries: AtomicU64,

    // Time spent refining one interval taken from the global stack
    refinement_histogram: RwLock<Histogram<u64>>,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        // 3 significant figures, auto-resizing so no upper bound has to be guessed
        let mut histogram = Histogram::new(3).expect("3 significant figures is a valid precision");
        histogram.auto(true);

        Self {
            runs: AtomicU64::new(0),
            failed_runs: AtomicU64::new(0),
            intervals_taken: AtomicU64::new(0),
            evaluations: AtomicU64::new(0),
            migrations: AtomicU64::new(0),
            migrated_entries: AtomicU64::new(0),
            refinement_histogram: RwLock::new(histogram),
            start_time: Instant::now(),
        }
    }

    pub fn record_run(&self, evaluations: u64, succeeded: bool) {
        self.runs.fetch_add(1, Ordering::Relaxed);
        self.evaluations.fetch_add(evaluations, Ordering::Relaxed);
        if !succeeded {
            self.failed_runs.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one global-stack interval refined to exhaustion
    pub fn record_refinement(&self, duration_ns: u64) {
        self.intervals_taken.fetch_add(1, Ordering::Relaxed);

        if let Some(mut hist) = self.refinement_histogram.try_write() {
            let _ = hist.record(duration_ns.max(1));
        }
    }

    pub fn record_migration(&self, entries: usize) {
        self.migrations.fetch_add(1, Ordering::Relaxed);
        self.migrated_entries
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let histogram = self.refinement_histogram.read();

        MetricsSnapshot {
            timestamp: Instant::now(),
            uptime: self.start_time.elapsed(),
            runs: self.runs.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            intervals_taken: self.intervals_taken.load(Ordering::Relaxed),
            evaluations: self.evaluations.load(Ordering::Relaxed),
            migrations: self.migrations.load(Ordering::Relaxed),
            migrated_entries: self.migrated_entries.load(Ordering::Relaxed),
            avg_refinement_ns: if histogram.len() > 0 {
                histogram.mean() as u64
            } else {
                0
            },
            p50_refinement_ns: histogram.value_at_quantile(0.50),
            p99_refinement_ns: histogram.value_at_quantile(0.99),
            max_refinement_ns: histogram.max(),
        }
    }

    pub fn reset(&self) {
        self.runs.store(0, Ordering::Relaxed);
        self.failed_runs.store(0, Ordering::Relaxed);
        self.intervals_taken.store(0, Ordering::Relaxed);
        self.evaluations.store(0, Ordering::Relaxed);
        self.migrations.store(0, Ordering::Relaxed);
        self.migrated_entries.store(0, Ordering::Relaxed);

        self.refinement_histogram.write().reset();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub timestamp: Instant,
    pub uptime: std::time::Duration,
    pub runs: u64,
    pub failed_runs: u64,
    pub intervals_taken: u64,
    pub evaluations: u64,
    pub migrations: u64,
    pub migrated_entries: u64,
    pub avg_refinement_ns: u64,
    pub p50_refinement_ns: u64,
    pub p99_refinement_ns: u64,
    pub max_refinement_ns: u64,
}

impl MetricsSnapshot {
    /// Average number of entries moved per migration
    pub fn avg_migration_batch(&self) -> f64 {
        if self.migrations == 0 {
            return 0.0;
        }
        self.migrated_entries as f64 / self.migrations as f64
    }
}
