//! Telemetry and observability subsystem.
//!
//! Collects counters and refinement latencies across integration runs.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};

// Stub implementations when telemetry is disabled
#[cfg(not(feature = "telemetry"))]
pub mod metrics {
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, Default)]
    pub struct Metrics;

    impl Metrics {
        pub fn new() -> Self { Self }
        pub fn record_run(&self, _: u64, _: bool) {}
        pub fn record_refinement(&self, _: u64) {}
        pub fn record_migration(&self, _: usize) {}
        pub fn snapshot(&self) -> MetricsSnapshot { MetricsSnapshot::empty() }
        pub fn reset(&self) {}
    }

    #[derive(Debug, Clone)]
    pub struct MetricsSnapshot {
        pub timestamp: Instant,
        pub uptime: Duration,
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
        fn empty() -> Self {
            Self {
                timestamp: Instant::now(),
                uptime: Duration::ZERO,
                runs: 0,
                failed_runs: 0,
                intervals_taken: 0,
                evaluations: 0,
                migrations: 0,
                migrated_entries: 0,
                avg_refinement_ns: 0,
                p50_refinement_ns: 0,
                p99_refinement_ns: 0,
                max_refinement_ns: 0,
            }
        }

        pub fn avg_migration_batch(&self) -> f64 {
            0.0
        }
    }

}

#[cfg(not(feature = "telemetry"))]
pub use metrics::{Metrics, MetricsSnapshot};
