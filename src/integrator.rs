use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{CpuPool, Entry, SharedState, WorkItem, WorkerStats};
use crate::integrand::Integrand;
use crate::telemetry::{Metrics, MetricsSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag, checked by every worker between steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Outcome of one integration run together with what the workers did.
#[derive(Debug, Clone)]
pub struct IntegrationReport {
    pub value: f64,
    /// Calls to the integrand, endpoints included.
    pub evaluations: u64,
    pub refinements: u64,
    pub leaves: u64,
    pub global_takes: u64,
    pub local_pushes: u64,
    pub migration_attempts: u64,
    pub migrations: u64,
    pub migrated_entries: u64,
    pub max_local_depth: usize,
    pub workers: Vec<WorkerStats>,
    pub elapsed: Duration,
}

impl IntegrationReport {
    fn empty(elapsed: Duration) -> Self {
        Self::from_workers(0.0, 0, Vec::new(), elapsed)
    }

    fn from_workers(value: f64, evaluations: u64, workers: Vec<WorkerStats>, elapsed: Duration) -> Self {
        let sum = |field: fn(&WorkerStats) -> u64| workers.iter().map(field).sum::<u64>();

        Self {
            value,
            evaluations,
            refinements: sum(|w| w.refinements),
            leaves: sum(|w| w.leaves),
            global_takes: sum(|w| w.global_takes),
            local_pushes: sum(|w| w.local_pushes),
            migration_attempts: sum(|w| w.migration_attempts),
            migrations: sum(|w| w.migrations),
            migrated_entries: sum(|w| w.migrated_entries),
            max_local_depth: workers.iter().map(|w| w.max_local_depth).max().unwrap_or(0),
            workers,
            elapsed,
        }
    }
}

/// Parallel adaptive trapezoid integrator.
///
/// Each call to [`Integrator::integrate`] seeds a fresh global stack with the
/// whole interval, runs the configured number of workers to exhaustion and
/// returns the accumulated sum. The integrator itself holds no per-run state
/// and can be reused.
#[derive(Debug)]
pub struct Integrator {
    config: Config,
    cancel: Option<CancelToken>,
    metrics: Arc<Metrics>,
}

impl Integrator {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            cancel: None,
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn integrate<I: Integrand>(&self, f: I, lo: f64, hi: f64) -> Result<f64> {
        self.integrate_with_report(f, lo, hi).map(|report| report.value)
    }

    pub fn integrate_with_report<I: Integrand>(&self, f: I, lo: f64, hi: f64) -> Result<IntegrationReport> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(Error::InvalidBounds { lo, hi });
        }

        let start = Instant::now();
        if lo == hi {
            tracing::debug!(lo, "zero-width interval, nothing to integrate");
            return Ok(IntegrationReport::empty(start.elapsed()));
        }

        if self.cancel.as_ref().map_or(false, CancelToken::is_cancelled) {
            return Err(Error::Cancelled);
        }

        let workers = self.config.worker_threads();
        let metrics = self.telemetry_enabled().then(|| &*self.metrics);
        let shared = SharedState::new(&f, &self.config, workers, self.cancel.as_ref(), metrics);

        tracing::debug!(lo, hi, workers, tolerance = self.config.tolerance, "starting integration");

        let outcome = self.run(&shared, lo, hi, workers).and_then(|stats| {
            let value = shared.accumulator.value();
            if value.is_finite() {
                Ok((value, stats))
            } else {
                Err(Error::NonFiniteSum(value))
            }
        });
        let evaluations = shared.evaluator.evaluations();
        if let Some(metrics) = metrics {
            metrics.record_run(evaluations, outcome.is_ok());
        }
        let (value, stats) = outcome?;

        let report = IntegrationReport::from_workers(value, evaluations, stats, start.elapsed());

        tracing::debug!(
            value = report.value,
            evaluations = report.evaluations,
            leaves = report.leaves,
            migrations = report.migrations,
            elapsed_us = report.elapsed.as_micros() as u64,
            "integration finished"
        );

        Ok(report)
    }

    fn run<I: Integrand>(
        &self,
        shared: &SharedState<'_, I>,
        lo: f64,
        hi: f64,
        workers: usize,
    ) -> Result<Vec<WorkerStats>> {
        let f_lo = shared.evaluator.eval(lo)?;
        let f_hi = shared.evaluator.eval(hi)?;
        shared
            .stack
            .push(WorkItem::Interval(Entry::new(lo, hi, f_lo, f_hi)))?;

        let stats = CpuPool::new(&self.config, workers).run(shared);

        match shared.take_error() {
            Some(err) => Err(err),
            None => Ok(stats),
        }
    }

    #[cfg(feature = "telemetry")]
    fn telemetry_enabled(&self) -> bool {
        self.config.enable_telemetry
    }

    #[cfg(not(feature = "telemetry"))]
    fn telemetry_enabled(&self) -> bool {
        false
    }
}
