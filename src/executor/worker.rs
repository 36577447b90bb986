// worker thread stuff
use super::accumulator::ResultAccumulator;
use super::entry::{Entry, RefineRule, Refinement, WorkItem};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::integrand::{Evaluator, Integrand};
use crate::integrator::CancelToken;
use crate::scheduler::GlobalStack;
use crate::telemetry::Metrics;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub type WorkerId = usize;

/// Everything one `integrate` call shares between its workers.
pub(crate) struct SharedState<'a, I: ?Sized> {
    pub stack: GlobalStack,
    pub accumulator: ResultAccumulator,
    pub evaluator: Evaluator<'a, I>,
    pub rule: RefineRule,
    pub migration_threshold: usize,
    pub workers: usize,
    max_intervals: Option<u64>,
    refinements: AtomicU64,
    first_error: Mutex<Option<Error>>,
    cancel: Option<&'a CancelToken>,
    pub metrics: Option<&'a Metrics>,
}

impl<'a, I: Integrand + ?Sized> SharedState<'a, I> {
    pub fn new(
        integrand: &'a I,
        config: &Config,
        workers: usize,
        cancel: Option<&'a CancelToken>,
        metrics: Option<&'a Metrics>,
    ) -> Self {
        Self {
            stack: GlobalStack::new(),
            accumulator: ResultAccumulator::new(),
            evaluator: Evaluator::new(integrand),
            rule: RefineRule {
                tolerance: config.tolerance,
                min_width: config.min_width,
            },
            migration_threshold: config.migration_threshold,
            workers,
            max_intervals: config.max_intervals,
            refinements: AtomicU64::new(0),
            first_error: Mutex::new(None),
            cancel,
            metrics,
        }
    }

    /// Records the first error of the run and stops every worker.
    pub fn fail(&self, err: Error) {
        {
            let mut slot = self.first_error.lock();
            if slot.is_none() {
                tracing::warn!(error = %err, "aborting integration run");
                *slot = Some(err);
            }
        }
        self.stack.abort();
    }

    pub fn take_error(&self) -> Option<Error> {
        self.first_error.lock().take()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |token| token.is_cancelled())
    }

    fn charge_refinement(&self) -> Result<()> {
        let used = self.refinements.fetch_add(1, Ordering::Relaxed) + 1;
        match self.max_intervals {
            Some(limit) if used > limit => Err(Error::resource_exhausted(format!(
                "interval budget of {} refinements exceeded",
                limit
            ))),
            _ => Ok(()),
        }
    }
}

/// Per-worker counters, returned when the worker terminates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub id: WorkerId,
    /// Intervals taken off the global stack.
    pub global_takes: u64,
    /// Bisection steps performed.
    pub refinements: u64,
    /// Converged intervals added to the result.
    pub leaves: u64,
    pub local_pushes: u64,
    pub migration_attempts: u64,
    pub migrations: u64,
    pub migrated_entries: u64,
    pub max_local_depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WorkerState {
    WaitingForWork,
    Processing(Entry),
    Terminated,
}

pub(crate) struct Worker<'s, 'a, I: ?Sized> {
    id: WorkerId,
    shared: &'s SharedState<'a, I>,
    local: Vec<Entry>,
    stats: WorkerStats,
}

impl<'s, 'a, I: Integrand + ?Sized> Worker<'s, 'a, I> {
    pub fn new(id: WorkerId, shared: &'s SharedState<'a, I>) -> Self {
        Self {
            id,
            shared,
            local: Vec::new(),
            stats: WorkerStats {
                id,
                ..WorkerStats::default()
            },
        }
    }

    // main loop
    pub fn run(mut self) -> WorkerStats {
        let mut state = WorkerState::WaitingForWork;

        loop {
            state = match state {
                WorkerState::WaitingForWork => {
                    if self.shared.is_cancelled() {
                        self.shared.fail(Error::Cancelled);
                    }
                    match self.shared.stack.take() {
                        WorkItem::Stop => WorkerState::Terminated,
                        WorkItem::Interval(entry) => {
                            self.stats.global_takes += 1;
                            WorkerState::Processing(entry)
                        }
                    }
                }
                WorkerState::Processing(entry) => self.process(entry),
                WorkerState::Terminated => break,
            };
        }

        tracing::trace!(worker = self.id, refinements = self.stats.refinements, "worker terminated");
        self.stats
    }

    fn process(&mut self, entry: Entry) -> WorkerState {
        let start = Instant::now();

        if let Err(err) = self.refine_locally(entry) {
            self.shared.fail(err);
            return WorkerState::Terminated;
        }
        if self.shared.stack.is_halted() {
            return WorkerState::Terminated;
        }

        if let Some(metrics) = self.shared.metrics {
            metrics.record_refinement(start.elapsed().as_nanos() as u64);
        }

        match self.shared.stack.complete(self.shared.workers) {
            Ok(true) => {
                tracing::trace!(worker = self.id, "work exhausted, stopping pool");
                WorkerState::WaitingForWork
            }
            Ok(false) => WorkerState::WaitingForWork,
            Err(err) => {
                self.shared.fail(err);
                WorkerState::Terminated
            }
        }
    }

    /// Depth-first bisection of `seed` over the private stack until every
    /// descendant has converged.
    fn refine_locally(&mut self, seed: Entry) -> Result<()> {
        let mut current = seed;

        loop {
            if self.shared.stack.is_halted() {
                self.local.clear();
                return Ok(());
            }
            if self.shared.is_cancelled() {
                return Err(Error::Cancelled);
            }

            self.shared.charge_refinement()?;
            self.stats.refinements += 1;

            let evaluator = &self.shared.evaluator;
            match current.refine(self.shared.rule, |x| evaluator.eval(x))? {
                Refinement::Converged(contribution) => {
                    self.shared.accumulator.add(contribution)?;
                    self.stats.leaves += 1;

                    match self.local.pop() {
                        Some(next) => current = next,
                        None => return Ok(()),
                    }
                }
                Refinement::Split(left, right) => {
                    self.local.try_reserve(1)?;
                    self.local.push(left);
                    self.stats.local_pushes += 1;
                    self.stats.max_local_depth = self.stats.max_local_depth.max(self.local.len());

                    self.maybe_migrate()?;
                    current = right;
                }
            }
        }
    }

    fn maybe_migrate(&mut self) -> Result<()> {
        let threshold = self.shared.migration_threshold;
        if self.local.len() <= threshold {
            return Ok(());
        }

        self.stats.migration_attempts += 1;
        let moved = self.shared.stack.try_migrate(&mut self.local, threshold)?;
        if moved > 0 {
            self.stats.migrations += 1;
            self.stats.migrated_entries += moved as u64;
            tracing::trace!(worker = self.id, moved, "migrated entries to global stack");

            if let Some(metrics) = self.shared.metrics {
                metrics.record_migration(moved);
            }
        }

        Ok(())
    }
}
