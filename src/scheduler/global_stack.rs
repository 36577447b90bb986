use crate::error::Result;
use crate::executor::{Entry, WorkItem};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared pool of unclaimed work plus the active-worker counter.
///
/// The stack and the counter live under one mutex so that "last worker went
/// idle" and "no work left" are observed together. A condition variable on the
/// same mutex signals that at least one item is available.
#[derive(Debug)]
pub struct GlobalStack {
    state: Mutex<StackState>,
    available: Condvar,
    halted: AtomicBool,
}

#[derive(Debug, Default)]
struct StackState {
    items: Vec<WorkItem>,
    active: usize,
    aborted: bool,
}

impl GlobalStack {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StackState::default()),
            available: Condvar::new(),
            halted: AtomicBool::new(false),
        }
    }

    pub fn push(&self, item: WorkItem) -> Result<()> {
        let mut state = self.state.lock();
        state.items.try_reserve(1)?;
        state.items.push(item);
        drop(state);

        self.available.notify_one();
        Ok(())
    }

    /// Blocks until an item is available and pops it.
    ///
    /// Taking an `Interval` marks the caller active in the same critical section.
    /// Once the run is aborted every caller receives `Stop`.
    pub fn take(&self) -> WorkItem {
        let mut state = self.state.lock();
        loop {
            if state.aborted {
                return WorkItem::Stop;
            }
            if let Some(item) = state.items.pop() {
                if let WorkItem::Interval(_) = item {
                    state.active += 1;
                }
                return item;
            }
            self.available.wait(&mut state);
        }
    }

    /// Moves the oldest local entries here when the global stack is empty,
    /// leaving `keep` entries behind. Returns how many were moved.
    pub fn try_migrate(&self, local: &mut Vec<Entry>, keep: usize) -> Result<usize> {
        let count = local.len().saturating_sub(keep);
        if count == 0 {
            return Ok(0);
        }

        let mut state = self.state.lock();
        if state.aborted || !state.items.is_empty() {
            return Ok(0);
        }

        state.items.try_reserve(count)?;
        state
            .items
            .extend(local.drain(..count).map(WorkItem::Interval));
        drop(state);

        self.available.notify_all();
        Ok(count)
    }

    /// Marks the caller idle. When nobody is active and nothing is queued, pushes
    /// one `Stop` per worker and returns `true`.
    pub fn complete(&self, workers: usize) -> Result<bool> {
        let mut state = self.state.lock();
        debug_assert!(state.active > 0, "complete() without a matching take()");
        state.active = state.active.saturating_sub(1);

        if state.active != 0 || !state.items.is_empty() {
            return Ok(false);
        }

        state.items.try_reserve(workers)?;
        state
            .items
            .extend(std::iter::repeat(WorkItem::Stop).take(workers));
        drop(state);

        self.available.notify_all();
        Ok(true)
    }

    /// Stops the run: wakes every waiter and makes `take` return `Stop`.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        state.aborted = true;
        self.halted.store(true, Ordering::Release);
        drop(state);

        self.available.notify_all();
    }

    /// Lock-free check for workers in the middle of local refinement.
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn active(&self) -> usize {
        self.state.lock().active
    }
}

impl Default for GlobalStack {
    fn default() -> Self {
        Self::new()
    }
}
