//! Interval refinement infrastructure.
//!
//! This module provides the numeric kernel, the per-thread worker loop, the
//! result accumulator and the thread pool that runs one integration.

pub(crate) mod accumulator;
pub(crate) mod cpu_pool;
pub mod entry;
pub mod panic_handler;
pub mod worker;

pub use entry::{converged, trapezoid, Entry, RefineRule, Refinement, WorkItem};
pub use panic_handler::{PanicHandler, PanicInfo};
pub use worker::{WorkerId, WorkerStats};

pub(crate) use cpu_pool::CpuPool;
pub(crate) use worker::SharedState;
