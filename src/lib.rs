//! gstack - parallel adaptive quadrature over a global work stack
//!
//! Integrates a real function by repeated trapezoid bisection. Work is spread
//! over a fixed pool of threads: unclaimed intervals sit on one shared stack,
//! each worker refines its interval depth-first on a private stack, and hands
//! the widest pending pieces back whenever the shared stack runs dry.
//!
//! # Quick Start
//!
//! ```no_run
//! let value = gstack_rs::integrate(|x: f64| x * x, 0.0, 1.0, None).unwrap();
//! assert!((value - 1.0 / 3.0).abs() < 1e-3);
//! ```
//!
//! # Features
//!
//! - **Load balancing**: idle workers pick up intervals migrated from busy ones
//! - **Termination detection**: the pool stops itself once every interval converged
//! - **Failure isolation**: panics, errors and non-finite values in the integrand
//!   abort the run cleanly instead of hanging the pool
//! - **Cancellation**: cooperative, via [`CancelToken`]
//! - **Telemetry**: refinement latency and migration counters (optional)

// Lint configuration
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod integrand;
pub mod integrator;
pub mod prelude;
pub mod scheduler;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use integrand::{Fallible, Integrand};
pub use integrator::{CancelToken, IntegrationReport, Integrator};

/// Integrates `f` over `[lo, hi]` with default settings.
///
/// `worker_count` falls back to the number of available CPUs.
pub fn integrate<I: Integrand>(f: I, lo: f64, hi: f64, worker_count: Option<usize>) -> Result<f64> {
    let mut builder = Config::builder();
    if let Some(n) = worker_count {
        builder = builder.num_threads(n);
    }
    Integrator::new(builder.build()?)?.integrate(f, lo, hi)
}
