pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::WorkerStats;
pub use crate::integrand::{Fallible, Integrand};
pub use crate::integrator::{CancelToken, IntegrationReport, Integrator};
pub use crate::integrate;

pub use crate::telemetry::MetricsSnapshot;
