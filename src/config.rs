use crate::error::{Error, Result};

/// Relative tolerance used by the convergence test unless overridden.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Local stack depth above which a worker tries to hand work back to the pool.
pub const DEFAULT_MIGRATION_THRESHOLD: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: Option<usize>,
    pub tolerance: f64,
    pub migration_threshold: usize,

    /// Entries at most this wide are resolved with their coarse estimate.
    pub min_width: f64,

    /// Upper bound on refine steps for one run.
    pub max_intervals: Option<u64>,

    #[cfg(feature = "telemetry")]
    pub enable_telemetry: bool,

    pub pin_workers: bool,
    pub stack_size: Option<usize>,
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            tolerance: DEFAULT_TOLERANCE,
            migration_threshold: DEFAULT_MIGRATION_THRESHOLD,
            min_width: 0.0,
            max_intervals: None,

            #[cfg(feature = "telemetry")]
            enable_telemetry: true,

            pin_workers: false,
            stack_size: Some(2 * 1024 * 1024),
            thread_name_prefix: "gstack-worker".to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
        }

        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(Error::config("tolerance must be finite and > 0"));
        }

        if !self.min_width.is_finite() || self.min_width < 0.0 {
            return Err(Error::config("min_width must be finite and >= 0"));
        }

        if self.max_intervals == Some(0) {
            return Err(Error::config("max_intervals must be > 0"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn tolerance(mut self, eps: f64) -> Self {
        self.config.tolerance = eps;
        self
    }

    pub fn migration_threshold(mut self, depth: usize) -> Self {
        self.config.migration_threshold = depth;
        self
    }

    pub fn min_width(mut self, width: f64) -> Self {
        self.config.min_width = width;
        self
    }

    pub fn max_intervals(mut self, limit: u64) -> Self {
        self.config.max_intervals = Some(limit);
        self
    }

    #[cfg(feature = "telemetry")]
    pub fn enable_telemetry(mut self, enable: bool) -> Self {
        self.config.enable_telemetry = enable;
        self
    }

    pub fn pin_workers(mut self, pin: bool) -> Self {
        self.config.pin_workers = pin;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
