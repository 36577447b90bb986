use crate::error::{Error, Result};
use parking_lot::Mutex;

/// Running sum of leaf contributions, guarded by its own lock.
///
/// Never locked together with the global stack.
#[derive(Debug, Default)]
pub(crate) struct ResultAccumulator {
    sum: Mutex<f64>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self {
            sum: Mutex::new(0.0),
        }
    }

    /// Adds one leaf; fails once the running sum leaves the finite range.
    pub fn add(&self, contribution: f64) -> Result<()> {
        let mut sum = self.sum.lock();
        *sum += contribution;
        if sum.is_finite() {
            Ok(())
        } else {
            Err(Error::NonFiniteSum(*sum))
        }
    }

    pub fn value(&self) -> f64 {
        *self.sum.lock()
    }
}
