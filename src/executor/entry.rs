//! Interval entries and the trapezoid refinement kernel.

use crate::error::{Error, Result};

/// One sub-interval of the integration domain with cached endpoint values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entry {
    pub left: f64,
    pub right: f64,
    pub f_left: f64,
    pub f_right: f64,
    /// Trapezoid estimate over `[left, right]` from the two endpoint values.
    pub coarse: f64,
}

impl Entry {
    pub fn new(left: f64, right: f64, f_left: f64, f_right: f64) -> Self {
        Self {
            left,
            right,
            f_left,
            f_right,
            coarse: trapezoid(left, right, f_left, f_right),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn midpoint(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    /// An entry that cannot be bisected any further.
    pub fn is_degenerate(&self, min_width: f64) -> bool {
        let mid = self.midpoint();
        self.width() <= min_width || !(self.left < mid && mid < self.right)
    }

    /// Bisects the entry once and tests the refined estimate against the coarse one.
    ///
    /// `eval` is called at most once, with the midpoint. Degenerate entries are
    /// resolved with their coarse estimate without calling it.
    pub fn refine<E>(&self, rule: RefineRule, eval: E) -> Result<Refinement>
    where
        E: FnOnce(f64) -> Result<f64>,
    {
        let mid = self.midpoint();
        if self.is_degenerate(rule.min_width) {
            return finite(mid, self.coarse).map(Refinement::Converged);
        }

        let f_mid = eval(mid)?;

        let left = Entry::new(self.left, mid, self.f_left, f_mid);
        let right = Entry::new(mid, self.right, f_mid, self.f_right);
        let refined = finite(mid, left.coarse + right.coarse)?;

        if converged(self.coarse, refined, rule.tolerance) {
            Ok(Refinement::Converged(refined))
        } else {
            Ok(Refinement::Split(left, right))
        }
    }
}

/// Item stored on the global stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkItem {
    Interval(Entry),
    /// Wakes and terminates exactly one worker.
    Stop,
}

/// Outcome of one bisection step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refinement {
    Converged(f64),
    Split(Entry, Entry),
}

/// Parameters of the convergence test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineRule {
    pub tolerance: f64,
    pub min_width: f64,
}

/// Halves before adding so endpoint values near `f64::MAX` do not overflow.
pub fn trapezoid(left: f64, right: f64, f_left: f64, f_right: f64) -> f64 {
    (f_left / 2.0 + f_right / 2.0) * (right - left)
}

// An estimate that overflowed can never pass the convergence test.
fn finite(x: f64, estimate: f64) -> Result<f64> {
    if estimate.is_finite() {
        Ok(estimate)
    } else {
        Err(Error::NonFiniteResult { x, value: estimate })
    }
}

/// Relative test `|coarse - refined| < eps * |refined|`, absolute when `refined == 0`.
///
/// Equality with the bound is not convergence.
pub fn converged(coarse: f64, refined: f64, tolerance: f64) -> bool {
    let diff = (coarse - refined).abs();
    if refined == 0.0 {
        diff < tolerance
    } else {
        diff < tolerance * refined.abs()
    }
}
