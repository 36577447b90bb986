//! Functions that can be integrated, and the checked evaluator used by workers.

use crate::error::{Error, Result};
use crate::executor::PanicHandler;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A real function of one real variable, shareable across worker threads.
///
/// Implemented for every `Fn(f64) -> f64 + Sync`. Integrands that can fail
/// are wrapped in [`Fallible`].
pub trait Integrand: Sync {
    fn eval(&self, x: f64) -> std::result::Result<f64, String>;
}

impl<F> Integrand for F
where
    F: Fn(f64) -> f64 + Sync,
{
    fn eval(&self, x: f64) -> std::result::Result<f64, String> {
        Ok(self(x))
    }
}

/// Adapter for integrands returning `Result`; an `Err` aborts the run with
/// [`Error::EvaluationFailed`].
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F>(pub F);

impl<F, E> Integrand for Fallible<F>
where
    F: Fn(f64) -> std::result::Result<f64, E> + Sync,
    E: fmt::Display,
{
    fn eval(&self, x: f64) -> std::result::Result<f64, String> {
        (self.0)(x).map_err(|e| e.to_string())
    }
}

/// Wraps an integrand with panic isolation, finiteness checks and a call counter.
pub(crate) struct Evaluator<'f, I: ?Sized> {
    integrand: &'f I,
    panics: PanicHandler,
    evaluations: AtomicU64,
}

impl<'f, I: Integrand + ?Sized> Evaluator<'f, I> {
    pub fn new(integrand: &'f I) -> Self {
        Self {
            integrand,
            panics: PanicHandler::new(),
            evaluations: AtomicU64::new(0),
        }
    }

    pub fn eval(&self, x: f64) -> Result<f64> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        let value = match self.panics.execute(|| self.integrand.eval(x)) {
            Ok(Ok(value)) => value,
            Ok(Err(message)) => return Err(Error::evaluation_failed(x, message)),
            Err(info) => {
                return Err(Error::evaluation_failed(
                    x,
                    format!("panicked: {}", info.message),
                ))
            }
        };

        if !value.is_finite() {
            return Err(Error::NonFiniteResult { x, value });
        }

        Ok(value)
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl<I: ?Sized> fmt::Debug for Evaluator<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("evaluations", &self.evaluations.load(Ordering::Relaxed))
            .field("panics", &self.panics.panic_count())
            .finish()
    }
}
