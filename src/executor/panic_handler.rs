use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Catches panics raised by integrands and worker bodies so a single failure
/// can be reported instead of tearing down the whole pool.
#[derive(Debug, Default)]
pub struct PanicHandler {
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new() -> Self {
        Self {
            panic_count: AtomicUsize::new(0),
        }
    }

    pub fn execute<F, R>(&self, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Ok(result),
            Err(payload) => {
                self.panic_count.fetch_add(1, Ordering::Relaxed);
                Err(PanicInfo::from_payload(payload))
            }
        }
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct PanicInfo {
    pub message: String,
}

impl PanicInfo {
    pub(crate) fn from_payload(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_caught() {
        let handler = PanicHandler::new();

        let result = handler.execute(|| {
            panic!("test panic");
        });

        assert_eq!(result.unwrap_err().message, "test panic");
        assert_eq!(handler.panic_count(), 1);
    }

    #[test]
    fn test_success_passes_through() {
        let handler = PanicHandler::new();

        let result = handler.execute(|| 42);

        assert_eq!(result.unwrap(), 42);
        assert_eq!(handler.panic_count(), 0);
    }

    #[test]
    fn test_formatted_payload() {
        let handler = PanicHandler::new();

        for i in 0..3 {
            let err = handler.execute(|| panic!("bad {}", i)).unwrap_err();
            assert_eq!(err.message, format!("bad {}", i));
        }

        assert_eq!(handler.panic_count(), 3);
    }
}
