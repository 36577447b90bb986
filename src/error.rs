pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid integration bounds [{lo}, {hi}]")]
    InvalidBounds { lo: f64, hi: f64 },

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("integrand failed at x = {x}: {message}")]
    EvaluationFailed { x: f64, message: String },

    #[error("non-finite value {value} at x = {x}")]
    NonFiniteResult { x: f64, value: f64 },

    #[error("accumulated integral {0} is not finite")]
    NonFiniteSum(f64),

    #[error("integration cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("executor error: {0}")]
    Executor(String),

    #[error("worker panic: {0}")]
    WorkerPanic(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn executor<S: Into<String>>(msg: S) -> Self {
        Error::Executor(msg.into())
    }

    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        Error::ResourceExhausted(msg.into())
    }

    pub fn evaluation_failed<S: Into<String>>(x: f64, msg: S) -> Self {
        Error::EvaluationFailed {
            x,
            message: msg.into(),
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(err: std::collections::TryReserveError) -> Self {
        Error::ResourceExhausted(format!("stack growth failed: {}", err))
    }
}
