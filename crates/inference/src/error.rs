use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, InferenceError>;

#[derive(Error, Debug)]
pub enum InferenceError {
    /// The engine binary could not be started (missing, not executable, ...).
    #[error("Failed to start inference engine {binary:?}: {source}")]
    StartupFailure {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Inference timed out after {0:?}")]
    Timeout(Duration),

    /// The engine exited abnormally without writing anything to stdout.
    /// `diagnostics` holds the tail of its filtered stderr, for logs only.
    #[error("Inference engine exited with code {code} and produced no output")]
    InferenceFailure { code: i32, diagnostics: String },

    #[error("Timed out after {0:?} waiting for a free inference slot")]
    QueueTimeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl InferenceError {
    /// Failures a caller may reasonably retry later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::QueueTimeout(_))
    }

    /// Configuration problems rather than engine-reported problems.
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::StartupFailure { .. })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid engine configuration: {field} {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
