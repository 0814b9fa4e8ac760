use crate::draft::IntentError;
use policy_inference::InferenceError;
use policy_protocol::{ErrorCode, ErrorEnvelope, ValidationError};
use policy_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Query must not be empty")]
    InvalidQuery,

    #[error("Submission failed validation ({} errors)", .0.len())]
    InvalidSubmission(Vec<ValidationError>),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Could not read drafting intent: {0}")]
    Intent(#[from] IntentError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Caller-facing form. Engine and store details stay in the logs.
    pub fn to_envelope(&self) -> ErrorEnvelope {
        match self {
            Self::InvalidQuery => ErrorEnvelope::invalid("Query is required", Vec::new()),
            Self::InvalidSubmission(errors) => {
                ErrorEnvelope::invalid("Validation failed", errors.clone())
            }
            Self::Inference(err) => match err {
                InferenceError::StartupFailure { .. } => {
                    ErrorEnvelope::generic(ErrorCode::ServiceUnavailable, false)
                }
                InferenceError::Timeout(_) | InferenceError::QueueTimeout(_) => {
                    ErrorEnvelope::generic(ErrorCode::Timeout, true)
                }
                InferenceError::InferenceFailure { .. } => {
                    ErrorEnvelope::generic(ErrorCode::InferenceFailed, false)
                }
                InferenceError::IoError(_) => ErrorEnvelope::generic(ErrorCode::Internal, false),
            },
            Self::Intent(_) => ErrorEnvelope::generic(ErrorCode::InferenceFailed, false),
            Self::Store(_) => ErrorEnvelope::generic(ErrorCode::ServiceUnavailable, true),
            Self::Config(_) => ErrorEnvelope::generic(ErrorCode::Internal, false),
        }
    }
}
