use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod draft;
pub mod form;

pub use draft::{
    DraftResponse, DraftSection, FeasibilityReport, FeasibilityStatus, PolicyIntent,
    DEFAULT_POLICY_TYPE,
};
pub use form::{validate_policy_form, validate_policy_id, PolicyFormData, ValidationError};

/// Message shown to the end user whenever the pipeline fails without recovery.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

pub const CONFLICTS_DETECTED_MESSAGE: &str =
    "Conflicts detected. Please review suggestions before saving.";
pub const NO_CONFLICTS_MESSAGE: &str = "No conflicts detected. Policy is ready to save.";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Department {
    Health,
    Finance,
    Education,
    Environment,
    Agriculture,
}

impl Department {
    pub const ALL: [Department; 5] = [
        Self::Health,
        Self::Finance,
        Self::Education,
        Self::Environment,
        Self::Agriculture,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Finance => "finance",
            Self::Education => "education",
            Self::Environment => "environment",
            Self::Agriculture => "agriculture",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document cited by an answer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct SourceRef {
    pub title: String,
    pub department: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct AnswerResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    pub message: String,
}

impl ConflictCheckResponse {
    pub fn clear() -> Self {
        Self {
            has_conflict: false,
            conflicts: None,
            suggestions: None,
            message: NO_CONFLICTS_MESSAGE.to_string(),
        }
    }

    pub fn conflicting(conflicts: Vec<String>, suggestions: Vec<String>) -> Self {
        Self {
            has_conflict: true,
            conflicts: Some(conflicts),
            suggestions: Some(suggestions),
            message: CONFLICTS_DETECTED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPolicyResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ServiceUnavailable,
    Timeout,
    InferenceFailed,
    InvalidRequest,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "service_unavailable",
            Self::Timeout => "timeout",
            Self::InferenceFailed => "inference_failed",
            Self::InvalidRequest => "invalid_request",
            Self::Internal => "internal",
        }
    }
}

/// What the caller sees when a request fails. `message` never carries engine diagnostics.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default)]
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationError>,
}

impl ErrorEnvelope {
    pub fn generic(code: ErrorCode, retryable: bool) -> Self {
        Self {
            code,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
            retryable,
            validation: Vec::new(),
        }
    }

    pub fn invalid(message: impl Into<String>, validation: Vec<ValidationError>) -> Self {
        Self {
            code: ErrorCode::InvalidRequest,
            message: message.into(),
            retryable: false,
            validation,
        }
    }
}
