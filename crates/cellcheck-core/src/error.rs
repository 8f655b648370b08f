//! Error types for the interview engine and its LLM collaborators.
//!
//! `ProviderError` lives here rather than in `cellcheck-providers` so the
//! gateway can classify upstream failures without string matching.

use thiserror::Error;

/// Errors surfaced to callers of the interview engine.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Session creation parameters were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No session is registered under the given id.
    #[error("session not found: {0}")]
    NotFound(String),

    /// The operation is not valid for the session's current phase.
    #[error("invalid state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    /// The report was requested before the session completed.
    #[error("report not ready: {0}")]
    NotReady(String),

    /// Something went wrong inside the engine itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AssessmentError {
    pub(crate) fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AssessmentError::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Short machine-readable code used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            AssessmentError::InvalidConfiguration(_) => "invalid_configuration",
            AssessmentError::NotFound(_) => "not_found",
            AssessmentError::InvalidState { .. } => "invalid_state",
            AssessmentError::NotReady(_) => "not_ready",
            AssessmentError::Internal(_) => "internal",
        }
    }
}

/// Failure of the LLM gateway. Callers are expected to fall back.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },
}

impl GatewayError {
    pub fn upstream(reason: impl Into<String>) -> Self {
        GatewayError::UpstreamUnavailable {
            reason: reason.into(),
        }
    }
}

/// Errors that can occur when interacting with an LLM provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if retrying cannot succeed without operator action.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }
}
