//! Error taxonomy for the Anthropic adapter.

use thiserror::Error;

/// Errors raised by the language-model HTTP adapter.
#[derive(Debug, Error)]
pub enum LlmApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API server error: {0}")]
    ServerError(String),

    #[error("API server overloaded")]
    Overloaded,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Response contained no usable content")]
    EmptyResponse,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmApiError {
    /// Whether the retry policy should try again.
    ///
    /// Client-side mistakes (bad request, bad key) and empty responses are
    /// permanent; throttling, server faults, and transport errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmApiError::RateLimited
                | LlmApiError::ServerError(_)
                | LlmApiError::Overloaded
                | LlmApiError::Network(_)
                | LlmApiError::Timeout
        )
    }

    /// Map an HTTP status code and body to an error variant.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 => LlmApiError::InvalidRequest(body),
            401 | 403 => LlmApiError::AuthenticationFailed(body),
            429 => LlmApiError::RateLimited,
            529 => LlmApiError::Overloaded,
            code if (500..600).contains(&code) => LlmApiError::ServerError(body),
            _ => LlmApiError::Unknown(format!("HTTP {status}: {body}")),
        }
    }
}

impl From<reqwest::Error> for LlmApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmApiError::Timeout
        } else {
            LlmApiError::Network(err.to_string())
        }
    }
}
