//! X API client error types.

use std::time::Duration;

/// Errors from a user lookup request.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the API; retry after `reset_after` if known
    #[error("rate limited by X API")]
    RateLimited { reset_after: Option<Duration> },

    /// Credentials rejected
    #[error("unauthorized ({status}): check X API credentials")]
    Unauthorized { status: u16 },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON deserialization failed. `body` holds the start of the response.
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// The request could not be built (bad credentials format, bad URL)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LookupError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limiting is not covered here: it always warrants a retry, but
    /// after a mandatory wait rather than the fixed retry delay.
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Http(_) | LookupError::Api { .. } | LookupError::Json { .. } => true,
            LookupError::RateLimited { .. } => true,
            LookupError::Unauthorized { .. } | LookupError::InvalidRequest(_) => false,
        }
    }
}
