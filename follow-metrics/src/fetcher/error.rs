//! Batch failure types.

use crate::domain::AccountId;
use crate::x_api::LookupError;

/// Why a batch produced no users.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transient failures persisted past the retry limit
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last_error: LookupError,
    },

    /// Still rate limited after the allowed number of waits
    #[error("still rate limited after {waits} waits")]
    RateLimitExhausted { waits: u32 },

    /// A failure no retry can fix (bad credentials); stops the whole fetch
    #[error("fatal lookup error: {0}")]
    Fatal(#[source] LookupError),

    /// The fetch was cancelled while this batch was in progress
    #[error("cancelled")]
    Cancelled,

    /// Skipped because an earlier batch failed fatally or was cancelled
    #[error("not attempted")]
    NotAttempted,
}

/// A batch whose identifiers are absent from the fetch result.
#[derive(Debug)]
pub struct BatchFailure {
    /// Zero-based batch position among the fetched (non-cached) IDs.
    pub index: usize,
    pub ids: Vec<AccountId>,
    pub error: FetchError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::RetriesExhausted {
            attempts: 4,
            last_error: LookupError::Api {
                status: 500,
                message: "boom".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "gave up after 4 attempts: API error 500: boom"
        );

        let err = FetchError::RateLimitExhausted { waits: 5 };
        assert_eq!(err.to_string(), "still rate limited after 5 waits");

        assert_eq!(FetchError::NotAttempted.to_string(), "not attempted");
    }
}
