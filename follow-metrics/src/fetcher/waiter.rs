//! Cancellable timed waits.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// The wait was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wait cancelled")]
pub struct Cancelled;

/// Sleeps that can be interrupted through a [`CancellationToken`].
///
/// Backoff waits can last up to fifteen minutes. Cancelling the token wakes
/// any in-progress wait and makes every later wait fail immediately.
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    cancel: CancellationToken,
}

impl Waiter {
    /// Create a waiter driven by the given token.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Wait for `duration` unless cancelled first.
    pub async fn wait(&self, duration: Duration) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        if duration.is_zero() {
            return Ok(());
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The token driving this waiter.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}
