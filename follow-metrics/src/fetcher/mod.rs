//! Batch fetcher for user records.
//!
//! Turns an ordered list of account IDs into a map of resolved users:
//!
//! 1. IDs already in the lookup cache are answered from it
//! 2. The rest are split into batches of up to 100 and requested in order
//! 3. 429 responses wait for the reset hint and retry the same batch;
//!    other failures retry after a fixed delay, a bounded number of times
//! 4. Newly resolved users are merged into the cache and saved once
//!
//! Waits go through a cancellable [`Waiter`], so a long rate limit backoff
//! can be interrupted without losing what was already fetched.

mod batch;
mod error;
mod lookup;
mod policy;
mod waiter;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use batch::{BATCH_SIZE, BatchFetcher, FetchOutcome, FetchStats};
pub use error::{BatchFailure, FetchError};
pub use lookup::UserLookup;
pub use policy::RetryPolicy;
pub use waiter::{Cancelled, Waiter};
