//! Batched user lookup with caching, rate limit backoff and retries.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::cache::LookupCache;
use crate::domain::{AccountId, UserInfo, UserMap};
use crate::x_api::{LookupError, MAX_IDS_PER_REQUEST};

use super::error::{BatchFailure, FetchError};
use super::lookup::UserLookup;
use super::policy::RetryPolicy;
use super::waiter::Waiter;

/// IDs per lookup request; the API's hard maximum.
pub const BATCH_SIZE: usize = MAX_IDS_PER_REQUEST;

/// Counters describing one fetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Distinct IDs asked for.
    pub requested: usize,
    /// IDs answered from the lookup cache.
    pub cache_hits: usize,
    /// HTTP lookups issued, including retries.
    pub requests: usize,
    /// Users resolved by the API in this run.
    pub fetched: usize,
    /// Responses that signalled rate limiting.
    pub rate_limited: usize,
    /// Transient retries performed.
    pub retries: usize,
}

/// Result of a fetch run.
///
/// `users` contains only identifiers that resolved; callers must handle
/// absence. Every batch that contributed nothing is listed in `failures`.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub users: UserMap,
    pub failures: Vec<BatchFailure>,
    pub stats: FetchStats,
}

impl FetchOutcome {
    /// Whether every batch completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of IDs in abandoned batches.
    pub fn failed_ids(&self) -> usize {
        self.failures.iter().map(|f| f.ids.len()).sum()
    }
}

/// Resolves account IDs to user records, one batch at a time.
///
/// Batches run strictly in input order with at most one request in flight.
/// Failures never escape: they degrade to missing entries plus a
/// [`BatchFailure`] record.
pub struct BatchFetcher<L: UserLookup> {
    lookup: L,
    cache: Option<LookupCache>,
    policy: RetryPolicy,
    waiter: Waiter,
}

impl<L: UserLookup> BatchFetcher<L> {
    /// Create a fetcher without a lookup cache.
    pub fn new(lookup: L, policy: RetryPolicy) -> Self {
        Self {
            lookup,
            cache: None,
            policy,
            waiter: Waiter::default(),
        }
    }

    /// Attach the on-disk lookup cache.
    pub fn with_cache(mut self, cache: LookupCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use the given waiter, e.g. one whose token is cancelled on Ctrl-C.
    pub fn with_waiter(mut self, waiter: Waiter) -> Self {
        self.waiter = waiter;
        self
    }

    /// Access the underlying lookup.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve `ids` to user records.
    ///
    /// With `use_cache`, IDs already in the cache are answered from it and
    /// only the misses are requested; newly fetched users are merged into
    /// the cache and saved once at the end.
    pub async fn fetch(&self, ids: &[AccountId], use_cache: bool) -> FetchOutcome {
        let cache = if use_cache { self.cache.as_ref() } else { None };
        let mut cached = cache.map(load_or_empty).unwrap_or_default();

        // Cached keys are the API's canonical form, which may differ in case
        let folded: HashMap<String, AccountId> = cached
            .keys()
            .map(|key| (key.as_str().to_ascii_lowercase(), key.clone()))
            .collect();

        let mut outcome = FetchOutcome::default();
        let mut seen = HashSet::new();
        let mut misses = Vec::new();

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            let hit = cached.get(id).or_else(|| {
                folded
                    .get(&id.as_str().to_ascii_lowercase())
                    .and_then(|key| cached.get(key))
            });
            match hit {
                Some(user) => {
                    outcome.users.insert(user.id.clone(), user.clone());
                    outcome.stats.cache_hits += 1;
                }
                None => misses.push(id.clone()),
            }
        }
        outcome.stats.requested = seen.len();

        if misses.is_empty() {
            info!(
                hits = outcome.stats.cache_hits,
                "All requested users found in cache"
            );
            return outcome;
        }

        let batch_count = misses.len().div_ceil(BATCH_SIZE);
        info!(
            misses = misses.len(),
            hits = outcome.stats.cache_hits,
            batches = batch_count,
            "Fetching user info"
        );

        let mut fetched = UserMap::new();
        let mut batches = misses.chunks(BATCH_SIZE).enumerate();

        while let Some((index, batch)) = batches.next() {
            match self.fetch_batch(index, batch, &mut outcome.stats).await {
                Ok(users) => {
                    info!(
                        batch = index + 1,
                        of = batch_count,
                        resolved = users.len(),
                        "Batch complete"
                    );
                    for user in users {
                        fetched.insert(user.id.clone(), user);
                    }
                }
                Err(error) => {
                    warn!(batch = index + 1, of = batch_count, error = %error, "Abandoning batch");
                    let stop = matches!(error, FetchError::Fatal(_) | FetchError::Cancelled);
                    outcome.failures.push(BatchFailure {
                        index,
                        ids: batch.to_vec(),
                        error,
                    });

                    if stop {
                        for (index, batch) in batches.by_ref() {
                            outcome.failures.push(BatchFailure {
                                index,
                                ids: batch.to_vec(),
                                error: FetchError::NotAttempted,
                            });
                        }
                    }
                }
            }
        }

        outcome.stats.fetched = fetched.len();
        outcome
            .users
            .extend(fetched.iter().map(|(k, v)| (k.clone(), v.clone())));

        if let Some(cache) = cache
            && !fetched.is_empty()
        {
            cached.extend(fetched);
            match cache.save(&cached) {
                Ok(()) => debug!(
                    entries = cached.len(),
                    path = %cache.path().display(),
                    "Saved lookup cache"
                ),
                Err(e) => warn!(error = %e, "Failed to save lookup cache"),
            }
        }

        outcome
    }

    /// Run one batch to completion: success, abandonment, or cancellation.
    async fn fetch_batch(
        &self,
        index: usize,
        batch: &[AccountId],
        stats: &mut FetchStats,
    ) -> Result<Vec<UserInfo>, FetchError> {
        let mut retries = 0u32;
        let mut rate_limit_waits = 0u32;

        loop {
            if self.waiter.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            stats.requests += 1;
            debug!(
                batch = index + 1,
                size = batch.len(),
                retries,
                "Requesting user batch"
            );

            let error = match self.lookup.lookup_users(batch).await {
                Ok(users) => return Ok(retain_requested(batch, users)),
                Err(error) => error,
            };

            match error {
                LookupError::RateLimited { reset_after } => {
                    stats.rate_limited += 1;
                    if rate_limit_waits >= self.policy.max_rate_limit_waits {
                        return Err(FetchError::RateLimitExhausted {
                            waits: rate_limit_waits,
                        });
                    }
                    rate_limit_waits += 1;

                    let wait = reset_after.unwrap_or(self.policy.default_rate_limit_wait);
                    if self.policy.skip_rate_limit_waits {
                        info!(
                            wait_secs = wait.as_secs(),
                            "Rate limited; skipping wait in fast mode"
                        );
                    } else {
                        warn!(wait_secs = wait.as_secs(), "Rate limited; waiting for reset");
                        self.waiter
                            .wait(wait)
                            .await
                            .map_err(|_| FetchError::Cancelled)?;
                    }
                }
                error if !error.is_retryable() => return Err(FetchError::Fatal(error)),
                error => {
                    if retries >= self.policy.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            attempts: retries + 1,
                            last_error: error,
                        });
                    }
                    retries += 1;
                    stats.retries += 1;
                    warn!(
                        error = %error,
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        delay_secs = self.policy.retry_delay.as_secs(),
                        "Batch request failed, retrying"
                    );
                    self.waiter
                        .wait(self.policy.retry_delay)
                        .await
                        .map_err(|_| FetchError::Cancelled)?;
                }
            }
        }
    }
}

fn load_or_empty(cache: &LookupCache) -> UserMap {
    match cache.load() {
        Ok(Some(users)) => {
            debug!(entries = users.len(), "Loaded lookup cache");
            users
        }
        Ok(None) => {
            debug!(path = %cache.path().display(), "No lookup cache yet");
            UserMap::new()
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable lookup cache");
            UserMap::new()
        }
    }
}

/// Keep at most one returned user per requested ID, in batch order.
///
/// The API may return an ID in a different canonical form (e.g. casing), so
/// matching is ASCII case-insensitive with exact matches preferred; the
/// returned ID is kept as the key. Users matching nothing are dropped.
fn retain_requested(batch: &[AccountId], users: Vec<UserInfo>) -> Vec<UserInfo> {
    let mut chosen: Vec<Option<UserInfo>> = vec![None; batch.len()];

    for user in users {
        let exact = batch.iter().position(|id| *id == user.id);
        let slot = exact.or_else(|| {
            batch
                .iter()
                .position(|id| id.as_str().eq_ignore_ascii_case(user.id.as_str()))
        });

        let Some(slot) = slot else {
            warn!(id = %user.id, "Lookup returned an unrequested user; ignoring");
            continue;
        };

        let replace = match &chosen[slot] {
            None => true,
            Some(existing) => exact.is_some() && existing.id != batch[slot],
        };
        if replace {
            chosen[slot] = Some(user);
        } else {
            debug!(id = %user.id, "Lookup returned a duplicate user; ignoring");
        }
    }

    chosen.into_iter().flatten().collect()
}
