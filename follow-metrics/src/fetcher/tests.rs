//! Unit tests for the batch fetcher.

use std::time::Duration;

use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use super::mock::{MockLookup, account, accounts, user};
use super::*;
use crate::cache::{LookupCache, LookupCacheConfig};
use crate::domain::UserMap;
use crate::x_api::LookupError;

/// Policy with no delays so tests never sleep.
fn instant_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_retry_delay(Duration::ZERO)
        .with_default_rate_limit_wait(Duration::ZERO)
}

fn api_error() -> LookupError {
    LookupError::Api {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

fn numbered(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}", 1000 + i)).collect()
}

#[tokio::test]
async fn resolves_users_in_one_batch() {
    let lookup = MockLookup::with_users([user("111"), user("222"), user("333")]);
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&accounts(&["111", "222"]), false).await;

    assert_eq!(outcome.users.len(), 2);
    assert!(outcome.is_complete());
    assert_eq!(outcome.stats.requests, 1);
    assert_eq!(outcome.stats.fetched, 2);
    assert_eq!(fetcher.lookup().call_count(), 1);
}

#[tokio::test]
async fn partial_match_returns_only_resolved() {
    let lookup = MockLookup::with_users([user("111")]);
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&accounts(&["111", "222"]), false).await;

    assert_eq!(outcome.users.len(), 1);
    assert!(outcome.users.contains_key(&account("111")));
    assert!(outcome.is_complete());
}

#[tokio::test]
async fn batches_are_capped_and_in_order() {
    let raw = numbered(250);
    let ids: Vec<_> = raw.iter().map(|s| account(s)).collect();
    let lookup = MockLookup::with_users(raw.iter().map(|s| user(s)));
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&ids, false).await;

    let calls = fetcher.lookup().calls();
    let sizes: Vec<usize> = calls.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(calls[0][0], ids[0]);
    assert_eq!(calls[1][0], ids[100]);
    assert_eq!(calls[2][49], ids[249]);
    assert_eq!(outcome.users.len(), 250);
}

#[tokio::test]
async fn duplicate_ids_are_requested_once() {
    let lookup = MockLookup::with_users([user("1")]);
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&accounts(&["1", "1", "1"]), false).await;

    assert_eq!(fetcher.lookup().calls(), vec![accounts(&["1"])]);
    assert_eq!(outcome.stats.requested, 1);
}

#[tokio::test]
async fn transient_failure_is_retried() {
    let lookup = MockLookup::with_users([user("1")]);
    lookup.push_error(api_error());
    lookup.push_error(api_error());
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&accounts(&["1"]), false).await;

    assert_eq!(outcome.users.len(), 1);
    assert_eq!(outcome.stats.requests, 3);
    assert_eq!(outcome.stats.retries, 2);
}

#[tokio::test]
async fn batch_abandoned_after_max_retries_and_next_batch_continues() {
    let raw = numbered(101);
    let ids: Vec<_> = raw.iter().map(|s| account(s)).collect();
    let lookup = MockLookup::with_users(raw.iter().map(|s| user(s)));
    // First attempt + 3 retries for batch 0
    for _ in 0..4 {
        lookup.push_error(api_error());
    }
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&ids, false).await;

    assert_eq!(fetcher.lookup().call_count(), 5);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.index, 0);
    assert_eq!(failure.ids.len(), 100);
    assert!(matches!(
        failure.error,
        FetchError::RetriesExhausted { attempts: 4, .. }
    ));

    // Second batch still resolved
    assert_eq!(outcome.users.len(), 1);
    assert!(outcome.users.contains_key(&ids[100]));
    assert_eq!(outcome.failed_ids(), 100);
}

#[tokio::test]
async fn rate_limit_in_fast_mode_skips_wait_and_keeps_retry_budget() {
    let lookup = MockLookup::with_users([user("1"), user("2")]);
    lookup.push_error(LookupError::RateLimited {
        reset_after: Some(Duration::from_secs(5)),
    });
    // No transient retries allowed: success proves the 429 did not use one,
    // and an hour-long retry delay proves no delay was taken either.
    let policy = RetryPolicy::fast()
        .with_max_retries(0)
        .with_retry_delay(Duration::from_secs(3600));
    let fetcher = BatchFetcher::new(lookup, policy);

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        fetcher.fetch(&accounts(&["1", "2"]), false),
    )
    .await
    .expect("fast mode must not sleep on 429");

    assert_eq!(outcome.users.len(), 2);
    assert!(outcome.is_complete());
    assert_eq!(outcome.stats.rate_limited, 1);
    assert_eq!(outcome.stats.retries, 0);

    let calls = fetcher.lookup().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], calls[1], "same batch must be retried");
}

#[tokio::test]
async fn rate_limit_waits_are_capped() {
    let lookup = MockLookup::with_users([user("1")]);
    for _ in 0..3 {
        lookup.push_error(LookupError::RateLimited { reset_after: None });
    }
    let policy = instant_policy().with_max_rate_limit_waits(2);
    let fetcher = BatchFetcher::new(lookup, policy);

    let outcome = fetcher.fetch(&accounts(&["1"]), false).await;

    assert!(outcome.users.is_empty());
    assert_eq!(fetcher.lookup().call_count(), 3);
    assert!(matches!(
        outcome.failures[0].error,
        FetchError::RateLimitExhausted { waits: 2 }
    ));
}

#[tokio::test]
async fn rate_limit_waits_for_reset_hint() {
    let lookup = MockLookup::with_users([user("1")]);
    lookup.push_error(LookupError::RateLimited {
        reset_after: Some(Duration::from_millis(30)),
    });
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let start = std::time::Instant::now();
    let outcome = fetcher.fetch(&accounts(&["1"]), false).await;

    assert!(start.elapsed() >= Duration::from_millis(30));
    assert_eq!(outcome.users.len(), 1);
}

#[tokio::test]
async fn rate_limit_without_hint_uses_default_wait() {
    let lookup = MockLookup::with_users([user("1")]);
    lookup.push_error(LookupError::RateLimited { reset_after: None });
    let policy = instant_policy().with_default_rate_limit_wait(Duration::from_millis(40));
    let fetcher = BatchFetcher::new(lookup, policy);

    let start = std::time::Instant::now();
    let outcome = fetcher.fetch(&accounts(&["1"]), false).await;

    assert!(start.elapsed() >= Duration::from_millis(40));
    assert_eq!(outcome.users.len(), 1);
    assert_eq!(outcome.stats.rate_limited, 1);
    assert_eq!(fetcher.lookup().call_count(), 2);
}

#[tokio::test]
async fn unauthorized_stops_remaining_batches() {
    let raw = numbered(201);
    let ids: Vec<_> = raw.iter().map(|s| account(s)).collect();
    let lookup = MockLookup::with_users(raw.iter().map(|s| user(s)));
    lookup.push_error(LookupError::Unauthorized { status: 401 });
    let fetcher = BatchFetcher::new(lookup, instant_policy());

    let outcome = fetcher.fetch(&ids, false).await;

    assert_eq!(fetcher.lookup().call_count(), 1);
    assert!(outcome.users.is_empty());
    assert_eq!(outcome.failures.len(), 3);
    assert!(matches!(outcome.failures[0].error, FetchError::Fatal(_)));
    assert!(matches!(outcome.failures[1].error, FetchError::NotAttempted));
    assert!(matches!(outcome.failures[2].error, FetchError::NotAttempted));
    assert_eq!(outcome.failed_ids(), 201);
}

#[tokio::test]
async fn cancellation_interrupts_rate_limit_wait() {
    let lookup = MockLookup::with_users([user("1")]);
    lookup.push_error(LookupError::RateLimited {
        reset_after: Some(Duration::from_secs(3600)),
    });
    let token = CancellationToken::new();
    let fetcher =
        BatchFetcher::new(lookup, instant_policy()).with_waiter(Waiter::new(token.clone()));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        fetcher.fetch(&accounts(&["1"]), false),
    )
    .await
    .expect("cancel should end the fetch");

    assert!(outcome.users.is_empty());
    assert!(matches!(outcome.failures[0].error, FetchError::Cancelled));
}

#[tokio::test]
async fn unrequested_users_are_dropped() {
    struct Chatty;
    impl UserLookup for Chatty {
        async fn lookup_users(
            &self,
            _ids: &[crate::domain::AccountId],
        ) -> Result<Vec<crate::domain::UserInfo>, LookupError> {
            Ok(vec![user("1"), user("999")])
        }
    }

    let fetcher = BatchFetcher::new(Chatty, instant_policy());
    let outcome = fetcher.fetch(&accounts(&["1"]), false).await;

    assert_eq!(outcome.users.len(), 1);
    assert!(outcome.users.contains_key(&account("1")));
}

#[tokio::test]
async fn returned_id_casing_is_kept_as_key() {
    struct Canonical;
    impl UserLookup for Canonical {
        async fn lookup_users(
            &self,
            _ids: &[crate::domain::AccountId],
        ) -> Result<Vec<crate::domain::UserInfo>, LookupError> {
            Ok(vec![user("ABC")])
        }
    }

    let fetcher = BatchFetcher::new(Canonical, instant_policy());
    let outcome = fetcher.fetch(&accounts(&["abc"]), false).await;

    assert_eq!(outcome.users.len(), 1);
    assert!(outcome.users.contains_key(&account("ABC")));
}

#[tokio::test]
async fn one_user_kept_per_requested_id() {
    struct Doubled;
    impl UserLookup for Doubled {
        async fn lookup_users(
            &self,
            _ids: &[crate::domain::AccountId],
        ) -> Result<Vec<crate::domain::UserInfo>, LookupError> {
            Ok(vec![user("ABC"), user("abc"), user("Abc")])
        }
    }

    let fetcher = BatchFetcher::new(Doubled, instant_policy());
    let outcome = fetcher.fetch(&accounts(&["abc"]), false).await;

    assert_eq!(outcome.users.len(), 1);
    // Exact match wins over differently-cased ones
    assert!(outcome.users.contains_key(&account("abc")));
    assert_eq!(outcome.stats.fetched, 1);
}

mod caching {
    use super::*;

    fn cache_in(dir: &std::path::Path) -> LookupCache {
        LookupCache::new(LookupCacheConfig::new(dir.join("users.json")))
    }

    #[tokio::test]
    async fn second_fetch_makes_no_requests() {
        let dir = tempdir().unwrap();
        let lookup = MockLookup::with_users([user("1"), user("2")]);
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache_in(dir.path()));
        let ids = accounts(&["1", "2"]);

        let first = fetcher.fetch(&ids, true).await;
        assert_eq!(first.stats.requests, 1);
        assert_eq!(fetcher.lookup().call_count(), 1);

        let second = fetcher.fetch(&ids, true).await;
        assert_eq!(second.stats.requests, 0);
        assert_eq!(second.stats.cache_hits, 2);
        assert_eq!(fetcher.lookup().call_count(), 1);
        assert_eq!(second.users, first.users);
    }

    #[tokio::test]
    async fn canonical_casing_still_hits_cache() {
        struct Upper {
            calls: std::sync::Mutex<usize>,
        }
        impl UserLookup for Upper {
            async fn lookup_users(
                &self,
                ids: &[crate::domain::AccountId],
            ) -> Result<Vec<crate::domain::UserInfo>, LookupError> {
                *self.calls.lock().unwrap() += 1;
                Ok(ids
                    .iter()
                    .map(|id| user(&id.as_str().to_ascii_uppercase()))
                    .collect())
            }
        }

        let dir = tempdir().unwrap();
        let lookup = Upper {
            calls: std::sync::Mutex::new(0),
        };
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache_in(dir.path()));
        let ids = accounts(&["abc", "def"]);

        let first = fetcher.fetch(&ids, true).await;
        assert_eq!(first.stats.requests, 1);
        assert_eq!(first.users.len(), 2);

        let second = fetcher.fetch(&ids, true).await;
        assert_eq!(second.stats.requests, 0);
        assert_eq!(second.stats.cache_hits, 2);
        assert_eq!(*fetcher.lookup().calls.lock().unwrap(), 1);
        assert_eq!(second.users, first.users);
    }

    #[tokio::test]
    async fn only_cache_misses_are_fetched() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let seeded: UserMap = [user("1")].into_iter().map(|u| (u.id.clone(), u)).collect();
        cache.save(&seeded).unwrap();

        let lookup = MockLookup::with_users([user("2"), user("3")]);
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache.clone());

        let outcome = fetcher.fetch(&accounts(&["1", "2", "3"]), true).await;

        assert_eq!(fetcher.lookup().calls(), vec![accounts(&["2", "3"])]);
        assert_eq!(outcome.users.len(), 3);
        assert_eq!(outcome.stats.cache_hits, 1);
        assert_eq!(outcome.stats.fetched, 2);

        // Cache now holds the merged set
        let saved = cache.load().unwrap().unwrap();
        assert_eq!(saved.len(), 3);
    }

    #[tokio::test]
    async fn cache_ignored_when_disabled() {
        let dir = tempdir().unwrap();
        let cache = cache_in(dir.path());
        let seeded: UserMap = [user("1")].into_iter().map(|u| (u.id.clone(), u)).collect();
        cache.save(&seeded).unwrap();

        let lookup = MockLookup::with_users([user("1")]);
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache.clone());

        let outcome = fetcher.fetch(&accounts(&["1", "2"]), false).await;

        assert_eq!(fetcher.lookup().call_count(), 1);
        assert_eq!(outcome.stats.cache_hits, 0);
        // Not written either
        assert_eq!(cache.load().unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_cache_is_treated_as_miss() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("users.json"), "garbage").unwrap();

        let lookup = MockLookup::with_users([user("1")]);
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache_in(dir.path()));

        let outcome = fetcher.fetch(&accounts(&["1"]), true).await;

        assert_eq!(outcome.users.len(), 1);
        // Overwritten with a valid cache
        assert_eq!(cache_in(dir.path()).load().unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn nothing_saved_when_nothing_fetched() {
        let dir = tempdir().unwrap();
        let lookup = MockLookup::new();
        let fetcher = BatchFetcher::new(lookup, instant_policy()).with_cache(cache_in(dir.path()));

        let outcome = fetcher.fetch(&accounts(&["1"]), true).await;

        assert!(outcome.users.is_empty());
        assert!(!dir.path().join("users.json").exists());
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The result never has more entries than distinct requested IDs,
        /// and every key is one the lookup actually returned.
        #[test]
        fn result_bounded_by_request(
            requested in proptest::collection::vec("[0-9]{1,4}", 0..250),
            known in proptest::collection::hash_set("[0-9]{1,4}", 0..250),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();

            let lookup = MockLookup::with_users(known.iter().map(|s| user(s)));
            let fetcher = BatchFetcher::new(lookup, instant_policy());
            let ids: Vec<_> = requested.iter().map(|s| account(s)).collect();

            let outcome = rt.block_on(fetcher.fetch(&ids, false));

            let distinct: std::collections::HashSet<_> = requested.iter().collect();
            prop_assert!(outcome.users.len() <= distinct.len());
            for key in outcome.users.keys() {
                prop_assert!(known.contains(key.as_str()));
                prop_assert!(distinct.contains(&key.as_str().to_string()));
            }
        }
    }
}
