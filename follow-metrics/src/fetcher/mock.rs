//! Mock user lookup for fetcher tests.
//!
//! Serves users from an in-memory directory, with an optional queue of
//! scripted failures consumed one per request before the directory is used.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::{AccountId, UserInfo, UserMap};
use crate::x_api::LookupError;

use super::lookup::UserLookup;

/// Mock lookup that records every batch it is asked for.
pub struct MockLookup {
    known: UserMap,
    scripted: Mutex<VecDeque<LookupError>>,
    calls: Mutex<Vec<Vec<AccountId>>>,
}

impl MockLookup {
    /// A lookup that knows nothing and always succeeds with no users.
    pub fn new() -> Self {
        Self {
            known: UserMap::new(),
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A lookup that resolves the given users.
    pub fn with_users(users: impl IntoIterator<Item = UserInfo>) -> Self {
        let mut lookup = Self::new();
        lookup.known = users.into_iter().map(|u| (u.id.clone(), u)).collect();
        lookup
    }

    /// Fail the next request with `error`. Queued failures are used in order.
    pub fn push_error(&self, error: LookupError) {
        self.scripted.lock().unwrap().push_back(error);
    }

    /// Number of lookups performed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every batch requested, in order.
    pub fn calls(&self) -> Vec<Vec<AccountId>> {
        self.calls.lock().unwrap().clone()
    }
}

impl UserLookup for MockLookup {
    async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<UserInfo>, LookupError> {
        self.calls.lock().unwrap().push(ids.to_vec());

        if let Some(error) = self.scripted.lock().unwrap().pop_front() {
            return Err(error);
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.known.get(id).cloned())
            .collect())
    }
}

/// A user whose fields are derived from its ID.
pub fn user(id: &str) -> UserInfo {
    UserInfo {
        id: account(id),
        name: format!("Name {id}"),
        username: format!("handle{id}"),
        created_at: None,
        followers_count: 1,
        following_count: 2,
        tweet_count: 3,
    }
}

pub fn account(id: &str) -> AccountId {
    AccountId::new(id.to_string()).unwrap()
}

pub fn accounts(ids: &[&str]) -> Vec<AccountId> {
    ids.iter().map(|id| account(id)).collect()
}
