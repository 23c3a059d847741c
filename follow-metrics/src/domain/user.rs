//! Enriched user records.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AccountId;

/// Resolved user records keyed by account ID.
pub type UserMap = HashMap<AccountId, UserInfo>;

/// Profile information for one account, as returned by the lookup API.
///
/// Records come either from the on-disk lookup cache or from a batch
/// response. The `id` is the API-returned identifier, which is also the key
/// used in a [`UserMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account identifier.
    pub id: AccountId,

    /// Display name (free text, may be empty).
    pub name: String,

    /// Handle without the leading `@`.
    pub username: String,

    /// When the account was created, if the API reported it.
    pub created_at: Option<DateTime<Utc>>,

    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
}

impl UserInfo {
    /// Handle with the `@` prefix, as shown in reports.
    pub fn handle(&self) -> String {
        format!("@{}", self.username)
    }
}
