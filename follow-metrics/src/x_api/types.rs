//! X API v2 response DTOs.
//!
//! These types map directly to the `GET /2/users` JSON response. Fields the
//! API may omit are `Option` or defaulted.

use serde::Deserialize;

/// Response from `GET /2/users?ids=...`.
///
/// `data` is absent when none of the requested IDs resolved; per-ID
/// failures (suspended, deleted) are listed under `errors`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub data: Vec<UserDto>,

    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}

/// A user object as returned with `user.fields=created_at,public_metrics`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Handle without `@`.
    #[serde(default)]
    pub username: String,

    /// ISO 8601 creation timestamp, e.g. `2013-12-14T04:35:55.000Z`.
    pub created_at: Option<String>,

    pub public_metrics: Option<PublicMetrics>,
}

/// Account counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub listed_count: u64,
}

/// A partial error entry, e.g. "Could not find user with ids: [123]".
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProblem {
    pub value: Option<String>,
    pub detail: Option<String>,
    pub title: Option<String>,
    pub resource_id: Option<String>,
}
