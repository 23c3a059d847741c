//! X API v2 HTTP client.
//!
//! Provides the batched user lookup used to enrich export identifiers.
//! Handles authentication, status classification and conversion to domain
//! types. Retrying is left to the caller.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{AccountId, UserInfo};

use super::auth::Credentials;
use super::convert::convert_users;
use super::error::LookupError;
use super::types::UsersResponse;

/// Default base URL for the X API.
const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Maximum number of IDs accepted by one `GET /2/users` request.
pub const MAX_IDS_PER_REQUEST: usize = 100;

/// User fields requested for every lookup.
const USER_FIELDS: &str = "created_at,public_metrics";

/// Header carrying the rate limit reset hint.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Reset hints at or above this value are Unix timestamps, not durations.
const EPOCH_THRESHOLD_SECS: u64 = 1_000_000_000;

/// Configuration for the X API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bearer token or OAuth 1.0a credentials
    pub credentials: Credentials,
    /// Base URL for the API (defaults to production)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Create a new config with the given credentials.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// X API client.
#[derive(Debug, Clone)]
pub struct XClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl XClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, LookupError> {
        let mut headers = HeaderMap::new();
        let agent = format!("follow-metrics/{}", env!("CARGO_PKG_VERSION"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent)
                .map_err(|_| LookupError::InvalidRequest("invalid user agent".to_string()))?,
        );

        // Bearer tokens are static, so validate them once up front
        if let Credentials::Bearer(token) = &config.credentials {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| LookupError::InvalidRequest("invalid bearer token format".into()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
        })
    }

    /// Look up a batch of users by ID.
    ///
    /// Returns the users the API resolved, keyed by their API-returned ID.
    /// IDs the API cannot find (suspended, deleted) are simply absent.
    ///
    /// # Arguments
    ///
    /// * `ids` - Up to [`MAX_IDS_PER_REQUEST`] account IDs
    pub async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<UserInfo>, LookupError> {
        if ids.len() > MAX_IDS_PER_REQUEST {
            return Err(LookupError::InvalidRequest(format!(
                "{} ids exceeds the per-request maximum of {MAX_IDS_PER_REQUEST}",
                ids.len()
            )));
        }

        let url = format!("{}/2/users", self.base_url);
        let joined = ids
            .iter()
            .map(AccountId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let query = [("ids", joined.as_str()), ("user.fields", USER_FIELDS)];

        let mut request = self.http.get(&url).query(&query);
        if let Credentials::OAuth1(_) = &self.credentials {
            let auth = self.credentials.authorization("GET", &url, &query)?;
            request = request.header(AUTHORIZATION, auth);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let reset_after = response
                .headers()
                .get(RATE_LIMIT_RESET_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_reset_hint(v, unix_now()));
            return Err(LookupError::RateLimited { reset_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(LookupError::Unauthorized {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        let users: UsersResponse = serde_json::from_str(&body).map_err(|e| LookupError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

        Ok(convert_users(&users))
    }
}

/// Interpret a rate limit reset hint.
///
/// Small values are seconds to wait. Values that look like Unix timestamps
/// (X sends these) are converted to the time remaining until that instant.
fn parse_reset_hint(value: &str, now_secs: u64) -> Option<Duration> {
    let secs: u64 = value.trim().parse().ok()?;
    if secs >= EPOCH_THRESHOLD_SECS {
        Some(Duration::from_secs(secs.saturating_sub(now_secs)))
    } else {
        Some(Duration::from_secs(secs))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
