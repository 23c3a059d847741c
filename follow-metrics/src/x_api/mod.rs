//! X (Twitter) API v2 client.
//!
//! This module provides an HTTP client for the user lookup endpoint, which
//! resolves account IDs to profiles and public metrics.
//!
//! Key characteristics of the endpoint:
//! - At most 100 IDs per request (`GET /2/users?ids=...`)
//! - Unknown or suspended IDs are reported under `errors`, not as a failure
//! - Throttling is signalled with HTTP 429 and an `x-rate-limit-reset` hint

mod auth;
mod client;
mod convert;
mod error;
mod types;

pub use auth::{Credentials, OAuth1Credentials};
pub use client::{ClientConfig, MAX_IDS_PER_REQUEST, XClient};
pub use convert::{ConversionError, convert_user, convert_users};
pub use error::LookupError;
pub use types::{ApiProblem, PublicMetrics, UserDto, UsersResponse};
