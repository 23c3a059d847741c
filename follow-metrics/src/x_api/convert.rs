//! Conversion from API DTOs to domain types.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{AccountId, UserInfo};

use super::types::{UserDto, UsersResponse};

/// Error converting a user object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("user object has an empty id")]
    EmptyId,
}

/// Convert one user object.
///
/// An unparseable `created_at` is dropped rather than failing the record.
pub fn convert_user(dto: &UserDto) -> Result<UserInfo, ConversionError> {
    let id = AccountId::new(dto.id.clone()).map_err(|_| ConversionError::EmptyId)?;

    let created_at = dto.created_at.as_deref().and_then(|s| {
        let parsed = parse_created_at(s);
        if parsed.is_none() {
            debug!(id = %id, created_at = s, "Unparseable created_at");
        }
        parsed
    });

    let metrics = dto.public_metrics.clone().unwrap_or_default();

    Ok(UserInfo {
        id,
        name: dto.name.clone(),
        username: dto.username.clone(),
        created_at,
        followers_count: metrics.followers_count,
        following_count: metrics.following_count,
        tweet_count: metrics.tweet_count,
    })
}

/// Convert every user object of a response, skipping invalid ones.
pub fn convert_users(response: &UsersResponse) -> Vec<UserInfo> {
    for problem in &response.errors {
        debug!(
            resource_id = problem.resource_id.as_deref().unwrap_or("?"),
            detail = problem.detail.as_deref().unwrap_or(""),
            "Lookup API reported a partial error"
        );
    }

    response
        .data
        .iter()
        .filter_map(|dto| match convert_user(dto) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Skipping user object");
                None
            }
        })
        .collect()
}

fn parse_created_at(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
