//! The lookup seam between the fetcher and the X API.

use std::future::Future;

use crate::domain::{AccountId, UserInfo};
use crate::x_api::{LookupError, XClient};

/// Source of user records for one batch of IDs.
///
/// This abstraction allows the fetcher to be tested without HTTP.
pub trait UserLookup {
    /// Resolve a batch of at most [`crate::x_api::MAX_IDS_PER_REQUEST`] IDs.
    ///
    /// Returns only the users that resolved. Rate limiting is reported as
    /// [`LookupError::RateLimited`].
    fn lookup_users(
        &self,
        ids: &[AccountId],
    ) -> impl Future<Output = Result<Vec<UserInfo>, LookupError>>;
}

impl UserLookup for XClient {
    async fn lookup_users(&self, ids: &[AccountId]) -> Result<Vec<UserInfo>, LookupError> {
        XClient::lookup_users(self, ids).await
    }
}
