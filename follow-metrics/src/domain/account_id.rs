//! Account identifier type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid account ID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid account ID: {reason}")]
pub struct InvalidAccountId {
    reason: &'static str,
}

/// An X account identifier.
///
/// Account IDs are opaque tokens shared by the data export and the user
/// lookup API. They carry no ordering and are never interpreted; the only
/// validation is that they must be non-empty.
///
/// # Examples
///
/// ```
/// use follow_metrics::domain::AccountId;
///
/// let id = AccountId::new("783214".to_string()).unwrap();
/// assert_eq!(id.as_str(), "783214");
///
/// // Empty strings are rejected
/// assert!(AccountId::new("".to_string()).is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account ID from a string.
    ///
    /// Returns an error if the string is empty.
    pub fn new(s: String) -> Result<Self, InvalidAccountId> {
        if s.is_empty() {
            return Err(InvalidAccountId {
                reason: "account ID cannot be empty",
            });
        }
        Ok(AccountId(s))
    }

    /// Returns the account ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = InvalidAccountId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        AccountId::new(s)
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
