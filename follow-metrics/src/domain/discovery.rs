//! Identifiers discovered in a data export.

use chrono::{DateTime, Utc};

use super::AccountId;

/// An account ID read from the export, stamped with the time it was read.
///
/// The timestamp is not sourced from the export. It only records when this
/// tool saw the identifier locally, so re-reading the same export yields
/// different timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRecord {
    pub id: AccountId,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveryRecord {
    pub fn new(id: AccountId, discovered_at: DateTime<Utc>) -> Self {
        Self { id, discovered_at }
    }
}

/// Collect the identifiers of a record list, preserving order.
pub fn account_ids(records: &[DiscoveryRecord]) -> Vec<AccountId> {
    records.iter().map(|r| r.id.clone()).collect()
}
