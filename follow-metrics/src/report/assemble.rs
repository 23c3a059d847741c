//! Joining discovery records with resolved users.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{AccountId, DiscoveryRecord, UserInfo, UserMap};

/// Value shown in the created column when the date is unknown.
pub const NOT_AVAILABLE: &str = "N/A";

/// Report column headers, in order.
pub const COLUMNS: [&str; 7] = [
    "Display Name",
    "Username",
    "User ID",
    "Account Created",
    "Followers Count",
    "Following Count",
    "Tweet Count",
];

/// One spreadsheet row per exported identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Display Name")]
    pub display_name: String,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "User ID")]
    pub user_id: String,
    #[serde(rename = "Account Created")]
    pub account_created: String,
    #[serde(rename = "Followers Count")]
    pub followers_count: u64,
    #[serde(rename = "Following Count")]
    pub following_count: u64,
    #[serde(rename = "Tweet Count")]
    pub tweet_count: u64,

    /// False for placeholder rows. Not written to the report.
    #[serde(skip)]
    pub resolved: bool,
}

impl ReportRow {
    /// Row for a resolved user.
    pub fn from_user(user: &UserInfo) -> Self {
        Self {
            display_name: user.name.clone(),
            username: user.handle(),
            user_id: user.id.to_string(),
            account_created: user
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            followers_count: user.followers_count,
            following_count: user.following_count,
            tweet_count: user.tweet_count,
            resolved: true,
        }
    }

    /// Clearly marked stand-in for an identifier that did not resolve.
    pub fn placeholder(id: &AccountId) -> Self {
        Self {
            display_name: format!("Unknown ({id})"),
            username: format!("@unknown_{id}"),
            user_id: id.to_string(),
            account_created: NOT_AVAILABLE.to_string(),
            followers_count: 0,
            following_count: 0,
            tweet_count: 0,
            resolved: false,
        }
    }
}

/// Build one row per record, in record order.
///
/// Identifiers absent from `users` get a placeholder row; no record is ever
/// dropped. Users keyed by a differently-cased form of the identifier (the
/// API's canonical form) still match.
pub fn assemble(records: &[DiscoveryRecord], users: &UserMap) -> Vec<ReportRow> {
    let folded: HashMap<String, &UserInfo> = users
        .iter()
        .map(|(id, user)| (id.as_str().to_ascii_lowercase(), user))
        .collect();

    records
        .iter()
        .map(|record| {
            users
                .get(&record.id)
                .or_else(|| folded.get(&record.id.as_str().to_ascii_lowercase()).copied())
                .map(ReportRow::from_user)
                .unwrap_or_else(|| ReportRow::placeholder(&record.id))
        })
        .collect()
}

/// Totals printed after a report is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub rows: usize,
    pub resolved: usize,
    pub placeholders: usize,
}

impl ReportSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let resolved = rows.iter().filter(|r| r.resolved).count();
        Self {
            rows: rows.len(),
            resolved,
            placeholders: rows.len() - resolved,
        }
    }
}
