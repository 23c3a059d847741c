//! Reader for the follower/following list files of an X data export.
//!
//! Export files are JavaScript rather than JSON: a single assignment such as
//! `window.YTD.follower.part0 = [ ... ];` whose right-hand side is a JSON
//! array. Each entry looks like `{"follower": {"accountId": "...", ...}}`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{AccountId, DiscoveryRecord};

use super::error::ExportError;

/// Prefix shared by every assignment in an X export.
const ASSIGNMENT_PREFIX: &str = "window.YTD.";

/// Which account list of the export to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportKind {
    /// Accounts following the export owner (`follower.js`).
    #[default]
    Followers,
    /// Accounts the export owner follows (`following.js`).
    Following,
}

impl ExportKind {
    /// File name inside the export's `data` directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::Followers => "follower.js",
            ExportKind::Following => "following.js",
        }
    }

    /// Key wrapping each entry's account object.
    pub fn entry_key(self) -> &'static str {
        match self {
            ExportKind::Followers => "follower",
            ExportKind::Following => "following",
        }
    }
}

/// Reads discovery records out of an unpacked export directory.
#[derive(Debug, Clone)]
pub struct ExportReader {
    data_dir: PathBuf,
    kind: ExportKind,
}

impl ExportReader {
    /// Create a reader for the export unpacked at `data_dir`.
    ///
    /// `data_dir` is the export root; list files live in its `data`
    /// subdirectory.
    pub fn new(data_dir: impl Into<PathBuf>, kind: ExportKind) -> Self {
        Self {
            data_dir: data_dir.into(),
            kind,
        }
    }

    /// Full path of the list file this reader consumes.
    pub fn file_path(&self) -> PathBuf {
        self.data_dir.join("data").join(self.kind.file_name())
    }

    /// Read and parse the list file.
    ///
    /// Every record is stamped with the same "now". Reading twice gives
    /// different timestamps.
    pub fn read(&self) -> Result<Vec<DiscoveryRecord>, ExportError> {
        let path = self.file_path();
        if !path.is_file() {
            return Err(ExportError::NotFound { path });
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        let records = parse_export(&text, self.kind, Utc::now())?;
        info!(
            count = records.len(),
            path = %path.display(),
            "Loaded account IDs from export"
        );
        Ok(records)
    }
}

/// Parse the text of an export list file into discovery records.
///
/// Entries without a nested object carrying a non-empty string `accountId`
/// are skipped.
pub fn parse_export(
    text: &str,
    kind: ExportKind,
    now: DateTime<Utc>,
) -> Result<Vec<DiscoveryRecord>, ExportError> {
    let json = strip_assignment(text);
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(ExportError::NotAnArray);
    };

    let total = entries.len();
    let records: Vec<DiscoveryRecord> = entries
        .iter()
        .filter_map(|entry| account_id_of(entry, kind.entry_key()))
        .map(|id| DiscoveryRecord::new(id, now))
        .collect();

    let skipped = total - records.len();
    if skipped > 0 {
        debug!(skipped, total, "Skipped export entries without an account ID");
    }

    Ok(records)
}

/// Strip the `window.YTD.<name>.partN =` assignment and the trailing `;`.
fn strip_assignment(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(ASSIGNMENT_PREFIX)
        && let Some((_, rhs)) = rest.split_once('=')
    {
        body = rhs.trim();
    }
    body.strip_suffix(';').unwrap_or(body).trim_end()
}

fn account_id_of(entry: &Value, key: &str) -> Option<AccountId> {
    let id = entry.get(key)?.get("accountId")?.as_str()?;
    AccountId::new(id.to_string()).ok()
}

/// Log what is (and is not) present in an export directory.
///
/// Used after a [`ExportError::NotFound`] to help the user point the tool at
/// the right place.
pub fn diagnose(data_dir: &Path) {
    let data = data_dir.join("data");
    info!(
        dir = %data.display(),
        exists = data.exists(),
        is_dir = data.is_dir(),
        "Checking export data directory"
    );

    let entries = match std::fs::read_dir(&data) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %data.display(), error = %e, "Cannot list export data directory");
            return;
        }
    };

    let mut found: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("js"))
        .filter_map(|p| p.file_name().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    found.sort();

    if found.is_empty() {
        warn!(dir = %data.display(), "No .js files in export data directory");
    } else {
        info!(files = ?found, "Export files present");
    }
}
