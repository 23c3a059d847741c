//! Export reader error types.

use std::path::PathBuf;

/// Errors from reading an X data export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The export file does not exist. Terminal for a run.
    #[error("export file not found at {}", .path.display())]
    NotFound { path: PathBuf },

    /// The export file exists but could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Content is not valid JSON after stripping the assignment prefix
    #[error("export content is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Content is JSON but not an array of entries
    #[error("export content is not a JSON array")]
    NotAnArray,
}

impl ExportError {
    /// Whether this error means the export is missing, as opposed to unreadable
    /// or corrupt.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ExportError::NotFound { .. })
    }
}
