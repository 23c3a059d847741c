//! CSV spreadsheet output.

use std::path::{Path, PathBuf};

use tracing::info;

use super::assemble::{COLUMNS, ReportRow};

/// Errors from writing the report file.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Creating the output directory failed
    #[error("failed to create {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or serializing a row failed
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes report rows as a CSV file with a header row.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every row, replacing any existing file.
    pub fn write(&self, rows: &[ReportRow]) -> Result<(), ReportError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| ReportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Header written by hand so an empty report still has one
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(COLUMNS)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;

        info!(rows = rows.len(), path = %self.path.display(), "Report written");
        Ok(())
    }
}
