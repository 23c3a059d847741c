//! X data export reader.
//!
//! Extracts the account IDs listed in an unpacked X (Twitter) data export.
//! The export is a directory containing a `data` subdirectory of `.js`
//! files; this module only reads the follower and following lists.

mod error;
mod reader;

pub use error::ExportError;
pub use reader::{ExportKind, ExportReader, diagnose, parse_export};
