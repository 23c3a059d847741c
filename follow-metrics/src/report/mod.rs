//! Follower report assembly and output.
//!
//! Every identifier from the export becomes exactly one row, in export
//! order. Rows for identifiers the API could not resolve are placeholders
//! with zeroed counters and `N/A` as the creation date.

mod assemble;
mod writer;

pub use assemble::{COLUMNS, NOT_AVAILABLE, ReportRow, ReportSummary, assemble};
pub use writer::{ReportError, ReportWriter};
