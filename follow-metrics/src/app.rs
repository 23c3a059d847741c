//! End-to-end report run: export, lookup, report.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cache::LookupCache;
use crate::config::AppConfig;
use crate::domain::account_ids;
use crate::export::{ExportError, ExportReader, diagnose};
use crate::fetcher::{BatchFetcher, FetchStats, Waiter};
use crate::report::{ReportError, ReportSummary, ReportWriter, assemble};
use crate::x_api::{LookupError, XClient};

/// Errors that end a run before a report is written.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The export list file is missing
    #[error("failed to read export: {0}")]
    Export(#[from] ExportError),

    /// The HTTP client could not be built
    #[error("failed to create X API client: {0}")]
    Client(#[from] LookupError),

    /// The report could not be written
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output: PathBuf,
    pub report: ReportSummary,
    pub fetch: FetchStats,
    /// Batches that were abandoned or never attempted.
    pub failed_batches: usize,
    pub cancelled: bool,
}

/// Build the report described by `config`.
///
/// A missing export is an error. An unreadable or malformed one is logged
/// and produces an empty report. Lookup failures only ever turn rows into
/// placeholders.
pub async fn run(config: &AppConfig, cancel: CancellationToken) -> Result<RunSummary, RunError> {
    let reader = ExportReader::new(&config.data_dir, config.kind);
    let mut records = match reader.read() {
        Ok(records) => records,
        Err(e) if e.is_not_found() => {
            error!(error = %e, "Export file not found");
            diagnose(&config.data_dir);
            return Err(e.into());
        }
        Err(e) => {
            error!(error = %e, "Failed to read export; continuing with no accounts");
            Vec::new()
        }
    };
    info!(accounts = records.len(), kind = ?config.kind, "Read export");

    let total = records.len();
    config.mode.sample(&mut records);
    if records.len() < total {
        info!(sample = records.len(), total, "Fast mode: processing a sample");
    }

    let client = XClient::new(config.client.clone())?;
    let mut fetcher = BatchFetcher::new(client, config.policy.clone())
        .with_waiter(Waiter::new(cancel.clone()));
    if let Some(cache) = &config.cache {
        fetcher = fetcher.with_cache(LookupCache::new(cache.clone()));
    }

    let outcome = fetcher
        .fetch(&account_ids(&records), config.use_cache())
        .await;
    if !outcome.is_complete() {
        warn!(
            failed_batches = outcome.failures.len(),
            failed_ids = outcome.failed_ids(),
            "Some users could not be resolved; they get placeholder rows"
        );
    }

    let rows = assemble(&records, &outcome.users);
    let report = ReportSummary::from_rows(&rows);

    let writer = ReportWriter::new(&config.output);
    writer.write(&rows)?;

    let summary = RunSummary {
        output: writer.path().to_path_buf(),
        report,
        fetch: outcome.stats,
        failed_batches: outcome.failures.len(),
        cancelled: cancel.is_cancelled(),
    };
    info!(
        rows = report.rows,
        resolved = report.resolved,
        placeholders = report.placeholders,
        cache_hits = summary.fetch.cache_hits,
        requests = summary.fetch.requests,
        path = %summary.output.display(),
        "Run complete"
    );
    Ok(summary)
}
