//! Full and summary CSV reports.

use crate::error::{Result, ScopusError};
use crate::merge::sort_by_id;
use crate::record::{COL_DOI_CLEAN, COL_DOI_ORIGINAL, COL_FORMATTED, COL_ID, COL_TITLE};
use crate::table::Table;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Default path of the full per-author report.
pub const DEFAULT_FULL_REPORT: &str = "autores_scopus_completo.csv";
/// Default path of the per-article summary report.
pub const DEFAULT_SUMMARY_REPORT: &str = "autores_scopus_resumido.csv";

/// Result of writing both reports. Each write is independent.
#[derive(Debug)]
pub struct ReportOutcome {
    pub full_path: PathBuf,
    pub full: Result<usize>,
    pub summary_path: PathBuf,
    pub summary: Result<usize>,
}

impl ReportOutcome {
    pub fn is_complete(&self) -> bool {
        self.full.is_ok() && self.summary.is_ok()
    }
}

/// One row per article: the first row of each distinct clean DOI
/// (`DOI_Original` when there is no clean column), re-sorted by id.
pub fn summarize(full: &Table) -> Table {
    let (doi_name, key_col) = match full.column_index(COL_DOI_CLEAN) {
        Some(col) => (COL_DOI_CLEAN, Some(col)),
        None => (COL_DOI_ORIGINAL, full.column_index(COL_DOI_ORIGINAL)),
    };

    let mut summary = full.clone();
    if let Some(col) = key_col {
        summary.dedup_by_column(col);
    }
    let mut summary = summary.select(&[COL_ID, doi_name, COL_TITLE, COL_FORMATTED]);
    sort_by_id(&mut summary);
    summary
}

/// Write `full` to `full_path` and its summary to `summary_path`.
///
/// A failure of the full report does not prevent the summary write; both
/// outcomes are logged and returned.
pub fn write_reports(full: &Table, full_path: &Path, summary_path: &Path) -> ReportOutcome {
    let full_result = write_table(full, full_path);
    match &full_result {
        Ok(rows) => info!(path = %full_path.display(), rows = rows, "Full report saved"),
        Err(e @ ScopusError::OutputWritePermission(_)) => {
            error!(path = %full_path.display(), "{}", e);
        }
        Err(e) => error!(path = %full_path.display(), error = %e, "Failed to save full report"),
    }

    ReportOutcome {
        full_path: full_path.to_path_buf(),
        full: full_result,
        summary_path: summary_path.to_path_buf(),
        summary: write_summary(full, summary_path),
    }
}

/// Write only the summary of `full`, leaving the file at `full_path` alone.
///
/// Used when the existing full report could not be read: overwriting it
/// would drop every row it holds. `reason` becomes the full-report outcome.
pub fn write_summary_only(
    full: &Table,
    full_path: &Path,
    summary_path: &Path,
    reason: ScopusError,
) -> ReportOutcome {
    error!(path = %full_path.display(), error = %reason, "Full report not written");
    ReportOutcome {
        full_path: full_path.to_path_buf(),
        full: Err(reason),
        summary_path: summary_path.to_path_buf(),
        summary: write_summary(full, summary_path),
    }
}

fn write_summary(full: &Table, summary_path: &Path) -> Result<usize> {
    let result = write_table(&summarize(full), summary_path);
    match &result {
        Ok(rows) => info!(path = %summary_path.display(), rows = rows, "Summary report saved"),
        Err(e) => error!(path = %summary_path.display(), error = %e, "Could not generate summary"),
    }
    result
}

fn write_table(table: &Table, path: &Path) -> Result<usize> {
    table.write_csv(path)?;
    Ok(table.len())
}
