//! The end-to-end run: input → lookups → merge → reports.
//!
//! Everything runs sequentially, one DOI and one author at a time, in
//! input order. Reports are read once at start and written once at the
//! end; nothing is persisted mid-run.

use crate::doi::normalize_doi;
use crate::fetcher::{fetch_author_records, MetadataService};
use crate::format::format_authors;
use crate::input::{load_dois, DEFAULT_DOI_COLUMN, DEFAULT_ID_COLUMN};
use crate::merge::{combine, sort_rows};
use crate::processed::ProcessedSet;
use crate::record::AuthorRecord;
use crate::error::{Result, ScopusError};
use crate::report::{
    write_reports, write_summary_only, ReportOutcome, DEFAULT_FULL_REPORT, DEFAULT_SUMMARY_REPORT,
};
use crate::table::Table;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Default input spreadsheet.
pub const DEFAULT_INPUT: &str = "Scopus Teste.xlsx";

/// Rows shown in the debug preview of newly fetched records.
const PREVIEW_ROWS: usize = 5;

/// File locations and column names of a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub full_report: PathBuf,
    pub summary_report: PathBuf,
    pub doi_column: String,
    pub id_column: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            full_report: PathBuf::from(DEFAULT_FULL_REPORT),
            summary_report: PathBuf::from(DEFAULT_SUMMARY_REPORT),
            doi_column: DEFAULT_DOI_COLUMN.to_string(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
        }
    }
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// DOIs read from the input
    pub loaded: usize,
    /// DOIs skipped because the existing report has them
    pub skipped_existing: usize,
    /// DOIs skipped because this run already collected them
    pub skipped_duplicate: usize,
    /// Article lookups performed
    pub fetched: usize,
    /// Author records collected in this run
    pub new_records: usize,
    /// Report writes, when anything was collected
    pub reports: Option<ReportOutcome>,
}

/// Execute one run against `service`.
///
/// Per-DOI and per-author failures never abort the run. When nothing new
/// is collected the reports are left untouched.
pub async fn run<S>(service: &S, options: &RunOptions) -> RunSummary
where
    S: MetadataService + ?Sized,
{
    let mut summary = RunSummary::default();

    if !options.input.exists() {
        error!(
            path = %options.input.display(),
            "Input file not found. Put the spreadsheet next to the program or pass --input"
        );
        return summary;
    }

    info!(path = %options.input.display(), "Reading DOIs");
    let rows = load_dois(&options.input, &options.doi_column, &options.id_column);
    summary.loaded = rows.len();

    let processed = ProcessedSet::from_report(&options.full_report);
    let mut collected: Vec<AuthorRecord> = Vec::new();
    let mut collected_dois: HashSet<String> = HashSet::new();

    let total = rows.len();
    for (i, row) in rows.iter().enumerate() {
        let doi_clean = normalize_doi(&row.doi);
        info!(
            progress = %format!("{}/{}", i + 1, total),
            doi = %doi_clean,
            id = %row.id,
            "Starting"
        );

        if processed.contains(&doi_clean) {
            info!(
                doi = %doi_clean,
                report = %options.full_report.display(),
                "Skipping: already in report"
            );
            summary.skipped_existing += 1;
            continue;
        }

        if collected_dois.contains(&doi_clean) {
            info!(doi = %doi_clean, "Skipping: duplicate DOI in this run");
            summary.skipped_duplicate += 1;
            continue;
        }

        summary.fetched += 1;
        let records = fetch_author_records(service, &row.id, &row.doi).await;
        if !records.is_empty() {
            collected_dois.insert(doi_clean);
            collected.extend(records);
        }
    }

    summary.new_records = collected.len();
    if collected.is_empty() {
        warn!("No data collected. Check the DOIs or your connection");
        return summary;
    }

    info!(records = collected.len(), "Processing complete");
    for record in collected.iter().take(PREVIEW_ROWS) {
        debug!(
            id = %record.row_id,
            doi = %record.doi_clean,
            name = %record.author_name,
            author_id = %record.author_id,
            papers = %record.paper_count,
            "Preview"
        );
    }

    // An unreadable report is kept on disk rather than replaced by this
    // run's rows alone.
    let (existing, unreadable) = match read_existing(&options.full_report) {
        Ok(existing) => (existing, None),
        Err(e) => (None, Some(e)),
    };
    let mut combined = combine(existing, Table::from_records(&collected));
    format_authors(&mut combined);
    sort_rows(&mut combined);

    summary.reports = Some(match unreadable {
        None => write_reports(&combined, &options.full_report, &options.summary_report),
        Some(reason) => write_summary_only(
            &combined,
            &options.full_report,
            &options.summary_report,
            reason,
        ),
    });
    summary
}

/// Existing full report, `None` when there is none yet.
fn read_existing(path: &Path) -> Result<Option<Table>> {
    if !path.exists() {
        return Ok(None);
    }
    Table::read_csv(path)
        .map(Some)
        .map_err(|e| ScopusError::ReportUnreadable {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::fake::{Failure, FakeService};
    use crate::record::{
        COL_AUTHOR_ID, COL_DOI_CLEAN, COL_FORMATTED, COL_ID, COL_NAME, COL_PAPERS, COL_TITLE,
    };
    use tempfile::{tempdir, TempDir};

    fn options(dir: &TempDir, input: &str) -> std::io::Result<RunOptions> {
        let input_path = dir.path().join("dois.csv");
        std::fs::write(&input_path, input)?;
        Ok(RunOptions {
            input: input_path,
            full_report: dir.path().join("full.csv"),
            summary_report: dir.path().join("summary.csv"),
            ..RunOptions::default()
        })
    }

    fn read(path: &Path) -> Result<Table> {
        Table::read_csv(path)
    }

    #[tokio::test]
    async fn test_end_to_end_single_author() -> Result<()> {
        let dir = tempdir()?;
        let opts = options(&dir, "id,doi\n7,https://doi.org/10.1/xyz\n")?;
        let service = FakeService::default()
            .with_article("10.1/xyz", "Xyz", &[("999", "Jane", "Doe")])
            .with_profile("999", 10);

        let summary = run(&service, &opts).await;
        assert_eq!(summary.loaded, 1);
        assert_eq!(summary.new_records, 1);
        assert!(summary.reports.as_ref().is_some_and(ReportOutcome::is_complete));

        let full = read(&opts.full_report)?;
        assert_eq!(full.len(), 1);
        assert_eq!(full.value(0, COL_ID), Some("7"));
        assert_eq!(full.value(0, COL_DOI_CLEAN), Some("10.1/xyz"));
        assert_eq!(full.value(0, COL_NAME), Some("Jane Doe"));
        assert_eq!(full.value(0, COL_AUTHOR_ID), Some("999"));
        assert_eq!(full.value(0, COL_PAPERS), Some("10"));
        assert_eq!(full.value(0, COL_FORMATTED), Some("Doe, Jane, ID:999, (10)"));

        let summary_table = read(&opts.summary_report)?;
        assert_eq!(summary_table.len(), 1);
        assert_eq!(summary_table.value(0, COL_TITLE), Some("Xyz"));
        assert_eq!(summary_table.value(0, COL_FORMATTED), Some("Doe, Jane, ID:999, (10)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_dois_are_not_refetched() -> Result<()> {
        let dir = tempdir()?;
        let opts = options(&dir, "id,doi\n3,10.1/a\n4,10.1/c\n")?;
        std::fs::write(
            &opts.full_report,
            "\u{feff}ID_Planilha,DOI_Original,DOI_Limpo,Titulo_Artigo,Nome,\
             Scopus_ID,Total_Papers,Autores_Formatados\n\
             1,10.1/a,10.1/a,A,Ada Lovelace,1,5,old\n\
             2,10.1/b,10.1/b,B,Alan Turing,2,7,old\n",
        )?;
        let service = FakeService::default()
            .with_article("10.1/a", "A", &[("1", "Ada", "Lovelace")])
            .with_article("10.1/c", "C", &[("3", "Grace", "Hopper")])
            .with_profile("1", 5)
            .with_profile("3", 9);

        let summary = run(&service, &opts).await;
        assert_eq!(service.article_calls(), ["10.1/c"]);
        assert_eq!(summary.skipped_existing, 1);

        let full = read(&opts.full_report)?;
        let ids: Vec<&str> = (0..full.len()).filter_map(|i| full.value(i, COL_ID)).collect();
        assert_eq!(ids, ["1", "2", "4"]);
        assert_eq!(full.value(0, COL_FORMATTED), Some("Lovelace, Ada, ID:1, (5)"));
        assert_eq!(full.value(2, COL_FORMATTED), Some("Hopper, Grace, ID:3, (9)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_in_run_duplicates_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let opts = options(
            &dir,
            "id,doi\n1,10.1/a\n2,https://doi.org/10.1/a\n3,10.1/gone\n4,10.1/gone\n",
        )?;
        let service = FakeService::default()
            .with_article("10.1/a", "A", &[("1", "Marie", "Curie"), ("2", "Pierre", "Curie")])
            .with_profile("1", 45)
            .with_profile_failure("2", Failure::Other);

        let summary = run(&service, &opts).await;
        assert_eq!(summary.skipped_duplicate, 1);
        // DOIs that produced nothing are tried again.
        assert_eq!(service.article_calls(), ["10.1/a", "10.1/gone", "10.1/gone"]);

        let full = read(&opts.full_report)?;
        assert_eq!(full.len(), 2);
        let both = "Curie, Marie, ID:1, (45) and Curie, Pierre, ID:2, (error)";
        assert_eq!(full.value(0, COL_FORMATTED), Some(both));
        assert_eq!(full.value(1, COL_FORMATTED), Some(both));
        assert_eq!(read(&opts.summary_report)?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_collected_leaves_reports_alone() -> Result<()> {
        let dir = tempdir()?;
        let opts = options(&dir, "id,doi\n1,10.1/missing\n")?;
        let service = FakeService::default();

        let summary = run(&service, &opts).await;
        assert_eq!(summary.fetched, 1);
        assert!(summary.reports.is_none());
        assert!(!opts.full_report.exists());
        assert!(!opts.summary_report.exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unreadable_report_is_kept() -> Result<()> {
        let dir = tempdir()?;
        let opts = options(&dir, "id,doi\n3,10.1/new\n")?;
        // Latin-1 "Rodr\xedguez", as left behind by a spreadsheet editor.
        let mut existing = b"ID_Planilha,DOI_Original,DOI_Limpo,Titulo_Artigo,Nome\n\
            1,10.1/old,10.1/old,Old,Ana Rodr".to_vec();
        existing.push(0xED);
        existing.extend_from_slice(b"guez\n2,10.1/old2,10.1/old2,Old two,Bo Li\n");
        std::fs::write(&opts.full_report, &existing)?;

        let service = FakeService::default()
            .with_article("10.1/new", "New", &[("5", "Grace", "Hopper")])
            .with_profile("5", 9);

        let summary = run(&service, &opts).await;
        assert_eq!(summary.new_records, 1);
        let reports = summary.reports.as_ref().map(|r| (&r.full, &r.summary));
        assert!(matches!(
            reports,
            Some((Err(ScopusError::ReportUnreadable { .. }), Ok(1)))
        ));
        assert_eq!(std::fs::read(&opts.full_report)?, existing);

        let summary_table = read(&opts.summary_report)?;
        assert_eq!(summary_table.value(0, COL_DOI_CLEAN), Some("10.1/new"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_input_is_soft() {
        let opts = RunOptions {
            input: PathBuf::from("/nonexistent/dois.xlsx"),
            ..RunOptions::default()
        };
        let summary = run(&FakeService::default(), &opts).await;
        assert_eq!(summary.loaded, 0);
        assert!(summary.reports.is_none());
    }
}
