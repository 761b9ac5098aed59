//! Per-author rows and report column names.

use std::fmt;

/// Spreadsheet row id
pub const COL_ID: &str = "ID_Planilha";
/// DOI as it appeared in the input
pub const COL_DOI_ORIGINAL: &str = "DOI_Original";
/// Normalized DOI
pub const COL_DOI_CLEAN: &str = "DOI_Limpo";
/// Article title
pub const COL_TITLE: &str = "Titulo_Artigo";
/// Author display name
pub const COL_NAME: &str = "Nome";
/// Scopus author id
pub const COL_AUTHOR_ID: &str = "Scopus_ID";
/// Author document count or lookup sentinel
pub const COL_PAPERS: &str = "Total_Papers";
/// Formatted author list of the row's article
pub const COL_FORMATTED: &str = "Autores_Formatados";

/// Column order of freshly fetched rows.
pub const RECORD_COLUMNS: &[&str] = &[
    COL_ID,
    COL_DOI_ORIGINAL,
    COL_DOI_CLEAN,
    COL_TITLE,
    COL_NAME,
    COL_AUTHOR_ID,
    COL_PAPERS,
];

/// Total documents of an author, or why it is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperCount {
    Count(u64),
    /// Profile lookup said the author does not exist
    NotFound,
    /// Profile lookup failed for any other reason
    Error,
}

impl fmt::Display for PaperCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaperCount::Count(n) => write!(f, "{}", n),
            PaperCount::NotFound => f.write_str("not found"),
            PaperCount::Error => f.write_str("error"),
        }
    }
}

/// One author of one article.
///
/// `doi_clean` is always `normalize_doi(doi_original)`; records are built
/// by the fetcher and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub row_id: String,
    pub doi_original: String,
    pub doi_clean: String,
    pub title: String,
    pub author_name: String,
    pub author_id: String,
    pub paper_count: PaperCount,
}

impl AuthorRecord {
    /// Cell values in [`RECORD_COLUMNS`] order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.row_id.clone(),
            self.doi_original.clone(),
            self.doi_clean.clone(),
            self.title.clone(),
            self.author_name.clone(),
            self.author_id.clone(),
            self.paper_count.to_string(),
        ]
    }
}
