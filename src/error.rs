//! Custom error types for scopus-authors.
//!
//! The variants mirror the failure kinds a run can meet: input problems,
//! article and author lookups, and report writes. Lookup failures are
//! always recovered close to where they happen; only setup failures reach
//! the binary's `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scopus-authors operations.
#[derive(Debug, Error)]
pub enum ScopusError {
    /// Input spreadsheet does not exist
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// Input spreadsheet lacks the configured DOI column
    #[error("Column '{column}' not found. Available columns: {available:?}")]
    InputColumnMissing {
        column: String,
        available: Vec<String>,
    },

    /// Article is not indexed by the metadata service
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    /// API key rejected
    #[error("Authentication failed (401). Check your API key or connection")]
    AuthUnauthorized,

    /// Any other article lookup failure
    #[error("Article lookup failed: {0}")]
    ArticleFetchOther(String),

    /// Author profile is not indexed by the metadata service
    #[error("Author profile not found: {0}")]
    AuthorProfileNotFound(String),

    /// Any other author profile lookup failure
    #[error("Author profile lookup failed: {0}")]
    AuthorProfileOther(String),

    /// Report file is locked or read-only
    #[error(
        "Cannot write '{}': permission denied. Is the file open? Close it and try again",
        .0.display()
    )]
    OutputWritePermission(PathBuf),

    /// Any other report write failure
    #[error("Cannot write '{}': {source}", .path.display())]
    OutputWriteOther {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Existing full report could not be read, so it is left as is
    #[error(
        "Existing report '{}' could not be read and was kept unchanged: {source}",
        .path.display()
    )]
    ReportUnreadable {
        path: PathBuf,
        #[source]
        source: Box<ScopusError>,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or parsed
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

impl ScopusError {
    /// Classify an I/O failure raised while writing a report to `path`.
    pub fn from_write(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::PermissionDenied {
            ScopusError::OutputWritePermission(path)
        } else {
            ScopusError::OutputWriteOther { path, source: err }
        }
    }
}

/// Result type alias using `ScopusError`
pub type Result<T> = std::result::Result<T, ScopusError>;
