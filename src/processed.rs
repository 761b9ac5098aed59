//! DOIs already present in the persisted report.

use crate::table::Table;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Candidate DOI column names, in preference order (matched ignoring case).
const DOI_COLUMN_CANDIDATES: &[&str] = &["doi_limpo", "doi_clean", "doi"];

/// Normalized DOIs that need no lookup in this run.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    dois: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the DOIs of the report at `path`.
    ///
    /// A missing or unreadable report gives an empty set.
    pub fn from_report(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "No existing report");
            return Self::new();
        }

        match Table::read_csv(path) {
            Ok(table) => {
                let set = Self::from_table(&table);
                info!(path = %path.display(), count = set.len(), "Loaded processed DOIs");
                set
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read existing report, continuing without it"
                );
                Self::new()
            }
        }
    }

    /// Collect trimmed, non-empty values of the table's DOI column.
    pub fn from_table(table: &Table) -> Self {
        let Some(col) = DOI_COLUMN_CANDIDATES
            .iter()
            .find_map(|name| table.find_column_ci(name))
        else {
            warn!("Existing report has no DOI column");
            return Self::new();
        };

        let dois = (0..table.len())
            .filter_map(|row| table.cell(row, col))
            .map(str::trim)
            .filter(|doi| !doi.is_empty())
            .map(str::to_string)
            .collect();
        Self { dois }
    }

    pub fn contains(&self, doi: &str) -> bool {
        self.dois.contains(doi)
    }

    pub fn insert(&mut self, doi: impl Into<String>) -> bool {
        self.dois.insert(doi.into())
    }

    pub fn len(&self) -> usize {
        self.dois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dois.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    #[test]
    fn test_prefers_clean_doi_column() -> Result<()> {
        let data = "ID_Planilha,DOI_Original,doi_limpo\n\
                    1,https://doi.org/10.1/a,10.1/a\n2,x, 10.1/b \n3,y,\n";
        let set = ProcessedSet::from_table(&Table::from_reader(data.as_bytes())?);
        assert_eq!(set.len(), 2);
        assert!(set.contains("10.1/a"));
        assert!(set.contains("10.1/b"));
        assert!(!set.contains("https://doi.org/10.1/a"));
        Ok(())
    }

    #[test]
    fn test_falls_back_to_doi_column() -> Result<()> {
        let data = "id,DOI\n1,10.1/a\n";
        let set = ProcessedSet::from_table(&Table::from_reader(data.as_bytes())?);
        assert!(set.contains("10.1/a"));
        Ok(())
    }

    #[test]
    fn test_missing_report_is_empty() {
        assert!(ProcessedSet::from_report(Path::new("/nonexistent/report.csv")).is_empty());
    }
}
