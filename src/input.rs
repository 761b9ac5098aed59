//! Input spreadsheet loading.
//!
//! Reads the first sheet of a workbook (or a CSV file) and extracts the
//! `(id, doi)` pairs to process. Header matching ignores case and
//! surrounding whitespace.

use crate::error::{Result, ScopusError};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{error, info, warn};

/// Default name of the DOI column.
pub const DEFAULT_DOI_COLUMN: &str = "doi";
/// Default name of the row id column.
pub const DEFAULT_ID_COLUMN: &str = "id";

/// One DOI to look up, with the id of the spreadsheet row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub id: String,
    pub doi: String,
}

/// Load DOIs from `path`, logging failures and returning an empty list.
///
/// A missing file, an unreadable workbook or a missing DOI column is not
/// fatal to a run: it simply yields nothing to process.
pub fn load_dois(path: &Path, doi_column: &str, id_column: &str) -> Vec<InputRow> {
    match try_load_dois(path, doi_column, id_column) {
        Ok(rows) => {
            info!(path = %path.display(), count = rows.len(), "Input loaded");
            rows
        }
        Err(ScopusError::InputNotFound(p)) => {
            error!(path = %p.display(), "Input file not found");
            Vec::new()
        }
        Err(ScopusError::InputColumnMissing { column, available }) => {
            error!(column = %column, available = ?available, "DOI column not found");
            Vec::new()
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read input");
            Vec::new()
        }
    }
}

/// Fallible variant of [`load_dois`].
///
/// Rows whose DOI is blank are skipped. Without an id column, ids are the
/// 1-based data row positions.
pub fn try_load_dois(path: &Path, doi_column: &str, id_column: &str) -> Result<Vec<InputRow>> {
    if !path.exists() {
        return Err(ScopusError::InputNotFound(path.to_path_buf()));
    }

    let mut grid = read_grid(path)?.into_iter();
    let headers: Vec<String> = grid
        .next()
        .unwrap_or_default()
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let doi_column = doi_column.trim().to_lowercase();
    let id_column = id_column.trim().to_lowercase();

    let doi_idx = headers
        .iter()
        .position(|h| *h == doi_column)
        .ok_or_else(|| ScopusError::InputColumnMissing {
            column: doi_column.clone(),
            available: headers.clone(),
        })?;
    let id_idx = headers.iter().position(|h| *h == id_column);
    if id_idx.is_none() {
        warn!(column = %id_column, "Id column not found, using row positions");
    }

    let rows = grid
        .enumerate()
        .filter_map(|(i, row)| {
            let doi = row.get(doi_idx).map(|s| s.trim()).unwrap_or("");
            if doi.is_empty() {
                return None;
            }
            let id = match id_idx {
                Some(idx) => row.get(idx).map(|s| s.trim().to_string()).unwrap_or_default(),
                None => (i + 1).to_string(),
            };
            Some(InputRow {
                id,
                doi: doi.to_string(),
            })
        })
        .collect();

    Ok(rows)
}

/// Read every row of the input, header included, as display strings.
fn read_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut grid = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let first = grid.is_empty();
            grid.push(
                record
                    .iter()
                    .enumerate()
                    .map(|(i, f)| {
                        if first && i == 0 {
                            f.trim_start_matches('\u{feff}').to_string()
                        } else {
                            f.to_string()
                        }
                    })
                    .collect(),
            );
        }
        return Ok(grid);
    }

    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ScopusError::Spreadsheet(calamine::Error::Msg(
            "workbook has no sheets",
        )))??;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

/// Render a cell the way it reads in a spreadsheet: whole floats lose
/// their fractional part, empty cells become empty strings.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", *f as i64)
        }
        other => other.to_string(),
    }
}
