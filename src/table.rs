//! In-memory string table backing the CSV reports.
//!
//! Persisted reports may carry columns this tool never wrote, so rows are
//! kept as named string columns rather than typed records. A cell is
//! `None` when the CSV field was empty or the column did not exist in the
//! source of that row.

use crate::error::{Result, ScopusError};
use crate::record::{AuthorRecord, RECORD_COLUMNS};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One table row.
pub type Row = Vec<Option<String>>;

/// Column-named table of optional string cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given header.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from freshly fetched records, in record order.
    pub fn from_records(records: &[AuthorRecord]) -> Self {
        let mut table = Self::new(RECORD_COLUMNS.iter().copied());
        for record in records {
            table.push_row(record.cells().into_iter().map(Some).collect());
        }
        table
    }

    /// Read a CSV file with a header row. A leading UTF-8 BOM is ignored.
    pub fn read_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = table.len(), "Loaded CSV table");
        Ok(table)
    }

    /// Read CSV data with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| {
                if i == 0 {
                    h.trim_start_matches('\u{feff}').to_string()
                } else {
                    h.to_string()
                }
            })
            .collect();

        let mut table = Self::new(columns);
        for record in rdr.records() {
            let record = record?;
            table.push_row(
                record
                    .iter()
                    .map(|field| (!field.is_empty()).then(|| field.to_string()))
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Write the table as BOM-prefixed CSV, replacing `path`.
    ///
    /// I/O failures are classified with [`ScopusError::from_write`] so a
    /// locked destination surfaces as `OutputWritePermission`.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ScopusError::from_write(path, e))?;
        let mut out = BufWriter::new(file);
        out.write_all(UTF8_BOM)
            .map_err(|e| ScopusError::from_write(path, e))?;
        self.write_to(&mut out).map_err(|e| match e {
            ScopusError::Csv(err) => csv_write_error(path, err),
            ScopusError::Io(err) => ScopusError::from_write(path, err),
            other => other,
        })?;
        out.flush().map_err(|e| ScopusError::from_write(path, e))?;
        Ok(())
    }

    /// Write header and rows as CSV (no BOM). Missing cells are empty fields.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Append a row, padding or truncating it to the table width.
    pub fn push_row(&mut self, mut row: Row) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Exact column lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column lookup ignoring case and surrounding whitespace.
    pub fn find_column_ci(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.trim().to_lowercase() == wanted)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Cell by column name; `None` when the column or the value is missing.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.cell(row, self.column_index(column)?)
    }

    /// Replace the values of `name`, appending the column when absent.
    ///
    /// `values` must hold one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<String>>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let col = match self.column_index(name) {
            Some(col) => col,
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[col] = value;
        }
    }

    /// Stack `other` below `self`.
    ///
    /// Columns are the union of both headers in order of first appearance;
    /// cells for columns a side lacks are missing.
    pub fn concat(mut self, other: Table) -> Table {
        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, None);
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        for row in other.rows {
            let mut merged = vec![None; width];
            for (value, &col) in row.into_iter().zip(&mapping) {
                merged[col] = value;
            }
            self.rows.push(merged);
        }
        self
    }

    /// Project onto the named columns, silently skipping absent ones.
    pub fn select(&self, names: &[&str]) -> Table {
        let picked: Vec<usize> = names
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        Table {
            columns: picked.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Stable sort of the rows.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Row, &Row) -> Ordering,
    {
        self.rows.sort_by(compare);
    }

    /// Keep only the first row for each distinct value of column `col`.
    ///
    /// Missing cells count as one shared value.
    pub fn dedup_by_column(&mut self, col: usize) {
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|row| seen.insert(row[col].clone()));
    }
}

fn csv_write_error(path: &Path, err: csv::Error) -> ScopusError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => ScopusError::from_write(path, e),
        other => ScopusError::OutputWriteOther {
            path: path.to_path_buf(),
            source: std::io::Error::other(format!("{:?}", other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cells(values: &[&str]) -> Row {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect()
    }

    #[test]
    fn test_read_strips_bom_and_maps_empty_to_missing() -> Result<()> {
        let data = "\u{feff}ID_Planilha,DOI_Limpo\n1,10.1/a\n,10.1/b\n";
        let table = Table::from_reader(data.as_bytes())?;
        assert_eq!(table.columns(), ["ID_Planilha", "DOI_Limpo"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, "ID_Planilha"), Some("1"));
        assert_eq!(table.value(1, "ID_Planilha"), None);
        Ok(())
    }

    #[test]
    fn test_write_csv_prefixes_bom() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("out.csv");
        let mut table = Table::new(["a", "b"]);
        table.push_row(cells(&["1", ""]));
        table.write_csv(&path)?;

        let bytes = std::fs::read(&path)?;
        assert!(bytes.starts_with(UTF8_BOM));
        assert_eq!(&bytes[3..], b"a,b\n1,\n");

        let back = Table::read_csv(&path)?;
        assert_eq!(back, table);
        Ok(())
    }

    #[test]
    fn test_concat_unions_columns() {
        let mut left = Table::new(["ID_Planilha", "DOI_Limpo", "Extra"]);
        left.push_row(cells(&["1", "10.1/a", "x"]));
        let mut right = Table::new(["DOI_Limpo", "Nome"]);
        right.push_row(cells(&["10.1/b", "Jane Doe"]));

        let merged = left.concat(right);
        assert_eq!(merged.columns(), ["ID_Planilha", "DOI_Limpo", "Extra", "Nome"]);
        assert_eq!(merged.value(0, "Nome"), None);
        assert_eq!(merged.value(1, "DOI_Limpo"), Some("10.1/b"));
        assert_eq!(merged.value(1, "Nome"), Some("Jane Doe"));
        assert_eq!(merged.value(1, "Extra"), None);
    }

    #[test]
    fn test_select_skips_absent_columns() {
        let mut table = Table::new(["a", "b", "c"]);
        table.push_row(cells(&["1", "2", "3"]));
        let picked = table.select(&["c", "zzz", "a"]);
        assert_eq!(picked.columns(), ["c", "a"]);
        assert_eq!(picked.value(0, "c"), Some("3"));
    }

    #[test]
    fn test_set_column_appends_or_replaces() {
        let mut table = Table::new(["a"]);
        table.push_row(cells(&["1"]));
        table.set_column("b", vec![Some("x".to_string())]);
        assert_eq!(table.value(0, "b"), Some("x"));
        table.set_column("a", vec![None]);
        assert_eq!(table.value(0, "a"), None);
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_find_column_ci() {
        let table = Table::new([" DOI_Limpo ", "id"]);
        assert_eq!(table.find_column_ci("doi_limpo"), Some(0));
        assert_eq!(table.find_column_ci("ID"), Some(1));
        assert_eq!(table.find_column_ci("title"), None);
    }
}
