//! Combining and ordering report rows.
//!
//! Rows are ordered by spreadsheet id, numerically when the id parses as a
//! number, then by clean DOI. Sorting is stable so rows with equal keys
//! keep their insertion order (existing rows before new ones).

use crate::record::{COL_DOI_CLEAN, COL_ID};
use crate::table::{Row, Table};
use std::cmp::Ordering;

/// Concatenate existing rows with new ones and sort the result.
pub fn merge(existing: Option<Table>, new: Table) -> Table {
    let mut combined = combine(existing, new);
    sort_rows(&mut combined);
    combined
}

/// Existing rows followed by new ones, in insertion order.
pub fn combine(existing: Option<Table>, new: Table) -> Table {
    match existing {
        Some(existing) => existing.concat(new),
        None => new,
    }
}

/// Sort by id (numeric first, then other strings, then missing) and clean DOI.
///
/// Without an id column only the clean DOI is used.
pub fn sort_rows(table: &mut Table) {
    let id_col = table.column_index(COL_ID);
    let doi_col = table.column_index(COL_DOI_CLEAN);
    table.sort_by(|a, b| {
        let by_id = match id_col {
            Some(col) => compare_ids(cell(a, col), cell(b, col)),
            None => Ordering::Equal,
        };
        by_id.then_with(|| match doi_col {
            Some(col) => missing_last(cell(a, col), cell(b, col)),
            None => Ordering::Equal,
        })
    });
}

/// Sort by id only, as the summary report is.
pub fn sort_by_id(table: &mut Table) {
    if let Some(col) = table.column_index(COL_ID) {
        table.sort_by(|a, b| compare_ids(cell(a, col), cell(b, col)));
    }
}

/// Numeric value of an id, if it is a finite number.
pub fn numeric_id(id: &str) -> Option<f64> {
    id.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn cell(row: &Row, col: usize) -> Option<&str> {
    row.get(col).and_then(|c| c.as_deref())
}

/// Numeric ids ascending, then non-numeric ids by string, then missing ids.
fn compare_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    let rank = |id: Option<&str>| match id {
        Some(s) => match numeric_id(s) {
            Some(_) => 0,
            None => 1,
        },
        None => 2,
    };

    match (rank(a), rank(b)) {
        (0, 0) => {
            let x = a.and_then(numeric_id).unwrap_or_default();
            let y = b.and_then(numeric_id).unwrap_or_default();
            x.total_cmp(&y)
        }
        (1, 1) => a.cmp(&b),
        (ra, rb) => ra.cmp(&rb),
    }
}

/// String order with missing values after present ones.
fn missing_last(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::COL_NAME;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().copied());
        for row in rows {
            t.push_row(
                row.iter()
                    .map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            );
        }
        t
    }

    fn column(t: &Table, name: &str) -> Vec<String> {
        (0..t.len())
            .map(|i| t.value(i, name).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_numeric_ids_first_non_numeric_last() {
        let mut t = table(
            &[COL_ID, COL_DOI_CLEAN],
            &[&["3", "10.1/c"], &["1", "10.1/a"], &["x", "10.1/x"], &["2", "10.1/b"]],
        );
        sort_rows(&mut t);
        assert_eq!(column(&t, COL_ID), ["1", "2", "3", "x"]);
    }

    #[test]
    fn test_ids_compare_numerically_not_lexically() {
        let mut t = table(
            &[COL_ID, COL_DOI_CLEAN],
            &[&["10", "a"], &["9", "a"], &["", "a"], &["b", "a"], &["a", "a"], &["2.5", "a"]],
        );
        sort_rows(&mut t);
        assert_eq!(column(&t, COL_ID), ["2.5", "9", "10", "a", "b", ""]);
    }

    #[test]
    fn test_infinite_ids_are_not_numeric() {
        let mut t = table(
            &[COL_ID, COL_DOI_CLEAN],
            &[&["inf", "a"], &["abc", "a"], &["2", "a"], &["-infinity", "a"], &["NaN", "a"]],
        );
        sort_rows(&mut t);
        assert_eq!(column(&t, COL_ID), ["2", "-infinity", "NaN", "abc", "inf"]);
        assert_eq!(numeric_id(" 1e3 "), Some(1000.0));
        assert_eq!(numeric_id("inf"), None);
    }

    #[test]
    fn test_doi_breaks_ties_and_sort_is_stable() {
        let mut t = table(
            &[COL_ID, COL_DOI_CLEAN, COL_NAME],
            &[
                &["1", "10.1/b", "first b"],
                &["1", "", "no doi"],
                &["1", "10.1/a", "a"],
                &["1", "10.1/b", "second b"],
            ],
        );
        sort_rows(&mut t);
        assert_eq!(column(&t, COL_NAME), ["a", "first b", "second b", "no doi"]);
    }

    #[test]
    fn test_without_id_column_sorts_by_doi() {
        let mut t = table(&[COL_DOI_CLEAN], &[&["10.1/b"], &["10.1/a"]]);
        sort_rows(&mut t);
        assert_eq!(column(&t, COL_DOI_CLEAN), ["10.1/a", "10.1/b"]);
    }

    #[test]
    fn test_merge_appends_new_after_existing() {
        let existing = table(&[COL_ID, COL_DOI_CLEAN, COL_NAME], &[&["2", "10.1/b", "old"]]);
        let new = table(
            &[COL_ID, COL_DOI_CLEAN, COL_NAME],
            &[&["2", "10.1/b", "new"], &["1", "10.1/a", "n1"]],
        );
        let merged = merge(Some(existing), new);
        assert_eq!(column(&merged, COL_NAME), ["n1", "old", "new"]);
    }

    #[test]
    fn test_sort_by_id_ignores_doi() {
        let mut t = table(
            &[COL_ID, COL_DOI_CLEAN],
            &[&["2", "a"], &["", "b"], &["1", "z"], &["1", "c"]],
        );
        sort_by_id(&mut t);
        assert_eq!(column(&t, COL_DOI_CLEAN), ["z", "c", "a", "b"]);
    }
}
