//! Per-article author list formatting.
//!
//! Every row gets the formatted author list of its whole article in the
//! `Autores_Formatados` column, e.g.
//! `Curie, Marie, ID:123, (45) and Curie, Pierre, ID:456, (30)`.

use crate::record::{
    COL_AUTHOR_ID, COL_DOI_CLEAN, COL_DOI_ORIGINAL, COL_FORMATTED, COL_NAME, COL_PAPERS,
};
use crate::table::Table;
use std::collections::HashMap;

/// Separator between authors of one article.
pub const AUTHOR_SEPARATOR: &str = " and ";

/// Split a full name into `(surname, given)`.
///
/// The last whitespace-separated token is the surname. A single token is
/// taken as the given name with an empty surname.
pub fn split_name(name: &str) -> (String, String) {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (String::new(), only.to_string()),
        [given @ .., surname] => (surname.to_string(), given.join(" ")),
    }
}

/// Render one author as `"<surname>, <given>, ID:<id>, (<papers>)"`.
pub fn format_author(name: &str, author_id: &str, papers: &str) -> String {
    let (surname, given) = split_name(name.trim());
    format!("{}, {}, ID:{}, ({})", surname, given, author_id.trim(), papers)
}

/// Fill `Autores_Formatados` for every row.
///
/// Rows are grouped by `DOI_Limpo`, or `DOI_Original` when that column is
/// absent; groups keep first-encountered author order. Rows without a key
/// value get an empty string, and so does every row when neither key
/// column exists.
pub fn format_authors(table: &mut Table) {
    let key_col = table
        .column_index(COL_DOI_CLEAN)
        .or_else(|| table.column_index(COL_DOI_ORIGINAL));

    let Some(key_col) = key_col else {
        table.set_column(COL_FORMATTED, vec![Some(String::new()); table.len()]);
        return;
    };

    let field = |row: usize, column: &str| table.value(row, column).unwrap_or("").to_string();

    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for row in 0..table.len() {
        let Some(key) = table.cell(row, key_col) else {
            continue;
        };
        groups.entry(key.to_string()).or_default().push(format_author(
            &field(row, COL_NAME),
            &field(row, COL_AUTHOR_ID),
            &field(row, COL_PAPERS),
        ));
    }

    let joined: HashMap<String, String> = groups
        .into_iter()
        .map(|(key, parts)| (key, parts.join(AUTHOR_SEPARATOR)))
        .collect();

    let values = (0..table.len())
        .map(|row| {
            Some(
                table
                    .cell(row, key_col)
                    .and_then(|key| joined.get(key).cloned())
                    .unwrap_or_default(),
            )
        })
        .collect();
    table.set_column(COL_FORMATTED, values);
}
