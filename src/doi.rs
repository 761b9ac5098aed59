//! DOI cleanup.
//!
//! Spreadsheets often carry DOIs as resolver URLs. The Scopus abstract
//! endpoint only accepts the bare identifier.

/// Resolver prefixes removed from raw DOIs, in removal order.
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "http://dx.doi.org/",
    "dx.doi.org/",
];

/// Strip surrounding whitespace and resolver prefixes from a raw DOI.
///
/// Matching is case-sensitive and the DOI syntax is not validated.
///
/// ```
/// use scopus_authors::doi::normalize_doi;
/// assert_eq!(normalize_doi(" https://doi.org/10.1016/xyz "), "10.1016/xyz");
/// ```
pub fn normalize_doi(raw: &str) -> String {
    DOI_PREFIXES
        .iter()
        .fold(raw.trim().to_string(), |doi, prefix| doi.replace(prefix, ""))
}
