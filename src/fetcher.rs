//! Per-DOI author record retrieval.
//!
//! [`MetadataService`] is the seam to the bibliographic API. The fetcher
//! turns one DOI into author records, isolating failures: an article
//! lookup failure drops the DOI, an author profile failure only marks
//! that author's paper count.

use crate::doi::normalize_doi;
use crate::error::{Result, ScopusError};
use crate::record::{AuthorRecord, PaperCount};
use async_trait::async_trait;
use tracing::{info, warn};

/// Article metadata needed to build author records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    pub title: String,
    pub authors: Vec<AuthorRef>,
}

/// An author as listed on an article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorRef {
    pub id: String,
    pub given_name: String,
    pub surname: String,
}

impl AuthorRef {
    /// `"<given> <surname>"`, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.surname)
            .trim()
            .to_string()
    }
}

/// Aggregate statistics of one author.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthorProfile {
    pub document_count: u64,
}

/// Bibliographic metadata source.
///
/// `fetch_article` fails with `ArticleNotFound`, `AuthUnauthorized` or
/// `ArticleFetchOther`; `fetch_author_profile` with
/// `AuthorProfileNotFound` or `AuthorProfileOther`.
#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn fetch_article(&self, doi: &str) -> Result<Article>;

    async fn fetch_author_profile(&self, author_id: &str) -> Result<AuthorProfile>;
}

/// Fetch the article behind `raw_doi` and one record per listed author.
///
/// Never fails: article-level problems are logged and give an empty list.
pub async fn fetch_author_records<S>(service: &S, row_id: &str, raw_doi: &str) -> Vec<AuthorRecord>
where
    S: MetadataService + ?Sized,
{
    let doi_clean = normalize_doi(raw_doi);
    info!(doi = %doi_clean, "Processing");

    let article = match service.fetch_article(&doi_clean).await {
        Ok(article) => article,
        Err(ScopusError::ArticleNotFound(_)) => {
            warn!(doi = %doi_clean, "Article not found in Scopus (404)");
            return Vec::new();
        }
        Err(ScopusError::AuthUnauthorized) => {
            warn!(doi = %doi_clean, "Authentication error (401). Check your API key or connection");
            return Vec::new();
        }
        Err(e) => {
            warn!(doi = %doi_clean, error = %e, "Failed to fetch article");
            return Vec::new();
        }
    };

    if article.authors.is_empty() {
        info!(doi = %doi_clean, "No authors listed in the article metadata");
        return Vec::new();
    }

    let mut records = Vec::with_capacity(article.authors.len());
    for author in &article.authors {
        let paper_count = match service.fetch_author_profile(&author.id).await {
            Ok(profile) => PaperCount::Count(profile.document_count),
            Err(ScopusError::AuthorProfileNotFound(_)) => {
                warn!(author_id = %author.id, "Author profile not found");
                PaperCount::NotFound
            }
            Err(e) => {
                warn!(author_id = %author.id, error = %e, "Author profile lookup failed");
                PaperCount::Error
            }
        };

        records.push(AuthorRecord {
            row_id: row_id.to_string(),
            doi_original: raw_doi.to_string(),
            doi_clean: doi_clean.clone(),
            title: article.title.clone(),
            author_name: author.display_name(),
            author_id: author.id.clone(),
            paper_count,
        });
    }

    info!(doi = %doi_clean, authors = records.len(), "Authors processed");
    records
}


#[cfg(test)]
mod tests {
    use super::fake::{Failure, FakeService};
    use super::*;

    #[tokio::test]
    async fn test_records_per_author() {
        let service = FakeService::default()
            .with_article("10.1/xyz", "A Title", &[("999", "Jane", "Doe"), ("5", "Max", "Planck")])
            .with_profile("999", 10)
            .with_profile("5", 300);

        let records = fetch_author_records(&service, "7", " https://doi.org/10.1/xyz").await;
        assert_eq!(records.len(), 2);
        assert_eq!(service.article_calls(), ["10.1/xyz"]);

        let jane = &records[0];
        assert_eq!(jane.row_id, "7");
        assert_eq!(jane.doi_original, " https://doi.org/10.1/xyz");
        assert_eq!(jane.doi_clean, "10.1/xyz");
        assert_eq!(jane.title, "A Title");
        assert_eq!(jane.author_name, "Jane Doe");
        assert_eq!(jane.author_id, "999");
        assert_eq!(jane.paper_count, PaperCount::Count(10));
        assert_eq!(records[1].paper_count, PaperCount::Count(300));
    }

    #[tokio::test]
    async fn test_article_failures_yield_nothing() {
        let service = FakeService::default()
            .with_article_failure("10.1/auth", Failure::Unauthorized)
            .with_article_failure("10.1/boom", Failure::Other)
            .with_article("10.1/empty", "No authors", &[]);

        for doi in ["10.1/missing", "10.1/auth", "10.1/boom", "10.1/empty"] {
            assert!(fetch_author_records(&service, "1", doi).await.is_empty());
        }
        assert_eq!(service.article_calls().len(), 4);
    }

    #[tokio::test]
    async fn test_profile_failure_keeps_author() {
        let service = FakeService::default()
            .with_article(
                "10.1/p",
                "Partial",
                &[("1", "Ada", "Lovelace"), ("2", "Alan", "Turing"), ("3", "Grace", "Hopper")],
            )
            .with_profile("1", 4)
            .with_profile_failure("2", Failure::NotFound)
            .with_profile_failure("3", Failure::Other);

        let records = fetch_author_records(&service, "1", "10.1/p").await;
        let counts: Vec<PaperCount> = records.iter().map(|r| r.paper_count).collect();
        assert_eq!(
            counts,
            [PaperCount::Count(4), PaperCount::NotFound, PaperCount::Error]
        );
    }

    #[test]
    fn test_display_name() {
        let author = AuthorRef {
            id: "1".to_string(),
            given_name: String::new(),
            surname: "Plato".to_string(),
        };
        assert_eq!(author.display_name(), "Plato");
    }
}
