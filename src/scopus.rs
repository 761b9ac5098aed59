//! Scopus (Elsevier) API client.
//!
//! Implements [`MetadataService`] over two endpoints:
//! - Abstract retrieval: `GET /content/abstract/doi/{doi}?view=FULL`
//! - Author retrieval: `GET /content/author/author_id/{id}`
//!
//! Both need an API key (`X-ELS-APIKey`); an institutional token is sent
//! when configured. 429 responses are retried with exponential backoff.

use crate::error::{Result, ScopusError};
use crate::fetcher::{Article, AuthorProfile, AuthorRef, MetadataService};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Elsevier API base URL
pub const SCOPUS_API_BASE: &str = "https://api.elsevier.com";

/// Connection settings for [`ScopusClient`].
#[derive(Debug, Clone)]
pub struct ScopusConfig {
    pub api_key: String,
    pub inst_token: Option<String>,
    pub base_url: String,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl ScopusConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            inst_token: None,
            base_url: SCOPUS_API_BASE.to_string(),
            max_retries: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Scopus API client.
///
/// Constructed explicitly and handed to the pipeline; there is no global
/// session.
pub struct ScopusClient {
    client: reqwest::Client,
    config: ScopusConfig,
}

/// Outcome of a failed GET, before it is mapped to an article or author
/// error.
#[derive(Debug)]
enum HttpFailure {
    NotFound,
    Unauthorized,
    Other(String),
}

impl ScopusClient {
    pub fn new(config: ScopusConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ScopusError::Config("Scopus API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("scopus-authors/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScopusError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// GET `url` and decode the JSON body, retrying while rate limited.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, HttpFailure> {
        let mut backoff = Duration::from_millis(500);

        for attempt in 0..=self.config.max_retries {
            let mut request = self
                .client
                .get(url)
                .query(query)
                .header(ACCEPT, "application/json")
                .header("X-ELS-APIKey", &self.config.api_key);
            if let Some(token) = &self.config.inst_token {
                request = request.header("X-ELS-Insttoken", token);
            }

            debug!(url = %url, attempt = attempt + 1, "Scopus request");
            let response = request
                .send()
                .await
                .map_err(|e| HttpFailure::Other(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(|e| HttpFailure::Other(format!("Invalid response: {}", e)));
            }
            if status == StatusCode::NOT_FOUND {
                return Err(HttpFailure::NotFound);
            }
            if status == StatusCode::UNAUTHORIZED {
                return Err(HttpFailure::Unauthorized);
            }
            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.config.max_retries {
                warn!(
                    url = %url,
                    attempt = attempt + 1,
                    wait_ms = backoff.as_millis() as u64,
                    "Rate limited, waiting"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(HttpFailure::Other(format!(
                "HTTP {} - {}",
                status.as_u16(),
                body.trim()
            )));
        }

        Err(HttpFailure::Other("rate limit retries exhausted".to_string()))
    }
}

#[async_trait]
impl MetadataService for ScopusClient {
    async fn fetch_article(&self, doi: &str) -> Result<Article> {
        let url = format!(
            "{}/content/abstract/doi/{}",
            self.config.base_url.trim_end_matches('/'),
            encode_doi(doi)
        );
        match self
            .get_json::<AbstractEnvelope>(&url, &[("view", "FULL")])
            .await
        {
            Ok(envelope) => Ok(envelope.into_article()),
            Err(HttpFailure::NotFound) => Err(ScopusError::ArticleNotFound(doi.to_string())),
            Err(HttpFailure::Unauthorized) => Err(ScopusError::AuthUnauthorized),
            Err(HttpFailure::Other(msg)) => Err(ScopusError::ArticleFetchOther(msg)),
        }
    }

    async fn fetch_author_profile(&self, author_id: &str) -> Result<AuthorProfile> {
        let url = format!(
            "{}/content/author/author_id/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(author_id)
        );
        match self.get_json::<AuthorEnvelope>(&url, &[]).await {
            Ok(envelope) => envelope
                .document_count()
                .map(|document_count| AuthorProfile { document_count })
                .ok_or_else(|| {
                    ScopusError::AuthorProfileOther(format!(
                        "no document-count for author {}",
                        author_id
                    ))
                }),
            Err(HttpFailure::NotFound) => {
                Err(ScopusError::AuthorProfileNotFound(author_id.to_string()))
            }
            Err(HttpFailure::Unauthorized) => {
                Err(ScopusError::AuthorProfileOther("HTTP 401 - unauthorized".to_string()))
            }
            Err(HttpFailure::Other(msg)) => Err(ScopusError::AuthorProfileOther(msg)),
        }
    }
}

/// Percent-encode each path segment of a DOI, keeping the slashes.
fn encode_doi(doi: &str) -> String {
    doi.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// === Scopus API Response Types ===

/// Scopus JSON collapses one-element lists into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct AbstractEnvelope {
    #[serde(rename = "abstracts-retrieval-response")]
    response: AbstractResponse,
}

#[derive(Debug, Deserialize)]
struct AbstractResponse {
    #[serde(default)]
    coredata: Option<AbstractCoredata>,
    #[serde(default)]
    authors: Option<AuthorsBlock>,
}

#[derive(Debug, Deserialize)]
struct AbstractCoredata {
    #[serde(rename = "dc:title", default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorsBlock {
    #[serde(default)]
    author: Option<OneOrMany<ScopusAuthor>>,
}

#[derive(Debug, Deserialize)]
struct ScopusAuthor {
    #[serde(rename = "@auid", default)]
    auid: Option<serde_json::Value>,
    #[serde(rename = "ce:given-name", default)]
    given_name: Option<String>,
    #[serde(rename = "ce:surname", default)]
    surname: Option<String>,
    #[serde(rename = "preferred-name", default)]
    preferred_name: Option<PreferredName>,
}

#[derive(Debug, Deserialize)]
struct PreferredName {
    #[serde(rename = "ce:given-name", default)]
    given_name: Option<String>,
    #[serde(rename = "ce:surname", default)]
    surname: Option<String>,
}

impl AbstractEnvelope {
    fn into_article(self) -> Article {
        let title = self
            .response
            .coredata
            .and_then(|c| c.title)
            .unwrap_or_default();

        let authors = self
            .response
            .authors
            .and_then(|block| block.author)
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|a| {
                let preferred = a.preferred_name.as_ref();
                AuthorRef {
                    id: a.auid.as_ref().and_then(value_to_string).unwrap_or_default(),
                    given_name: a
                        .given_name
                        .or_else(|| preferred.and_then(|p| p.given_name.clone()))
                        .unwrap_or_default(),
                    surname: a
                        .surname
                        .or_else(|| preferred.and_then(|p| p.surname.clone()))
                        .unwrap_or_default(),
                }
            })
            .collect();

        Article { title, authors }
    }
}

#[derive(Debug, Deserialize)]
struct AuthorEnvelope {
    #[serde(rename = "author-retrieval-response")]
    response: OneOrMany<AuthorRetrieval>,
}

#[derive(Debug, Deserialize)]
struct AuthorRetrieval {
    #[serde(default)]
    coredata: Option<AuthorCoredata>,
}

#[derive(Debug, Deserialize)]
struct AuthorCoredata {
    #[serde(rename = "document-count", default)]
    document_count: Option<serde_json::Value>,
}

impl AuthorEnvelope {
    fn document_count(self) -> Option<u64> {
        self.response
            .into_vec()
            .into_iter()
            .next()?
            .coredata?
            .document_count
            .as_ref()
            .and_then(value_to_string)?
            .trim()
            .parse()
            .ok()
    }
}

/// Scopus sends ids and counts as strings or numbers depending on the view.
fn value_to_string(val: &serde_json::Value) -> Option<String> {
    match val {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => None,
        _ => Some(val.to_string()),
    }
}
