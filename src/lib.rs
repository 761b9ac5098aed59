//! # scopus-authors
//!
//! Scopus author statistics for a spreadsheet of DOIs.
//!
//! ## Modules
//!
//! - [`input`] - DOI spreadsheet loading
//! - [`doi`] - DOI cleanup
//! - [`fetcher`] - Per-DOI author records over a [`MetadataService`]
//! - [`scopus`] - Scopus API client
//! - [`processed`] - DOIs already in the report
//! - [`table`], [`merge`], [`format`], [`report`] - CSV reports
//! - [`pipeline`] - The whole run
//! - [`config`] - Stored credentials
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scopus_authors::pipeline::{run, RunOptions};
//! use scopus_authors::scopus::{ScopusClient, ScopusConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = ScopusClient::new(ScopusConfig::new("my-api-key"))?;
//!     let summary = run(&client, &RunOptions::default()).await;
//!     println!("Collected {} author records", summary.new_records);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod doi;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod input;
pub mod merge;
pub mod pipeline;
pub mod processed;
pub mod record;
pub mod report;
pub mod scopus;
pub mod table;

pub use error::{Result, ScopusError};
pub use fetcher::MetadataService;
