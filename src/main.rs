//! scopus-authors - Scopus author statistics for a spreadsheet of DOIs
//!
//! Looks up every DOI of a spreadsheet in Scopus, fetches each author's
//! document count and writes a full per-author CSV plus a per-article
//! summary. Re-running only fetches DOIs not yet in the full report.
//!
//! ## Usage
//!
//! ```bash
//! scopus-authors config set-key <API_KEY>
//! scopus-authors run --input "Scopus Teste.xlsx"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scopus_authors::config::{first_present, Settings, SettingsStore};
use scopus_authors::pipeline::{self, RunOptions, RunSummary, DEFAULT_INPUT};
use scopus_authors::report::{DEFAULT_FULL_REPORT, DEFAULT_SUMMARY_REPORT};
use scopus_authors::scopus::{ScopusClient, ScopusConfig, SCOPUS_API_BASE};
use scopus_authors::ScopusError;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scopus author statistics for a spreadsheet of DOIs
#[derive(Parser)]
#[command(name = "scopus-authors")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch author statistics for every DOI of the input and update the reports
    Run {
        /// Input spreadsheet (.xlsx, .xls, .ods or .csv)
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        /// Full per-author report
        #[arg(short, long, default_value = DEFAULT_FULL_REPORT)]
        output: PathBuf,

        /// Per-article summary report
        #[arg(long, default_value = DEFAULT_SUMMARY_REPORT)]
        summary: PathBuf,

        /// Name of the DOI column (case-insensitive)
        #[arg(long, default_value = "doi")]
        doi_column: String,

        /// Name of the row id column (case-insensitive)
        #[arg(long, default_value = "id")]
        id_column: String,

        /// Scopus API key (get one at https://dev.elsevier.com/)
        #[arg(long, env = "SCOPUS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Institutional token
        #[arg(long, env = "SCOPUS_INST_TOKEN", hide_env_values = true)]
        inst_token: Option<String>,

        /// API base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Retries on HTTP 429
        #[arg(long, default_value = "3")]
        max_retries: u32,
    },

    /// Manage stored credentials
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show settings file path
    Path,
    /// Show stored settings (API key masked)
    Show,
    /// Store an API key
    SetKey {
        /// Scopus API key
        key: String,

        /// Institutional token
        #[arg(long)]
        inst_token: Option<String>,
    },
    /// Remove stored settings
    Clear,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Run {
            input,
            output,
            summary,
            doi_column,
            id_column,
            api_key,
            inst_token,
            base_url,
            max_retries,
        } => {
            let settings = SettingsStore::default().load();
            let config =
                resolve_client_config(&settings, api_key, inst_token, base_url, max_retries)?;
            let client = ScopusClient::new(config).context("Failed to set up the Scopus client")?;

            let options = RunOptions {
                input,
                full_report: output,
                summary_report: summary,
                doi_column,
                id_column,
            };
            let summary = pipeline::run(&client, &options).await;
            print_summary(&summary);
            Ok(())
        }
        Commands::Config { action } => handle_config(action),
    }
}

// ============================================================================
// Run
// ============================================================================

/// Merge flags, environment and stored settings into a client config.
///
/// A missing API key is the one setup failure that stops the program.
fn resolve_client_config(
    settings: &Settings,
    api_key: Option<String>,
    inst_token: Option<String>,
    base_url: Option<String>,
    max_retries: u32,
) -> Result<ScopusConfig> {
    let api_key = first_present([api_key.as_deref(), settings.api_key.as_deref()])
        .ok_or_else(|| {
            ScopusError::Config(
                "No Scopus API key. Pass --api-key, set SCOPUS_API_KEY or run \
                 `scopus-authors config set-key <KEY>` (get a key at https://dev.elsevier.com/)"
                    .to_string(),
            )
        })?;

    let mut config = ScopusConfig::new(api_key);
    config.inst_token = first_present([inst_token.as_deref(), settings.inst_token.as_deref()]);
    config.base_url = first_present([base_url.as_deref(), settings.base_url.as_deref()])
        .unwrap_or_else(|| SCOPUS_API_BASE.to_string());
    config.max_retries = max_retries;

    info!(
        base_url = %config.base_url,
        institutional = config.inst_token.is_some(),
        "Scopus client configured"
    );
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "=".repeat(50));
    println!(
        "DOIs: {} loaded, {} already in report, {} duplicates, {} fetched",
        summary.loaded, summary.skipped_existing, summary.skipped_duplicate, summary.fetched
    );
    println!("New author records: {}", summary.new_records);
    println!("{}", "=".repeat(50));

    match &summary.reports {
        Some(outcome) => {
            match &outcome.full {
                Ok(rows) => println!("✓ Saved {} rows to {}", rows, outcome.full_path.display()),
                Err(e) => println!("✗ {}", e),
            }
            match &outcome.summary {
                Ok(rows) => {
                    println!("✓ Saved {} rows to {}", rows, outcome.summary_path.display())
                }
                Err(e) => println!("✗ Could not generate summary: {}", e),
            }
        }
        None => println!("No data collected. Reports left unchanged."),
    }
}

// ============================================================================
// Settings Management
// ============================================================================

fn handle_config(action: ConfigAction) -> Result<()> {
    let store = SettingsStore::new()?;

    match action {
        ConfigAction::Path => {
            println!("Settings file: {:?}", store.path());
        }
        ConfigAction::Show => {
            let settings = store.load();
            println!("Settings file: {:?}", store.path());
            println!(
                "api_key:    {}",
                settings.masked_api_key().unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "inst_token: {}",
                if settings.inst_token.is_some() { "(set)" } else { "(not set)" }
            );
            println!(
                "base_url:   {}",
                settings.base_url.as_deref().unwrap_or(SCOPUS_API_BASE)
            );
        }
        ConfigAction::SetKey { key, inst_token } => {
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("API key must not be empty");
            }
            let mut settings = store.load();
            settings.api_key = Some(key.to_string());
            if inst_token.is_some() {
                settings.inst_token = inst_token;
            }
            store.save(&settings)?;
            println!("API key saved to {:?}", store.path());
        }
        ConfigAction::Clear => {
            store.clear()?;
            println!("Settings cleared.");
        }
    }

    Ok(())
}
