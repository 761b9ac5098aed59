//! Persistent settings for the Scopus API.
//!
//! Credentials live in `~/.scopus_authors.json`. Command-line flags and
//! environment variables take precedence over the file.

use crate::error::{Result, ScopusError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

const SETTINGS_FILE: &str = ".scopus_authors.json";

fn default_settings_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(SETTINGS_FILE))
        .ok_or_else(|| ScopusError::Config("Cannot determine home directory".to_string()))
}

/// Stored Scopus credentials and endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub inst_token: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Settings {
    /// API key with the secret part hidden, for display.
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(mask)
    }
}

fn mask(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

/// The JSON file holding [`Settings`] between runs.
///
/// A broken file never stops a run: flags and environment variables can
/// still supply the key, so `load` falls back to empty settings.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store in the home directory.
    pub fn new() -> Result<Self> {
        default_settings_path().map(Self::with_path)
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Stored settings, or empty ones when there are none usable.
    pub fn load(&self) -> Settings {
        match self.read() {
            Ok(Some(settings)) => {
                debug!(path = %self.path.display(), "Settings loaded");
                settings
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No settings file");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring settings file");
                Settings::default()
            }
        }
    }

    fn read(&self) -> Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Overwrite the file with `settings`.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        std::fs::write(&self.path, serde_json::to_string_pretty(settings)?)?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Delete the file; a missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "Settings removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for SettingsStore {
    /// Falls back to the working directory when there is no home directory.
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(PathBuf::from(SETTINGS_FILE)))
    }
}

/// First non-blank value, trimmed.
pub fn first_present<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
