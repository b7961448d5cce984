//! Configuration Management
//!
//! Optional defaults for cloudenum, read from `<config_dir>/cloudenum/config.json`.
//! Command-line flags always win over values found here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default timeout for raw metadata endpoint requests
pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 5;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// AWS profile used when -profile is not given
    #[serde(default)]
    pub profile: Option<String>,
    /// Region used when -region is not given
    #[serde(default)]
    pub region: Option<String>,
    /// Accounts file used when -accounts-file is not given
    #[serde(default)]
    pub accounts_file: Option<PathBuf>,
    /// GCP project used when -project-id is not given
    #[serde(default)]
    pub project_id: Option<String>,
    /// Azure subscription used when -subscription-id is not given
    #[serde(default)]
    pub subscription_id: Option<String>,
    /// Timeout for metadata endpoint requests, in seconds
    #[serde(default)]
    pub metadata_timeout_secs: Option<u64>,
    /// Depth bound for metadata tree walks
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cloudenum").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Get effective AWS profile (CLI > config > AWS_PROFILE)
    pub fn effective_profile(&self, cli: Option<&str>) -> Option<String> {
        non_empty(cli)
            .or_else(|| non_empty(self.profile.as_deref()))
            .or_else(|| std::env::var("AWS_PROFILE").ok().filter(|p| !p.is_empty()))
    }

    /// Get effective GCP project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Option<String> {
        non_empty(cli)
            .or_else(|| non_empty(self.project_id.as_deref()))
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Get effective metadata timeout
    pub fn metadata_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.metadata_timeout_secs
                .unwrap_or(DEFAULT_METADATA_TIMEOUT_SECS),
        )
    }
}

/// Treat empty strings the same as missing values
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
