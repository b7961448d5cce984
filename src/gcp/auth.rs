//! GCP Authentication
//!
//! Application Default Credentials (ADC) through `gcp_auth`, plus the gcloud
//! default project lookup.

use crate::error::AuthError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use gcp_auth::TokenProvider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Refresh tokens this long before they would expire
const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// Assumed token lifetime (conservative: 30 minutes)
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Anything that can hand out a bearer token
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// ADC credentials with token caching
#[derive(Clone)]
pub struct GcpCredentials {
    provider: Arc<dyn TokenProvider>,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

impl GcpCredentials {
    /// Load Application Default Credentials
    pub async fn load() -> Result<Self, AuthError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| AuthError::ConfigLoadFailure {
                provider: "GCP",
                cause: format!(
                    "{}. Run 'gcloud auth application-default login'",
                    e
                ),
            })?;

        Ok(Self {
            provider,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }
}

#[async_trait]
impl TokenSource for GcpCredentials {
    /// Cached token while it is still valid, otherwise a fresh one
    async fn token(&self) -> Result<String> {
        {
            let cache = self.token_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.token.clone());
                }
                tracing::debug!("Cached token expired, fetching new token");
            }
        }

        let token = self
            .provider
            .token(DEFAULT_SCOPES)
            .await
            .context("Failed to get access token")?;
        let token_str = token.as_str().to_string();

        let mut cache = self.token_cache.write().await;
        *cache = Some(CachedToken {
            token: token_str.clone(),
            expires_at: Instant::now() + DEFAULT_TOKEN_TTL - TOKEN_EXPIRY_BUFFER,
        });

        Ok(token_str)
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    if project.len() < 6 || project.len() > 30 {
        return false;
    }

    match project.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }

    if project.ends_with('-') {
        return false;
    }

    project
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// `project` from the `[core]` section of a gcloud properties file.
///
/// Keys before any section header count as core.
fn core_project(content: &str) -> Option<String> {
    let mut in_core_section = true;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_core_section = line == "[core]";
            continue;
        }
        if !in_core_section {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let project = value.trim();
            if key.trim() == "project" && validate_project_id(project) {
                return Some(project.to_string());
            }
        }
    }

    None
}

/// Read the default project from the environment or gcloud configuration
/// Security: Validates project ID format before returning
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    let config_dir = get_gcloud_config_dir()?;

    if let Some(project) = std::fs::read_to_string(config_dir.join("properties"))
        .ok()
        .and_then(|content| core_project(&content))
    {
        return Some(project);
    }

    let active_config = std::fs::read_to_string(config_dir.join("active_config")).ok()?;
    let config_name = active_config.trim();

    // Security: Validate config name to prevent path traversal
    if !config_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let config_path = config_dir
        .join("configurations")
        .join(format!("config_{}", config_name));
    std::fs::read_to_string(config_path)
        .ok()
        .and_then(|content| core_project(&content))
}
