//! HTTP client for metadata endpoints

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a metadata node could not be read
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} unreachable: {cause}")]
    Unreachable { url: String, cause: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// GET-only client with a fixed timeout and per-provider request headers
#[derive(Clone, Debug)]
pub struct MetadataClient {
    client: Client,
}

impl MetadataClient {
    /// Create a client sending `headers` on every request
    pub fn new(timeout: Duration, headers: &[(&'static str, &'static str)]) -> Result<Self> {
        let mut defaults = HeaderMap::new();
        for &(name, value) in headers {
            defaults.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let client = Client::builder()
            .user_agent(concat!("cloudenum/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .default_headers(defaults)
            .build()
            .context("Failed to create metadata HTTP client")?;

        Ok(Self { client })
    }

    /// EC2 IMDSv1 needs no headers
    pub fn aws(timeout: Duration) -> Result<Self> {
        Self::new(timeout, &[])
    }

    /// The GCE metadata server rejects requests without `Metadata-Flavor`
    pub fn gcp(timeout: Duration) -> Result<Self> {
        Self::new(timeout, &[("metadata-flavor", "Google")])
    }

    pub fn azure(timeout: Duration) -> Result<Self> {
        Self::new(timeout, &[("metadata", "true")])
    }

    /// Fetch a URL as text. Anything other than 200 is an error.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Unreachable {
                url: url.to_string(),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Unreachable {
            url: url.to_string(),
            cause: e.to_string(),
        })
    }
}
