//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate a response body and drop non-printable characters before logging
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = match body.char_indices().nth(MAX_LOG_BODY_LENGTH) {
        Some((cut, _)) => format!(
            "{}... [truncated, {} bytes total]",
            &body[..cut],
            body.len()
        ),
        None => body.to_string(),
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// A response with a non-success status
#[derive(Error, Debug)]
#[error("API request failed: {status}")]
pub struct ApiStatusError {
    pub status: StatusCode,
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cloudenum/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make an authenticated GET request and parse the JSON body
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiStatusError { status }.into());
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse response JSON")
    }
}

/// Format a GCP API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_gcp_error(error: &anyhow::Error) -> String {
    let status = error
        .chain()
        .find_map(|e| e.downcast_ref::<ApiStatusError>())
        .map(|e| e.status.as_u16());

    let known = match status {
        Some(403) => Some("Permission denied. Check your GCP IAM permissions."),
        Some(401) => Some("Authentication failed. Run 'gcloud auth application-default login'."),
        Some(404) => Some("Resource not found."),
        Some(429) => Some("Rate limit exceeded."),
        Some(400) => Some("Invalid request. Check your parameters."),
        Some(500) | Some(503) => Some("GCP service temporarily unavailable."),
        _ => None,
    };
    if let Some(message) = known {
        return message.to_string();
    }

    let printable: Vec<char> = format!("{:#}", error)
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    let sanitized: String = printable.iter().take(80).collect();

    if printable.len() > 80 {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
