//! GCP Client
//!
//! Combines a token source with the HTTP client and builds the REST URLs of
//! the services this crate enumerates.

use super::auth::{GcpCredentials, TokenSource};
use super::http::GcpHttpClient;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Service roots, overridable so tests can point at a mock server
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub storage: String,
    pub compute: String,
    pub container: String,
    pub artifactregistry: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            storage: "https://storage.googleapis.com".to_string(),
            compute: "https://compute.googleapis.com".to_string(),
            container: "https://container.googleapis.com".to_string(),
            artifactregistry: "https://artifactregistry.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Every service served from one root
    pub fn single(root: &str) -> Self {
        let root = root.trim_end_matches('/').to_string();
        Self {
            storage: root.clone(),
            compute: root.clone(),
            container: root.clone(),
            artifactregistry: root,
        }
    }
}

/// Main GCP client, bound to one project
#[derive(Clone)]
pub struct GcpClient {
    tokens: Arc<dyn TokenSource>,
    http: GcpHttpClient,
    endpoints: Endpoints,
    pub project_id: String,
}

impl GcpClient {
    /// Client using Application Default Credentials
    pub async fn new(project_id: &str) -> crate::error::Result<Self> {
        let credentials = GcpCredentials::load().await?;
        Ok(Self::with_parts(
            Arc::new(credentials),
            GcpHttpClient::new()?,
            Endpoints::default(),
            project_id,
        ))
    }

    pub fn with_parts(
        tokens: Arc<dyn TokenSource>,
        http: GcpHttpClient,
        endpoints: Endpoints,
        project_id: &str,
    ) -> Self {
        Self {
            tokens,
            http,
            endpoints,
            project_id: project_id.to_string(),
        }
    }

    /// Make an authenticated GET request
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.tokens.token().await?;
        self.http.get(url, &token).await
    }

    // =========================================================================
    // Cloud Storage
    // =========================================================================

    /// Buckets of the project
    pub fn buckets_url(&self) -> String {
        format!(
            "{}/storage/v1/b?project={}",
            self.endpoints.storage,
            urlencoding::encode(&self.project_id)
        )
    }

    // =========================================================================
    // Compute Engine
    // =========================================================================

    /// Build Compute Engine API URL
    pub fn compute_url(&self, path: &str) -> String {
        format!(
            "{}/compute/v1/projects/{}/{}",
            self.endpoints.compute, self.project_id, path
        )
    }

    /// Build aggregated Compute Engine API URL (all zones)
    pub fn compute_aggregated_url(&self, resource: &str) -> String {
        self.compute_url(&format!("aggregated/{}", resource))
    }

    // =========================================================================
    // GKE
    // =========================================================================

    pub fn container_url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.endpoints.container, self.project_id, path
        )
    }

    /// Clusters in every location (`-` is the wildcard location)
    pub fn clusters_url(&self) -> String {
        self.container_url("locations/-/clusters")
    }

    // =========================================================================
    // Artifact Registry
    // =========================================================================

    pub fn artifactregistry_url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{}",
            self.endpoints.artifactregistry, self.project_id, path
        )
    }

    pub fn artifact_locations_url(&self) -> String {
        self.artifactregistry_url("locations")
    }

    pub fn repositories_url(&self, location: &str) -> String {
        self.artifactregistry_url(&format!("locations/{}/repositories", location))
    }
}
