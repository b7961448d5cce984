//! AWS provider calls used by the sweeps
//!
//! Each method is one fallible, single-shot request. Regional calls take the
//! region explicitly; the implementation derives a regional view of the base
//! credentials for that call only.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Machine image returned by an ownership query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    pub image_id: String,
    pub owner_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub creation_date: Option<String>,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRecord {
    pub snapshot_id: String,
    pub owner_id: Option<String>,
    pub description: Option<String>,
    pub volume_size_gib: Option<i32>,
    pub encrypted: Option<bool>,
    pub start_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryRecord {
    pub repository_name: String,
    pub repository_uri: Option<String>,
    pub registry_id: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    pub instance_id: String,
    /// `required` or `optional`
    pub http_tokens: Option<String>,
}

impl InstanceRecord {
    /// IMDSv1 stays reachable while session tokens are optional
    pub fn allows_imdsv1(&self) -> bool {
        self.http_tokens.as_deref() == Some("optional")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentRecord {
    pub name: String,
    pub status: Option<String>,
    pub health: Option<String>,
    pub cname: Option<String>,
    pub platform_arn: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSourceMapping {
    pub uuid: Option<String>,
    pub event_source_arn: Option<String>,
    pub state: Option<String>,
}

/// API Gateway flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// API Gateway v1
    Rest,
    /// API Gateway v2
    Http,
}

impl GatewayKind {
    pub fn label(&self) -> &'static str {
        match self {
            GatewayKind::Rest => "REST",
            GatewayKind::Http => "HTTP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayApi {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionSummary {
    pub id: String,
    pub domain_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OriginRecord {
    pub id: String,
    pub domain_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheBehaviorRecord {
    pub path_pattern: String,
    pub target_origin_id: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DistributionConfigRecord {
    pub origins: Vec<OriginRecord>,
    pub cache_behaviors: Vec<CacheBehaviorRecord>,
}

#[async_trait]
pub trait AwsApi: Send + Sync {
    /// Enabled (opted-in) regions, listed against the bootstrap region
    async fn enabled_regions(&self) -> Result<Vec<String>>;

    /// Member account IDs of the caller's organization
    async fn organization_accounts(&self) -> Result<Vec<String>>;

    /// Images owned by `owners`, filtered on `is-public`
    async fn images(&self, region: &str, owners: &[String], public: bool)
        -> Result<Vec<ImageRecord>>;

    /// Snapshots owned by `owner` that anyone can restore
    async fn public_snapshots(&self, region: &str, owner: &str) -> Result<Vec<SnapshotRecord>>;

    /// Repositories in a public ECR registry
    async fn public_repositories(&self, registry_id: &str) -> Result<Vec<RepositoryRecord>>;

    async fn instances(&self, region: &str) -> Result<Vec<InstanceRecord>>;

    /// Elastic Beanstalk application names
    async fn applications(&self, region: &str) -> Result<Vec<String>>;

    async fn environments(&self, region: &str, application: &str)
        -> Result<Vec<EnvironmentRecord>>;

    /// Lambda function names
    async fn functions(&self, region: &str) -> Result<Vec<String>>;

    /// Resource policy document of a function
    async fn function_policy(&self, region: &str, function: &str) -> Result<String>;

    async fn function_url(&self, region: &str, function: &str) -> Result<String>;

    async fn event_source_mappings(
        &self,
        region: &str,
        function: &str,
    ) -> Result<Vec<EventSourceMapping>>;

    async fn gateways(&self, region: &str, kind: GatewayKind) -> Result<Vec<GatewayApi>>;

    /// Stage names of one gateway
    async fn gateway_stages(
        &self,
        region: &str,
        kind: GatewayKind,
        api_id: &str,
    ) -> Result<Vec<String>>;

    /// CloudFront distributions (global service)
    async fn distributions(&self) -> Result<Vec<DistributionSummary>>;

    async fn distribution_config(&self, id: &str) -> Result<DistributionConfigRecord>;
}
