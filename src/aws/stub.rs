//! Call-counting stand-in for [`AwsApi`] used by unit tests
//!
//! Responses are synthesized from the arguments so tests can tell cells
//! apart. Failures are keyed by `call:arg:arg`; any prefix of the full key
//! matches, so `fail("images:us-west-2")` fails every image call in that
//! region.

use super::api::*;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct StubAws {
    pub regions: Vec<String>,
    pub org_accounts: Vec<String>,
    pub instances: Vec<InstanceRecord>,
    pub applications: Vec<String>,
    pub environments: Vec<EnvironmentRecord>,
    pub functions: Vec<String>,
    pub policies: HashMap<String, String>,
    pub urls: HashMap<String, String>,
    pub gateways: Vec<GatewayApi>,
    pub stages: Vec<String>,
    pub distributions: Vec<DistributionSummary>,
    pub configs: HashMap<String, DistributionConfigRecord>,
    failures: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StubAws {
    pub fn with_regions(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn fail(&mut self, key: &str) {
        self.failures.insert(key.to_string());
    }

    /// Number of calls made to one method
    pub fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn check(&self, parts: &[&str]) -> Result<()> {
        self.calls.lock().unwrap().push(parts[0].to_string());

        for end in 1..=parts.len() {
            let key = parts[..end].join(":");
            if self.failures.contains(&key) {
                return Err(anyhow!("stubbed failure for {}", key));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AwsApi for StubAws {
    async fn enabled_regions(&self) -> Result<Vec<String>> {
        self.check(&["enabled_regions"])?;
        Ok(self.regions.clone())
    }

    async fn organization_accounts(&self) -> Result<Vec<String>> {
        self.check(&["organization_accounts"])?;
        Ok(self.org_accounts.clone())
    }

    async fn images(
        &self,
        region: &str,
        owners: &[String],
        public: bool,
    ) -> Result<Vec<ImageRecord>> {
        if public {
            let owner = owners.join(",");
            self.check(&["images", region, owner.as_str()])?;
            Ok(vec![ImageRecord {
                image_id: format!("ami-{}-{}", region, owner),
                owner_id: Some(owner),
                name: Some("golden".to_string()),
                description: None,
                creation_date: Some("2024-01-01T00:00:00.000Z".to_string()),
                public: true,
            }])
        } else {
            self.check(&["images", region, "private"])?;
            Ok(vec![ImageRecord {
                image_id: format!("ami-private-{}", region),
                owner_id: owners.first().cloned(),
                name: None,
                description: None,
                creation_date: None,
                public: false,
            }])
        }
    }

    async fn public_snapshots(&self, region: &str, owner: &str) -> Result<Vec<SnapshotRecord>> {
        self.check(&["public_snapshots", region, owner])?;
        Ok(vec![SnapshotRecord {
            snapshot_id: format!("snap-{}-{}", region, owner),
            owner_id: Some(owner.to_string()),
            description: None,
            volume_size_gib: Some(8),
            encrypted: Some(false),
            start_time: None,
        }])
    }

    async fn public_repositories(&self, registry_id: &str) -> Result<Vec<RepositoryRecord>> {
        self.check(&["public_repositories", registry_id])?;
        Ok(vec![RepositoryRecord {
            repository_name: format!("repo-{}", registry_id),
            repository_uri: Some(format!("public.ecr.aws/{}/repo", registry_id)),
            registry_id: Some(registry_id.to_string()),
            created_at: None,
        }])
    }

    async fn instances(&self, region: &str) -> Result<Vec<InstanceRecord>> {
        self.check(&["instances", region])?;
        Ok(self.instances.clone())
    }

    async fn applications(&self, region: &str) -> Result<Vec<String>> {
        self.check(&["applications", region])?;
        Ok(self.applications.clone())
    }

    async fn environments(
        &self,
        region: &str,
        application: &str,
    ) -> Result<Vec<EnvironmentRecord>> {
        self.check(&["environments", region, application])?;
        Ok(self.environments.clone())
    }

    async fn functions(&self, region: &str) -> Result<Vec<String>> {
        self.check(&["functions", region])?;
        Ok(self.functions.clone())
    }

    async fn function_policy(&self, region: &str, function: &str) -> Result<String> {
        self.check(&["function_policy", region, function])?;
        self.policies
            .get(function)
            .cloned()
            .ok_or_else(|| anyhow!("ResourceNotFoundException"))
    }

    async fn function_url(&self, region: &str, function: &str) -> Result<String> {
        self.check(&["function_url", region, function])?;
        self.urls
            .get(function)
            .cloned()
            .ok_or_else(|| anyhow!("ResourceNotFoundException"))
    }

    async fn event_source_mappings(
        &self,
        region: &str,
        function: &str,
    ) -> Result<Vec<EventSourceMapping>> {
        self.check(&["event_source_mappings", region, function])?;
        Ok(Vec::new())
    }

    async fn gateways(&self, region: &str, kind: GatewayKind) -> Result<Vec<GatewayApi>> {
        self.check(&["gateways", region, kind.label()])?;
        Ok(self.gateways.clone())
    }

    async fn gateway_stages(
        &self,
        region: &str,
        kind: GatewayKind,
        api_id: &str,
    ) -> Result<Vec<String>> {
        self.check(&["gateway_stages", region, kind.label(), api_id])?;
        Ok(self.stages.clone())
    }

    async fn distributions(&self) -> Result<Vec<DistributionSummary>> {
        self.check(&["distributions"])?;
        Ok(self.distributions.clone())
    }

    async fn distribution_config(&self, id: &str) -> Result<DistributionConfigRecord> {
        self.check(&["distribution_config", id])?;
        Ok(self.configs.get(id).cloned().unwrap_or_default())
    }
}
