//! SDK-backed implementation of [`AwsApi`]

use super::api::*;
use super::context::{AwsContext, BOOTSTRAP_REGION, GLOBAL_REGION};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::primitives::DateTime;
use aws_sdk_ec2::types::Filter;

/// Calls AWS through the official SDK clients
pub struct SdkAwsApi {
    context: AwsContext,
}

impl SdkAwsApi {
    pub fn new(context: AwsContext) -> Self {
        Self { context }
    }
}

/// Flatten an SDK error and its source chain into one message
fn sdk_error<E: std::error::Error>(err: E) -> anyhow::Error {
    anyhow!("{}", DisplayErrorContext(err))
}

/// SDK getters return `&T` for required members and `Option<&T>` otherwise
trait Member<'a, T: ?Sized> {
    fn member(self) -> Option<&'a T>;
}

impl<'a, T: ?Sized> Member<'a, T> for &'a T {
    fn member(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<'a, T: ?Sized> Member<'a, T> for Option<&'a T> {
    fn member(self) -> Option<&'a T> {
        self
    }
}

fn text<'a>(value: impl Member<'a, str>) -> Option<String> {
    value.member().map(str::to_string)
}

fn timestamp(value: Option<&DateTime>) -> Option<String> {
    value
        .and_then(|t| chrono::DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .map(|t| t.to_rfc3339())
}

#[async_trait]
impl AwsApi for SdkAwsApi {
    async fn enabled_regions(&self) -> Result<Vec<String>> {
        let client = aws_sdk_ec2::Client::new(&self.context.regional(BOOTSTRAP_REGION));
        let output = client
            .describe_regions()
            .all_regions(false)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .regions()
            .iter()
            .filter_map(|r| text(r.region_name()))
            .collect())
    }

    async fn organization_accounts(&self) -> Result<Vec<String>> {
        let client = aws_sdk_organizations::Client::new(&self.context.regional(GLOBAL_REGION));
        let mut pages = client.list_accounts().into_paginator().send();

        let mut accounts = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            accounts.extend(page.accounts().iter().filter_map(|a| text(a.id())));
        }
        Ok(accounts)
    }

    async fn images(
        &self,
        region: &str,
        owners: &[String],
        public: bool,
    ) -> Result<Vec<ImageRecord>> {
        let client = aws_sdk_ec2::Client::new(&self.context.regional(region));
        let output = client
            .describe_images()
            .set_owners(Some(owners.to_vec()))
            .filters(
                Filter::builder()
                    .name("is-public")
                    .values(public.to_string())
                    .build(),
            )
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .images()
            .iter()
            .map(|image| ImageRecord {
                image_id: text(image.image_id()).unwrap_or_default(),
                owner_id: text(image.owner_id()),
                name: text(image.name()),
                description: text(image.description()),
                creation_date: text(image.creation_date()),
                public: image.public().unwrap_or(public),
            })
            .collect())
    }

    async fn public_snapshots(&self, region: &str, owner: &str) -> Result<Vec<SnapshotRecord>> {
        let client = aws_sdk_ec2::Client::new(&self.context.regional(region));
        let output = client
            .describe_snapshots()
            .owner_ids(owner)
            .restorable_by_user_ids("all")
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .snapshots()
            .iter()
            .map(|snapshot| SnapshotRecord {
                snapshot_id: text(snapshot.snapshot_id()).unwrap_or_default(),
                owner_id: text(snapshot.owner_id()),
                description: text(snapshot.description()),
                volume_size_gib: snapshot.volume_size(),
                encrypted: snapshot.encrypted(),
                start_time: timestamp(snapshot.start_time()),
            })
            .collect())
    }

    async fn public_repositories(&self, registry_id: &str) -> Result<Vec<RepositoryRecord>> {
        let client = aws_sdk_ecrpublic::Client::new(&self.context.regional(GLOBAL_REGION));
        let output = client
            .describe_repositories()
            .registry_id(registry_id)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .repositories()
            .iter()
            .map(|repo| RepositoryRecord {
                repository_name: text(repo.repository_name()).unwrap_or_default(),
                repository_uri: text(repo.repository_uri()),
                registry_id: text(repo.registry_id()),
                created_at: timestamp(repo.created_at()),
            })
            .collect())
    }

    async fn instances(&self, region: &str) -> Result<Vec<InstanceRecord>> {
        let client = aws_sdk_ec2::Client::new(&self.context.regional(region));
        let mut pages = client.describe_instances().into_paginator().send();

        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            for reservation in page.reservations() {
                instances.extend(reservation.instances().iter().map(|instance| InstanceRecord {
                    instance_id: text(instance.instance_id()).unwrap_or_default(),
                    http_tokens: instance
                        .metadata_options()
                        .and_then(|m| m.http_tokens())
                        .map(|t| t.as_str().to_string()),
                }));
            }
        }
        Ok(instances)
    }

    async fn applications(&self, region: &str) -> Result<Vec<String>> {
        let client = aws_sdk_elasticbeanstalk::Client::new(&self.context.regional(region));
        let output = client
            .describe_applications()
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .applications()
            .iter()
            .filter_map(|app| text(app.application_name()))
            .collect())
    }

    async fn environments(
        &self,
        region: &str,
        application: &str,
    ) -> Result<Vec<EnvironmentRecord>> {
        let client = aws_sdk_elasticbeanstalk::Client::new(&self.context.regional(region));
        let output = client
            .describe_environments()
            .application_name(application)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .environments()
            .iter()
            .map(|env| EnvironmentRecord {
                name: text(env.environment_name()).unwrap_or_default(),
                status: env.status().map(|s| s.as_str().to_string()),
                health: env.health().map(|h| h.as_str().to_string()),
                cname: text(env.cname()),
                platform_arn: text(env.platform_arn()),
                endpoint_url: text(env.endpoint_url()),
            })
            .collect())
    }

    async fn functions(&self, region: &str) -> Result<Vec<String>> {
        let client = aws_sdk_lambda::Client::new(&self.context.regional(region));
        let mut pages = client.list_functions().into_paginator().send();

        let mut functions = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(sdk_error)?;
            functions.extend(page.functions().iter().filter_map(|f| text(f.function_name())));
        }
        Ok(functions)
    }

    async fn function_policy(&self, region: &str, function: &str) -> Result<String> {
        let client = aws_sdk_lambda::Client::new(&self.context.regional(region));
        let output = client
            .get_policy()
            .function_name(function)
            .send()
            .await
            .map_err(sdk_error)?;

        text(output.policy()).ok_or_else(|| anyhow!("function {} has no policy", function))
    }

    async fn function_url(&self, region: &str, function: &str) -> Result<String> {
        let client = aws_sdk_lambda::Client::new(&self.context.regional(region));
        let output = client
            .get_function_url_config()
            .function_name(function)
            .send()
            .await
            .map_err(sdk_error)?;

        text(output.function_url()).ok_or_else(|| anyhow!("function {} has no URL", function))
    }

    async fn event_source_mappings(
        &self,
        region: &str,
        function: &str,
    ) -> Result<Vec<EventSourceMapping>> {
        let client = aws_sdk_lambda::Client::new(&self.context.regional(region));
        let output = client
            .list_event_source_mappings()
            .function_name(function)
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .event_source_mappings()
            .iter()
            .map(|m| EventSourceMapping {
                uuid: text(m.uuid()),
                event_source_arn: text(m.event_source_arn()),
                state: text(m.state()),
            })
            .collect())
    }

    async fn gateways(&self, region: &str, kind: GatewayKind) -> Result<Vec<GatewayApi>> {
        let config = self.context.regional(region);

        let apis = match kind {
            GatewayKind::Rest => {
                let output = aws_sdk_apigateway::Client::new(&config)
                    .get_rest_apis()
                    .send()
                    .await
                    .map_err(sdk_error)?;
                output
                    .items()
                    .iter()
                    .filter_map(|api| {
                        Some(GatewayApi {
                            id: text(api.id())?,
                            name: text(api.name())?,
                        })
                    })
                    .collect()
            }
            GatewayKind::Http => {
                let output = aws_sdk_apigatewayv2::Client::new(&config)
                    .get_apis()
                    .send()
                    .await
                    .map_err(sdk_error)?;
                output
                    .items()
                    .iter()
                    .filter_map(|api| {
                        Some(GatewayApi {
                            id: text(api.api_id())?,
                            name: text(api.name())?,
                        })
                    })
                    .collect()
            }
        };

        Ok(apis)
    }

    async fn gateway_stages(
        &self,
        region: &str,
        kind: GatewayKind,
        api_id: &str,
    ) -> Result<Vec<String>> {
        let config = self.context.regional(region);

        let stages = match kind {
            GatewayKind::Rest => aws_sdk_apigateway::Client::new(&config)
                .get_stages()
                .rest_api_id(api_id)
                .send()
                .await
                .map_err(sdk_error)?
                .item()
                .iter()
                .filter_map(|stage| text(stage.stage_name()))
                .collect(),
            GatewayKind::Http => aws_sdk_apigatewayv2::Client::new(&config)
                .get_stages()
                .api_id(api_id)
                .send()
                .await
                .map_err(sdk_error)?
                .items()
                .iter()
                .filter_map(|stage| text(stage.stage_name()))
                .collect(),
        };

        Ok(stages)
    }

    async fn distributions(&self) -> Result<Vec<DistributionSummary>> {
        let client = aws_sdk_cloudfront::Client::new(&self.context.regional(GLOBAL_REGION));
        let output = client
            .list_distributions()
            .send()
            .await
            .map_err(sdk_error)?;

        Ok(output
            .distribution_list()
            .map(|list| {
                list.items()
                    .iter()
                    .filter_map(|d| {
                        Some(DistributionSummary {
                            id: text(d.id())?,
                            domain_name: text(d.domain_name())?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn distribution_config(&self, id: &str) -> Result<DistributionConfigRecord> {
        let client = aws_sdk_cloudfront::Client::new(&self.context.regional(GLOBAL_REGION));
        let output = client
            .get_distribution_config()
            .id(id)
            .send()
            .await
            .map_err(sdk_error)?;

        let Some(config) = output.distribution_config() else {
            return Ok(DistributionConfigRecord::default());
        };

        let origins = config
            .origins()
            .member()
            .map(|o| {
                o.items()
                    .iter()
                    .filter_map(|origin| {
                        Some(OriginRecord {
                            id: text(origin.id())?,
                            domain_name: text(origin.domain_name())?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let cache_behaviors = config
            .cache_behaviors()
            .member()
            .map(|b| {
                b.items()
                    .iter()
                    .filter_map(|behavior| {
                        Some(CacheBehaviorRecord {
                            path_pattern: text(behavior.path_pattern())?,
                            target_origin_id: text(behavior.target_origin_id())?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(DistributionConfigRecord {
            origins,
            cache_behaviors,
        })
    }
}
