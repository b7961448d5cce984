//! Handler execution
//!
//! Runs the routine a route selected. Credentials are only loaded for
//! handlers that call a management API; local endpoint probes never touch
//! them.

use crate::accounts::{load_accounts, merge_accounts};
use crate::aws::{regions, AwsApi, AwsContext, SdkAwsApi};
use crate::error::{Result, ValidationError};
use crate::gcp::{resources, GcpClient};
use crate::metadata::{self, probes, MetadataClient};
use crate::options::Options;
use crate::router::{Handler, RouteDef};
use crate::sweep::{self, report_failure, CallFailure, Finding, Reporter};

/// Execute `route` for `options`, reporting as it goes
pub async fn run(options: &Options, route: &RouteDef, out: &mut dyn Reporter) -> Result<()> {
    tracing::info!(
        "Running {} {} {} via {:?}",
        options.mode,
        options.platform,
        options.action,
        route.handler
    );

    match route.handler {
        Handler::OwnedImages
        | Handler::PublicSnapshots
        | Handler::PublicRepositories
        | Handler::MetadataOptions
        | Handler::BeanstalkEnvironments
        | Handler::LambdaFunctions
        | Handler::CloudFrontDistributions => {
            let context = AwsContext::load(options.profile.as_deref()).await?;
            let api = SdkAwsApi::new(context);
            aws_sweep(&api, route.handler, options, out).await
        }

        Handler::AwsMetadataTree => {
            let client = MetadataClient::aws(options.metadata_timeout)?;
            walk_tree(&client, metadata::AWS_METADATA_ROOT, options, out).await;
            Ok(())
        }
        Handler::GcpMetadataTree => {
            let client = MetadataClient::gcp(options.metadata_timeout)?;
            walk_tree(&client, metadata::GCP_METADATA_ROOT, options, out).await;
            Ok(())
        }

        Handler::InstanceIdentity => {
            out.note("Performing unauthenticated Beanstalk enumeration...");
            let client = MetadataClient::aws(options.metadata_timeout)?;
            match probes::instance_identity(&client, metadata::AWS_IDENTITY_URL).await {
                Ok(identity) => out.found(Finding::Identity(identity)),
                Err(e) => report_failure(out, CallFailure::new("instance identity document", &e)),
            }
            Ok(())
        }
        Handler::LambdaRuntime => {
            out.note("Performing unauthenticated Lambda enumeration...");
            out.found(Finding::Runtime(probes::current_runtime()));
            Ok(())
        }
        Handler::ServicesDomain => {
            out.note("Performing unauthenticated CloudFront enumeration...");
            let client = MetadataClient::aws(options.metadata_timeout)?;
            match probes::value(&client, metadata::AWS_SERVICES_DOMAIN_URL).await {
                Ok(value) => out.found(Finding::Metadata {
                    key: "services/domain".to_string(),
                    value,
                }),
                Err(e) => report_failure(out, CallFailure::new("services domain", &e)),
            }
            Ok(())
        }
        Handler::AzureInstance => {
            let client = MetadataClient::azure(options.metadata_timeout)?;
            match probes::json_document(&client, metadata::AZURE_INSTANCE_URL).await {
                Ok(pairs) => {
                    for (key, value) in pairs {
                        out.found(Finding::Metadata { key, value });
                    }
                }
                Err(e) => report_failure(out, CallFailure::new("instance metadata", &e)),
            }
            Ok(())
        }

        Handler::GcpBuckets
        | Handler::GcpInstances
        | Handler::GcpClusters
        | Handler::GcpRepositories => {
            let project = options.auth.project_id.as_deref().unwrap_or_default();
            out.note(&format!(
                "Enumerating GCP {} resources in project {}...",
                options.action, project
            ));
            let client = GcpClient::new(project).await?;
            gcp_sweep(&client, route.handler, out).await;
            Ok(())
        }

        Handler::Unsupported => {
            out.note(&unsupported_notice(options));
            Ok(())
        }
    }
}

fn unsupported_notice(options: &Options) -> String {
    match &options.auth.subscription_id {
        Some(subscription) => format!(
            "{} {} enumeration is not yet supported (subscription {})",
            options.platform, options.action, subscription
        ),
        None => format!(
            "{} {} enumeration is not yet supported",
            options.platform, options.action
        ),
    }
}

async fn walk_tree(client: &MetadataClient, root: &str, options: &Options, out: &mut dyn Reporter) {
    let leaves = metadata::walk(client, root, options.max_depth, |key, value| {
        out.found(Finding::Metadata { key, value })
    })
    .await;

    if leaves == 0 {
        out.note(&format!("No metadata reachable at {}", root));
    }
}

async fn gcp_sweep(client: &GcpClient, handler: Handler, out: &mut dyn Reporter) {
    match handler {
        Handler::GcpBuckets => resources::buckets(client, out).await,
        Handler::GcpInstances => resources::instances(client, out).await,
        Handler::GcpClusters => resources::clusters(client, out).await,
        Handler::GcpRepositories => resources::repositories(client, out).await,
        other => tracing::error!("{:?} is not a GCP handler", other),
    }
}

/// Account list from the accounts file plus, when asked, the organization
async fn resolve_accounts(
    api: &dyn AwsApi,
    options: &Options,
    out: &mut dyn Reporter,
) -> Result<Vec<String>> {
    let mut accounts = match &options.auth.accounts_file {
        Some(path) => load_accounts(path)?,
        None => Vec::new(),
    };

    if options.auth.use_organization {
        match api.organization_accounts().await {
            Ok(members) => {
                tracing::info!("Organization lists {} accounts", members.len());
                accounts = merge_accounts(accounts, members);
            }
            Err(e) => report_failure(out, CallFailure::new("ListAccounts", &e)),
        }
    }

    if accounts.is_empty() {
        return Err(ValidationError::EmptyAccountList {
            action: options.action,
        }
        .into());
    }

    out.note(&format!("Found {} accounts to check", accounts.len()));
    Ok(accounts)
}

/// Run an AWS management-API handler against `api`
pub async fn aws_sweep(
    api: &dyn AwsApi,
    handler: Handler,
    options: &Options,
    out: &mut dyn Reporter,
) -> Result<()> {
    let explicit_region = options.auth.region.as_deref();

    match handler {
        Handler::OwnedImages | Handler::PublicSnapshots => {
            let accounts = resolve_accounts(api, options, out).await?;
            let regions = regions::resolve(api, explicit_region).await?;
            out.note(&format!("Will check {} regions", regions.len()));

            if handler == Handler::OwnedImages {
                sweep::images::sweep(api, &regions, &accounts, out).await;
            } else {
                sweep::snapshots::sweep(api, &regions, &accounts, out).await;
            }
        }
        Handler::PublicRepositories => {
            let accounts = resolve_accounts(api, options, out).await?;
            sweep::repositories::sweep(api, &accounts, out).await;
        }
        Handler::MetadataOptions | Handler::BeanstalkEnvironments | Handler::LambdaFunctions => {
            let regions = regions::resolve(api, explicit_region).await?;
            match handler {
                Handler::MetadataOptions => sweep::instances::sweep(api, &regions, out).await,
                Handler::BeanstalkEnvironments => sweep::beanstalk::sweep(api, &regions, out).await,
                _ => sweep::lambda::sweep(api, &regions, out).await,
            }
        }
        Handler::CloudFrontDistributions => sweep::cloudfront::sweep(api, out).await,
        other => tracing::error!("{:?} is not an AWS API handler", other),
    }

    Ok(())
}
