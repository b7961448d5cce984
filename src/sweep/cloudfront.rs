//! CloudFront distribution sweep
//!
//! CloudFront is global: one listing call, then one config fetch per
//! distribution. Every distribution is aggregated into a single finding.

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::api::DistributionConfigRecord;
use crate::aws::AwsApi;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPatternUrl {
    pub path_pattern: String,
    #[serde(rename = "fullURL")]
    pub full_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionDetails {
    pub distribution_id: String,
    pub domain_name: String,
    pub urls_with_path_patterns: Vec<PathPatternUrl>,
}

/// Pair each cache behavior with the domain of its target origin.
///
/// A behavior whose origin is missing from the config gets an empty domain.
pub fn path_pattern_urls(config: &DistributionConfigRecord) -> Vec<PathPatternUrl> {
    config
        .cache_behaviors
        .iter()
        .map(|behavior| {
            let domain = config
                .origins
                .iter()
                .find(|origin| origin.id == behavior.target_origin_id)
                .map(|origin| origin.domain_name.as_str())
                .unwrap_or_default();

            PathPatternUrl {
                path_pattern: behavior.path_pattern.clone(),
                full_url: format!("{}{}", domain, behavior.path_pattern),
            }
        })
        .collect()
}

pub async fn sweep(api: &dyn AwsApi, out: &mut dyn Reporter) {
    out.note("Enumerating CloudFront distributions (global service)...");

    let distributions = match api.distributions().await {
        Ok(distributions) => distributions,
        Err(e) => {
            report_failure(out, CallFailure::new("ListDistributions", &e));
            return;
        }
    };

    if distributions.is_empty() {
        out.note("No CloudFront distributions found");
        return;
    }

    out.note(&format!(
        "Found {} CloudFront distributions",
        distributions.len()
    ));

    let mut details = Vec::with_capacity(distributions.len());
    for distribution in distributions {
        match api.distribution_config(&distribution.id).await {
            Ok(config) => details.push(DistributionDetails {
                urls_with_path_patterns: path_pattern_urls(&config),
                distribution_id: distribution.id,
                domain_name: distribution.domain_name,
            }),
            Err(e) => report_failure(
                out,
                CallFailure::new(&format!("GetDistributionConfig({})", distribution.id), &e),
            ),
        }
    }

    out.found(Finding::Distributions {
        distributions: details,
    });
}
