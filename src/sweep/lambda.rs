//! Lambda function sweep
//!
//! Each function is inspected for its resource policy, function URL, event
//! source mappings and any API Gateway that fronts it.
//!
//! Gateways are tied to a function by name containment: a gateway whose name
//! contains the function name is assumed to route to it. This is a heuristic.
//! Gateways named independently of their backing function are missed, and a
//! short function name can match unrelated gateways.

use super::{report_failure, CallFailure, Finding, Reporter};
use crate::aws::api::{EventSourceMapping, GatewayKind};
use crate::aws::AwsApi;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionReport {
    pub region: String,
    pub name: String,
    pub policy: Option<String>,
    pub function_url: Option<String>,
    pub triggers: Vec<EventSourceMapping>,
    pub rest_urls: Vec<String>,
    pub http_urls: Vec<String>,
}

/// Invoke URL of one gateway stage
pub fn exposed_url(api_id: &str, region: &str, stage: &str) -> String {
    format!(
        "https://{}.execute-api.{}.amazonaws.com/{}",
        api_id, region, stage
    )
}

pub async fn sweep(api: &dyn AwsApi, regions: &[String], out: &mut dyn Reporter) {
    out.note(&format!(
        "Checking Lambda functions in {} regions...",
        regions.len()
    ));

    for region in regions {
        out.region(region);

        let functions = match api.functions(region).await {
            Ok(functions) => functions,
            Err(e) => {
                report_failure(
                    out,
                    CallFailure::new("ListFunctions", &e).in_region(region),
                );
                continue;
            }
        };

        if functions.is_empty() {
            out.note("No Lambda functions found");
            continue;
        }

        for function in functions {
            let report = inspect(api, region, &function, out).await;
            out.found(Finding::Function(report));
        }
    }
}

async fn inspect(
    api: &dyn AwsApi,
    region: &str,
    function: &str,
    out: &mut dyn Reporter,
) -> FunctionReport {
    // Most functions have neither, so absence is not worth reporting
    let policy = match api.function_policy(region, function).await {
        Ok(policy) => Some(policy),
        Err(e) => {
            tracing::debug!("No policy for {}: {:#}", function, e);
            None
        }
    };

    let function_url = match api.function_url(region, function).await {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("No function URL for {}: {:#}", function, e);
            None
        }
    };

    let triggers = match api.event_source_mappings(region, function).await {
        Ok(mappings) => mappings,
        Err(e) => {
            report_failure(
                out,
                CallFailure::new("ListEventSourceMappings", &e).in_region(region),
            );
            Vec::new()
        }
    };

    FunctionReport {
        region: region.to_string(),
        name: function.to_string(),
        policy,
        function_url,
        triggers,
        rest_urls: gateway_urls(api, region, function, GatewayKind::Rest, out).await,
        http_urls: gateway_urls(api, region, function, GatewayKind::Http, out).await,
    }
}

async fn gateway_urls(
    api: &dyn AwsApi,
    region: &str,
    function: &str,
    kind: GatewayKind,
    out: &mut dyn Reporter,
) -> Vec<String> {
    let call = match kind {
        GatewayKind::Rest => "GetRestApis",
        GatewayKind::Http => "GetApis",
    };

    let gateways = match api.gateways(region, kind).await {
        Ok(gateways) => gateways,
        Err(e) => {
            report_failure(out, CallFailure::new(call, &e).in_region(region));
            return Vec::new();
        }
    };

    let mut urls = Vec::new();
    for gateway in gateways.iter().filter(|g| g.name.contains(function)) {
        match api.gateway_stages(region, kind, &gateway.id).await {
            Ok(stages) => urls.extend(
                stages
                    .iter()
                    .map(|stage| exposed_url(&gateway.id, region, stage)),
            ),
            Err(e) => report_failure(
                out,
                CallFailure::new("GetStages", &e).in_region(region),
            ),
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::api::GatewayApi;
    use crate::aws::stub::StubAws;
    use crate::sweep::Collector;
    use std::collections::HashMap;

    fn gateway(id: &str, name: &str) -> GatewayApi {
        GatewayApi {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn reports(out: &Collector) -> Vec<&FunctionReport> {
        out.findings
            .iter()
            .filter_map(|f| match f {
                Finding::Function(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_exposed_url_format() {
        assert_eq!(
            exposed_url("a1b2c3", "eu-west-1", "prod"),
            "https://a1b2c3.execute-api.eu-west-1.amazonaws.com/prod"
        );
    }

    #[tokio::test]
    async fn test_gateways_matched_by_name_containment() {
        let stub = StubAws {
            functions: vec!["orders".to_string()],
            policies: HashMap::from([("orders".to_string(), "{}".to_string())]),
            gateways: vec![gateway("abc", "orders-api"), gateway("zzz", "billing")],
            stages: vec!["prod".to_string(), "dev".to_string()],
            ..StubAws::default()
        };
        let mut out = Collector::default();

        sweep(&stub, &["us-east-1".to_string()], &mut out).await;

        let found = reports(&out);
        assert_eq!(found.len(), 1);
        let report = found[0];
        assert_eq!(report.policy.as_deref(), Some("{}"));
        assert_eq!(report.function_url, None);
        assert_eq!(
            report.rest_urls,
            vec![
                "https://abc.execute-api.us-east-1.amazonaws.com/prod",
                "https://abc.execute-api.us-east-1.amazonaws.com/dev",
            ]
        );
        assert_eq!(report.http_urls, report.rest_urls);
        // Stages are only fetched for the matching gateway
        assert_eq!(stub.count("gateway_stages"), 2);
        // Missing policy or URL is not a failure
        assert!(out.failures.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_listing_repeats_per_function() {
        let stub = StubAws {
            functions: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            ..StubAws::default()
        };
        let mut out = Collector::default();

        sweep(&stub, &["us-east-1".to_string()], &mut out).await;

        assert_eq!(reports(&out).len(), 3);
        assert_eq!(stub.count("gateways"), 6);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_reported_and_function_still_emitted() {
        let mut stub = StubAws {
            functions: vec!["orders".to_string()],
            ..StubAws::default()
        };
        stub.fail("gateways:us-east-1:HTTP");
        let mut out = Collector::default();

        sweep(&stub, &["us-east-1".to_string()], &mut out).await;

        assert_eq!(reports(&out).len(), 1);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].call, "GetApis");
    }

    #[tokio::test]
    async fn test_no_functions_notice() {
        let stub = StubAws::default();
        let mut out = Collector::default();

        sweep(&stub, &["sa-east-1".to_string()], &mut out).await;

        assert!(out.notes.contains(&"No Lambda functions found".to_string()));
        assert!(out.findings.is_empty());
    }
}
