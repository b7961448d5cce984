//! HTTP integration tests using wiremock
//!
//! These drive the public API end to end against mock metadata and GCP
//! endpoints, through the same reporters the binary uses.

use anyhow::Result;
use cloudenum::dispatch;
use cloudenum::gcp::auth::TokenSource;
use cloudenum::gcp::client::Endpoints;
use cloudenum::gcp::http::GcpHttpClient;
use cloudenum::gcp::{resources, GcpClient};
use cloudenum::metadata::{probes, walk, MetadataClient};
use cloudenum::options::{AuthParams, Options, OutputFormat};
use cloudenum::output::TextReporter;
use cloudenum::router::{self, Action, Mode, Platform};
use cloudenum::sweep::{Collector, Finding, Reporter};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FixedToken(&'static str);

#[async_trait::async_trait]
impl TokenSource for FixedToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

fn gcp_client(server: &MockServer) -> GcpClient {
    GcpClient::with_parts(
        Arc::new(FixedToken("integration-token")),
        GcpHttpClient::new().unwrap(),
        Endpoints::single(&server.uri()),
        "demo-project",
    )
}

fn json_reporter() -> TextReporter<Vec<u8>, Vec<u8>> {
    TextReporter::new(Vec::new(), Vec::new(), OutputFormat::Json)
}

fn text_reporter() -> TextReporter<Vec<u8>, Vec<u8>> {
    TextReporter::new(Vec::new(), Vec::new(), OutputFormat::Text)
}

fn streams(reporter: TextReporter<Vec<u8>, Vec<u8>>) -> (String, String) {
    let (out, err) = reporter.into_inner();
    (String::from_utf8(out).unwrap(), String::from_utf8(err).unwrap())
}

async fn serve_text(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .and(header("metadata-flavor", "Google"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// =============================================================================
// Metadata tree walks
// =============================================================================

#[tokio::test]
async fn test_gcp_metadata_walk_streams_json_lines() {
    let server = MockServer::start().await;
    serve_text(&server, "/computeMetadata/v1/", "instance/\nproject/\n").await;
    serve_text(&server, "/computeMetadata/v1/instance/", "hostname\nzone").await;
    serve_text(&server, "/computeMetadata/v1/instance/hostname", "vm-1.internal").await;
    serve_text(
        &server,
        "/computeMetadata/v1/instance/zone",
        "projects/123/zones/us-central1-a",
    )
    .await;
    serve_text(&server, "/computeMetadata/v1/project/", "project-id").await;
    serve_text(&server, "/computeMetadata/v1/project/project-id", "demo-project").await;

    let client = MetadataClient::gcp(Duration::from_secs(5)).unwrap();
    let root = format!("{}/computeMetadata/v1/", server.uri());
    let mut reporter = json_reporter();
    let leaves = walk(&client, &root, None, |key, value| {
        reporter.found(Finding::Metadata { key, value })
    })
    .await;

    assert_eq!(leaves, 3);
    assert_eq!(reporter.findings(), 3);

    let (out, err) = streams(reporter);
    assert!(err.is_empty());
    let lines: Vec<Value> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            json!({"kind": "metadata", "key": "instance/hostname", "value": "vm-1.internal"}),
            json!({"kind": "metadata", "key": "instance/zone", "value": "projects/123/zones/us-central1-a"}),
            json!({"kind": "metadata", "key": "project/project-id", "value": "demo-project"}),
        ]
    );
}

#[tokio::test]
async fn test_walk_without_flavor_header_finds_nothing() {
    let server = MockServer::start().await;
    serve_text(&server, "/computeMetadata/v1/", "project/\n").await;

    // The AWS client does not send the GCP header, so the mock never matches
    let client = MetadataClient::aws(Duration::from_secs(5)).unwrap();
    let root = format!("{}/computeMetadata/v1/", server.uri());
    let leaves = walk(&client, &root, None, |_, _| {}).await;
    assert_eq!(leaves, 0);
}

#[tokio::test]
async fn test_identity_document_renders_known_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/dynamic/instance-identity/document"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accountId": "123456789012",
            "region": "eu-west-1",
            "instanceId": "i-0123",
            "instanceType": "t3.micro"
        })))
        .mount(&server)
        .await;

    let client = MetadataClient::aws(Duration::from_secs(5)).unwrap();
    let url = format!("{}/latest/dynamic/instance-identity/document", server.uri());
    let identity = probes::instance_identity(&client, &url).await.unwrap();

    let mut reporter = text_reporter();
    reporter.found(Finding::Identity(identity));
    let (out, _) = streams(reporter);
    assert_eq!(
        out,
        "Region: eu-west-1\nInstance ID: i-0123\nInstance Type: t3.micro\nAccount ID: 123456789012\n"
    );
}

// =============================================================================
// GCP listings
// =============================================================================

#[tokio::test]
async fn test_bucket_listing_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b"))
        .and(header("authorization", "Bearer integration-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "logs", "location": "US", "storageClass": "STANDARD"},
                {"name": "site", "location": "EU"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut reporter = text_reporter();
    resources::buckets(&gcp_client(&server), &mut reporter).await;

    let (out, err) = streams(reporter);
    assert_eq!(out, "[bucket] logs (US) storageClass=STANDARD\n[bucket] site (EU)\n");
    assert!(err.is_empty());
}

#[tokio::test]
async fn test_permission_denied_goes_to_stderr() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let mut reporter = json_reporter();
    resources::instances(&gcp_client(&server), &mut reporter).await;

    assert_eq!(reporter.failures(), 1);
    let (out, err) = streams(reporter);
    assert!(out.is_empty());
    assert!(err.contains("compute.instances.aggregatedList"));
    assert!(err.contains("Permission denied"));
}

#[tokio::test]
async fn test_repository_sweep_reports_each_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/demo-project/locations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [{"locationId": "us-east1"}, {"locationId": "europe-west4"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/demo-project/locations/us-east1/repositories"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/demo-project/locations/europe-west4/repositories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "repositories": [{
                "name": "projects/demo-project/locations/europe-west4/repositories/charts",
                "format": "HELM"
            }]
        })))
        .mount(&server)
        .await;

    let mut out = Collector::default();
    resources::repositories(&gcp_client(&server), &mut out).await;

    assert_eq!(out.regions, vec!["us-east1", "europe-west4"]);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].region.as_deref(), Some("us-east1"));
    match out.findings.as_slice() {
        [Finding::Gcp(resource)] => {
            assert_eq!(resource.name, "charts");
            assert_eq!(resource.location.as_deref(), Some("europe-west4"));
            assert_eq!(resource.details["format"], "HELM");
        }
        other => panic!("unexpected findings {:?}", other),
    }
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_unsupported_azure_slot_runs_without_network() {
    let options = Options {
        mode: Mode::Auth,
        platform: Platform::Azure,
        action: Action::Aks,
        auth: AuthParams {
            subscription_id: Some("sub-42".to_string()),
            ..AuthParams::default()
        },
        ..Options::default()
    };
    let route = router::route(&options).unwrap();

    let mut out = Collector::default();
    dispatch::run(&options, route, &mut out).await.unwrap();

    assert!(out.findings.is_empty());
    assert!(out.failures.is_empty());
    assert_eq!(
        out.notes,
        vec!["azure aks enumeration is not yet supported (subscription sub-42)"]
    );
}
