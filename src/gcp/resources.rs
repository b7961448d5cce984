//! GCP resource enumeration
//!
//! Every list call follows `nextPageToken` to the end. Artifact Registry has
//! no aggregated listing, so repositories are swept location by location and
//! a failing location does not stop the others.

use super::client::GcpClient;
use super::http::format_gcp_error;
use crate::sweep::{report_failure, CallFailure, Finding, Reporter};
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Upper bound on pages per listing, against a server that never stops paging
const MAX_PAGES: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GcpResource {
    pub resource_type: String,
    pub name: String,
    pub location: Option<String>,
    pub details: BTreeMap<String, String>,
}

impl GcpResource {
    fn new(resource_type: &str, name: String, location: Option<String>) -> Self {
        Self {
            resource_type: resource_type.to_string(),
            name,
            location,
            details: BTreeMap::new(),
        }
    }

    /// Copy string fields of `item` into `details`, skipping absent ones
    fn with_fields(mut self, item: &Value, fields: &[&str]) -> Self {
        for field in fields {
            if let Some(value) = str_field(item, field) {
                self.details.insert(field.to_string(), value);
            }
        }
        self
    }
}

fn str_field(item: &Value, field: &str) -> Option<String> {
    item.get(field).and_then(Value::as_str).map(str::to_string)
}

/// Last path segment of a resource URL or name
fn last_segment(value: &str) -> String {
    value.rsplit('/').next().unwrap_or(value).to_string()
}

/// Array under `key` in one response page
fn items_under(key: &str) -> impl Fn(&Value) -> Vec<Value> + '_ {
    move |page| {
        page.get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    }
}

/// Instances from one page of an aggregated listing, across every zone scope
fn aggregated_instances(page: &Value) -> Vec<Value> {
    page.get("items")
        .and_then(Value::as_object)
        .map(|scopes| {
            scopes
                .values()
                .filter_map(|scope| scope.get("instances").and_then(Value::as_array))
                .flatten()
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn with_page_token(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}pageToken={}",
        url,
        separator,
        urlencoding::encode(token)
    )
}

/// GET every page of a listing and collect what `extract` pulls from each
pub async fn fetch_all<F>(client: &GcpClient, url: &str, extract: F) -> Result<Vec<Value>>
where
    F: Fn(&Value) -> Vec<Value>,
{
    let mut items = Vec::new();
    let mut page_url = url.to_string();

    for _ in 0..MAX_PAGES {
        let page = client.get(&page_url).await?;
        items.extend(extract(&page));

        match page.get("nextPageToken").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => page_url = with_page_token(url, token),
            _ => return Ok(items),
        }
    }

    tracing::warn!("Stopped paging {} after {} pages", url, MAX_PAGES);
    Ok(items)
}

/// Failure with the user-facing GCP message; the raw error goes to the log
fn gcp_failure(call: &str, e: &anyhow::Error) -> CallFailure {
    tracing::debug!("{} failed: {:#}", call, e);
    CallFailure {
        cause: format_gcp_error(e),
        ..CallFailure::new(call, e)
    }
}

fn emit_all(out: &mut dyn Reporter, resources: impl IntoIterator<Item = GcpResource>) {
    for resource in resources {
        out.found(Finding::Gcp(resource));
    }
}

pub async fn buckets(client: &GcpClient, out: &mut dyn Reporter) {
    match fetch_all(client, &client.buckets_url(), items_under("items")).await {
        Ok(items) => emit_all(
            out,
            items.iter().map(|item| {
                GcpResource::new(
                    "bucket",
                    str_field(item, "name").unwrap_or_default(),
                    str_field(item, "location"),
                )
                .with_fields(item, &["storageClass", "timeCreated"])
            }),
        ),
        Err(e) => report_failure(out, gcp_failure("storage.buckets.list", &e)),
    }
}

pub async fn instances(client: &GcpClient, out: &mut dyn Reporter) {
    let url = client.compute_aggregated_url("instances");
    match fetch_all(client, &url, aggregated_instances).await {
        Ok(items) => emit_all(
            out,
            items.iter().map(|item| {
                let mut resource = GcpResource::new(
                    "instance",
                    str_field(item, "name").unwrap_or_default(),
                    str_field(item, "zone").map(|z| last_segment(&z)),
                )
                .with_fields(item, &["status"]);

                if let Some(machine_type) = str_field(item, "machineType") {
                    resource
                        .details
                        .insert("machineType".to_string(), last_segment(&machine_type));
                }
                if let Some(nat_ip) = item
                    .pointer("/networkInterfaces/0/accessConfigs/0/natIP")
                    .and_then(Value::as_str)
                {
                    resource
                        .details
                        .insert("natIP".to_string(), nat_ip.to_string());
                }
                resource
            }),
        ),
        Err(e) => report_failure(out, gcp_failure("compute.instances.aggregatedList", &e)),
    }
}

pub async fn clusters(client: &GcpClient, out: &mut dyn Reporter) {
    match fetch_all(client, &client.clusters_url(), items_under("clusters")).await {
        Ok(items) => emit_all(
            out,
            items.iter().map(|item| {
                GcpResource::new(
                    "cluster",
                    str_field(item, "name").unwrap_or_default(),
                    str_field(item, "location"),
                )
                .with_fields(item, &["status", "endpoint", "currentMasterVersion"])
            }),
        ),
        Err(e) => report_failure(out, gcp_failure("container.clusters.list", &e)),
    }
}

/// Repositories in every Artifact Registry location of the project
pub async fn repositories(client: &GcpClient, out: &mut dyn Reporter) {
    let locations = match fetch_all(
        client,
        &client.artifact_locations_url(),
        items_under("locations"),
    )
    .await
    {
        Ok(items) => items
            .iter()
            .filter_map(|item| str_field(item, "locationId"))
            .collect::<Vec<_>>(),
        Err(e) => {
            report_failure(out, gcp_failure("artifactregistry.locations.list", &e));
            return;
        }
    };

    tracing::info!("Sweeping {} Artifact Registry locations", locations.len());

    for location in locations {
        out.region(&location);

        let url = client.repositories_url(&location);
        match fetch_all(client, &url, items_under("repositories")).await {
            Ok(items) => emit_all(
                out,
                items.iter().map(|item| {
                    GcpResource::new(
                        "repository",
                        str_field(item, "name")
                            .map(|n| last_segment(&n))
                            .unwrap_or_default(),
                        Some(location.clone()),
                    )
                    .with_fields(item, &["format", "mode", "description"])
                }),
            ),
            Err(e) => report_failure(
                out,
                gcp_failure("artifactregistry.repositories.list", &e).in_region(&location),
            ),
        }
    }
}
