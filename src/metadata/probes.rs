//! Single-document probes
//!
//! Each probe reads one local endpoint (or the local environment) and turns
//! it into a typed record or flat key/value pairs.

use super::client::MetadataClient;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Fields of the EC2 instance identity document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceIdentity {
    pub region: Option<String>,
    pub instance_id: Option<String>,
    pub instance_type: Option<String>,
    pub account_id: Option<String>,
    pub availability_zone: Option<String>,
    pub architecture: Option<String>,
    pub image_id: Option<String>,
    pub pending_time: Option<String>,
    pub version: Option<String>,
}

pub async fn instance_identity(client: &MetadataClient, url: &str) -> Result<InstanceIdentity> {
    let body = client.fetch(url).await?;
    serde_json::from_str(&body).context("Failed to parse instance identity document")
}

/// Single-value read, such as the services domain
pub async fn value(client: &MetadataClient, url: &str) -> Result<String> {
    let body = client.fetch(url).await?;
    Ok(body.trim().to_string())
}

/// Read a JSON metadata document and flatten it to `/`-joined paths
pub async fn json_document(client: &MetadataClient, url: &str) -> Result<Vec<(String, String)>> {
    let body = client.fetch(url).await?;
    let document: Value =
        serde_json::from_str(&body).context("Failed to parse metadata document")?;
    Ok(flatten(&document))
}

/// Flatten nested JSON into `(path, value)` pairs, depth-first.
///
/// Array elements are keyed by index. Strings are emitted unquoted, `null`
/// as an empty string.
pub fn flatten(document: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into(document, String::new(), &mut pairs);
    pairs
}

fn flatten_into(value: &Value, path: String, pairs: &mut Vec<(String, String)>) {
    let child = |key: &str| {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", path, key)
        }
    };

    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(nested, child(key), pairs);
            }
        }
        Value::Array(items) => {
            for (index, nested) in items.iter().enumerate() {
                flatten_into(nested, child(&index.to_string()), pairs);
            }
        }
        Value::String(s) => pairs.push((path, s.clone())),
        Value::Null => pairs.push((path, String::new())),
        other => pairs.push((path, other.to_string())),
    }
}

pub const LAMBDA_RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";
pub const LAMBDA_RUNTIME_API_DEFAULT: &str = "localhost:9001";
pub const LAMBDA_TASK_ROOT: &str = "/var/task";
pub const LAMBDA_RUNTIME_DIR: &str = "/var/runtime";

/// What the current process can see of a Lambda sandbox
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeReport {
    pub runtime_api: String,
    /// Derived only; polling it would consume a live invocation
    pub next_invocation_url: String,
    pub task_root_present: bool,
    pub runtime_dir_present: bool,
    pub environment: BTreeMap<String, String>,
}

impl RuntimeReport {
    /// A sandbox is indicated by the runtime API variable or the task root
    pub fn in_lambda(&self) -> bool {
        self.environment.contains_key(LAMBDA_RUNTIME_API_VAR) || self.task_root_present
    }
}

fn is_secret(name: &str) -> bool {
    name.contains("SECRET") || name.contains("TOKEN")
}

/// Build a runtime report from environment variables and a path probe
pub fn inspect_runtime<I, P>(vars: I, exists: P) -> RuntimeReport
where
    I: IntoIterator<Item = (String, String)>,
    P: Fn(&Path) -> bool,
{
    let environment: BTreeMap<String, String> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with("AWS_") || name.starts_with("LAMBDA_"))
        .map(|(name, value)| {
            let value = if is_secret(&name) {
                "<redacted>".to_string()
            } else {
                value
            };
            (name, value)
        })
        .collect();

    let runtime_api = environment
        .get(LAMBDA_RUNTIME_API_VAR)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| LAMBDA_RUNTIME_API_DEFAULT.to_string());

    RuntimeReport {
        next_invocation_url: format!(
            "http://{}/2018-06-01/runtime/invocation/next",
            runtime_api
        ),
        runtime_api,
        task_root_present: exists(Path::new(LAMBDA_TASK_ROOT)),
        runtime_dir_present: exists(Path::new(LAMBDA_RUNTIME_DIR)),
        environment,
    }
}

/// Runtime report for the current process
pub fn current_runtime() -> RuntimeReport {
    inspect_runtime(std::env::vars(), |p| p.exists())
}
