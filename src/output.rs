//! Terminal output
//!
//! Findings go to stdout, failures to stderr. In JSON mode stdout carries
//! only findings, one object per line, and progress lines move to stderr.

use crate::options::OutputFormat;
use crate::sweep::{CallFailure, Finding, Reporter};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};

#[derive(Serialize)]
struct Imdsv1Line<'a> {
    #[serde(rename = "InstanceID")]
    instance_id: &'a str,
    #[serde(rename = "AllowsIMDSv1")]
    allows_imdsv1: bool,
}

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Human-readable rendering of one finding, possibly several lines
pub fn render(finding: &Finding) -> String {
    let mut s = String::new();

    // Writing to a String cannot fail
    let _ = match finding {
        Finding::Image { image, .. } => writeln!(
            s,
            "  - AMI ID: {}\n    Owner: {}\n    Name: {}\n    Description: {}\n    Creation Date: {}\n    Public: {}\n    ---",
            image.image_id,
            or_empty(&image.owner_id),
            or_empty(&image.name),
            or_empty(&image.description),
            or_empty(&image.creation_date),
            image.public
        ),
        Finding::Snapshot { snapshot, .. } => writeln!(
            s,
            "  - Snapshot ID: {}\n    Owner: {}\n    Size: {} GiB\n    Encrypted: {}\n    Start Time: {}\n    Description: {}\n    ---",
            snapshot.snapshot_id,
            or_empty(&snapshot.owner_id),
            snapshot.volume_size_gib.map(|v| v.to_string()).unwrap_or_default(),
            snapshot.encrypted.unwrap_or(false),
            or_empty(&snapshot.start_time),
            or_empty(&snapshot.description)
        ),
        Finding::Repository {
            account,
            repository,
        } => writeln!(
            s,
            "  - Repository: {}\n    Account: {}\n    URI: {}\n    Created: {}\n    ---",
            repository.repository_name,
            account,
            or_empty(&repository.repository_uri),
            or_empty(&repository.created_at)
        ),
        Finding::Instance { instance_id, .. } => {
            let line = Imdsv1Line {
                instance_id,
                allows_imdsv1: true,
            };
            match serde_json::to_string(&line) {
                Ok(line) => writeln!(s, "{}", line),
                Err(e) => writeln!(s, "Error creating JSON output: {}", e),
            }
        }
        Finding::Environment { environment, .. } => {
            let _ = writeln!(s, "  Environment: {}", environment.name);
            let _ = writeln!(s, "    - Status: {}", or_empty(&environment.status));
            let _ = writeln!(s, "    - Health: {}", or_empty(&environment.health));
            if let Some(cname) = &environment.cname {
                let _ = writeln!(s, "    - CNAME: {}", cname);
            }
            if let Some(arn) = &environment.platform_arn {
                let _ = writeln!(s, "    - Platform: {}", arn);
            }
            Ok(())
        }
        Finding::Function(report) => {
            let _ = writeln!(s, "Function: {}", report.name);
            if let Some(policy) = &report.policy {
                let _ = writeln!(s, "  - Resource Policy:\n    {}", policy);
            }
            if let Some(url) = &report.function_url {
                let _ = writeln!(s, "  - Function URL: {}", url);
            }
            if !report.triggers.is_empty() {
                let _ = writeln!(s, "  - Event Source Mappings (Triggers):");
                for trigger in &report.triggers {
                    let _ = writeln!(
                        s,
                        "    UUID: {}, Source ARN: {}",
                        or_empty(&trigger.uuid),
                        or_empty(&trigger.event_source_arn)
                    );
                }
            }
            for (label, urls) in [("REST", &report.rest_urls), ("HTTP", &report.http_urls)] {
                if urls.is_empty() {
                    continue;
                }
                let _ = writeln!(s, "  - Associated {} API(s):", label);
                for url in urls {
                    let _ = writeln!(s, "    - Exposed URL: {}", url);
                }
            }
            writeln!(s, "-------------------------------------")
        }
        Finding::Distributions { distributions } => {
            match serde_json::to_string_pretty(distributions) {
                Ok(pretty) => writeln!(s, "{}", pretty),
                Err(e) => writeln!(s, "Error creating JSON output: {}", e),
            }
        }
        Finding::Gcp(resource) => {
            let _ = write!(s, "[{}] {}", resource.resource_type, resource.name);
            if let Some(location) = &resource.location {
                let _ = write!(s, " ({})", location);
            }
            for (key, value) in &resource.details {
                let _ = write!(s, " {}={}", key, value);
            }
            writeln!(s)
        }
        Finding::Metadata { key, value } => writeln!(s, "{}: {}", key, value),
        Finding::Identity(identity) => {
            let fields = [
                ("Region", &identity.region),
                ("Instance ID", &identity.instance_id),
                ("Instance Type", &identity.instance_type),
                ("Account ID", &identity.account_id),
                ("Availability Zone", &identity.availability_zone),
                ("Architecture", &identity.architecture),
                ("Image ID", &identity.image_id),
                ("Pending Time", &identity.pending_time),
                ("Version", &identity.version),
            ];
            for (label, value) in fields {
                if let Some(value) = value {
                    let _ = writeln!(s, "{}: {}", label, value);
                }
            }
            Ok(())
        }
        Finding::Runtime(report) => {
            let _ = writeln!(s, "Runtime API: {}", report.runtime_api);
            let _ = writeln!(
                s,
                "Next invocation URL (not polled): {}",
                report.next_invocation_url
            );
            let _ = writeln!(s, "/var/task present: {}", report.task_root_present);
            let _ = writeln!(s, "/var/runtime present: {}", report.runtime_dir_present);
            if !report.in_lambda() {
                let _ = writeln!(s, "Not running inside a Lambda sandbox");
            }
            if !report.environment.is_empty() {
                let _ = writeln!(s, "Environment:");
                for (name, value) in &report.environment {
                    let _ = writeln!(s, "  {}={}", name, value);
                }
            }
            Ok(())
        }
    };

    s
}

/// Reporter writing to a pair of streams
pub struct TextReporter<O: Write, E: Write> {
    out: O,
    err: E,
    format: OutputFormat,
    findings: usize,
    failures: usize,
}

impl TextReporter<io::Stdout, io::Stderr> {
    pub fn stdio(format: OutputFormat) -> Self {
        Self::new(io::stdout(), io::stderr(), format)
    }
}

impl<O: Write, E: Write> TextReporter<O, E> {
    pub fn new(out: O, err: E, format: OutputFormat) -> Self {
        Self {
            out,
            err,
            format,
            findings: 0,
            failures: 0,
        }
    }

    pub fn findings(&self) -> usize {
        self.findings
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Progress lines share stdout with text findings but never with JSON
    fn progress(&mut self, text: &str) {
        let _ = match self.format {
            OutputFormat::Text => writeln!(self.out, "{}", text),
            OutputFormat::Json => writeln!(self.err, "{}", text),
        };
    }
}

impl<O: Write, E: Write> Reporter for TextReporter<O, E> {
    fn region(&mut self, region: &str) {
        self.progress(&format!("\nRegion: {}\n================", region));
    }

    fn found(&mut self, finding: Finding) {
        self.findings += 1;
        let _ = match self.format {
            OutputFormat::Text => write!(self.out, "{}", render(&finding)),
            OutputFormat::Json => match serde_json::to_string(&finding) {
                Ok(line) => writeln!(self.out, "{}", line),
                Err(e) => {
                    tracing::error!("Failed to serialize finding: {}", e);
                    Ok(())
                }
            },
        };
    }

    fn failed(&mut self, failure: CallFailure) {
        self.failures += 1;
        let _ = writeln!(self.err, "{}", failure);
    }

    fn note(&mut self, message: &str) {
        self.progress(message);
    }
}
