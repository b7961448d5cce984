//! Region/account enumeration sweeps
//!
//! A sweep walks regions (and accounts, for ownership-scoped kinds), issuing
//! one provider call per cell. Results go to a [`Reporter`] as soon as they
//! arrive. A failed call is reported with its context and the sweep moves on;
//! nothing here aborts early.
//!
//! # Module Structure
//!
//! - [`images`] - Public then private machine images per account
//! - [`snapshots`] - Publicly restorable EBS snapshots per account
//! - [`repositories`] - Public ECR repositories per account
//! - [`instances`] - Instances still accepting IMDSv1
//! - [`beanstalk`] - Elastic Beanstalk environments
//! - [`lambda`] - Lambda functions and their exposure
//! - [`cloudfront`] - CloudFront distributions and their path patterns

pub mod beanstalk;
pub mod cloudfront;
pub mod images;
pub mod instances;
pub mod lambda;
pub mod repositories;
pub mod snapshots;

use crate::aws::api::{EnvironmentRecord, ImageRecord, RepositoryRecord, SnapshotRecord};
use crate::gcp::resources::GcpResource;
use crate::metadata::probes::{InstanceIdentity, RuntimeReport};
use serde::Serialize;
use std::fmt;

pub use cloudfront::DistributionDetails;
pub use lambda::FunctionReport;

/// One enumerated resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    Image {
        region: String,
        /// Account the public query ran for; `None` for the private pass
        account: Option<String>,
        image: ImageRecord,
    },
    Snapshot {
        region: String,
        account: String,
        snapshot: SnapshotRecord,
    },
    Repository {
        account: String,
        repository: RepositoryRecord,
    },
    Instance {
        region: String,
        instance_id: String,
    },
    Environment {
        region: String,
        application: String,
        environment: EnvironmentRecord,
    },
    Function(FunctionReport),
    /// Every distribution of the account, aggregated
    Distributions { distributions: Vec<DistributionDetails> },
    Gcp(GcpResource),
    /// Key/value pair read from a metadata endpoint
    Metadata { key: String, value: String },
    Identity(InstanceIdentity),
    Runtime(RuntimeReport),
}

/// A single provider call that failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallFailure {
    pub call: String,
    pub region: Option<String>,
    pub account: Option<String>,
    pub cause: String,
}

impl CallFailure {
    pub fn new(call: &str, cause: &anyhow::Error) -> Self {
        Self {
            call: call.to_string(),
            region: None,
            account: None,
            cause: format!("{:#}", cause),
        }
    }

    pub fn in_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn for_account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error calling {}", self.call)?;
        if let Some(account) = &self.account {
            write!(f, " for account {}", account)?;
        }
        if let Some(region) = &self.region {
            write!(f, " in {}", region)?;
        }
        write!(f, ": {}", self.cause)
    }
}

/// Receives sweep events in the order they happen
pub trait Reporter {
    /// A new region is about to be swept
    fn region(&mut self, _region: &str) {}

    fn found(&mut self, finding: Finding);

    fn failed(&mut self, failure: CallFailure);

    /// Progress or informational line
    fn note(&mut self, _message: &str) {}
}

/// Log a failed call and hand it to the reporter
pub(crate) fn report_failure(out: &mut dyn Reporter, failure: CallFailure) {
    tracing::warn!("{}", failure);
    out.failed(failure);
}

/// Reporter that keeps every event in memory
#[derive(Debug, Default)]
pub struct Collector {
    pub regions: Vec<String>,
    pub findings: Vec<Finding>,
    pub failures: Vec<CallFailure>,
    pub notes: Vec<String>,
}

impl Reporter for Collector {
    fn region(&mut self, region: &str) {
        self.regions.push(region.to_string());
    }

    fn found(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    fn failed(&mut self, failure: CallFailure) {
        self.failures.push(failure);
    }

    fn note(&mut self, message: &str) {
        self.notes.push(message.to_string());
    }
}
