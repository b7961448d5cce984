//! Instance-local metadata and runtime endpoints
//!
//! These answer without credentials from inside a cloud workload.
//!
//! # Module Structure
//!
//! - [`client`] - Plain HTTP GETs with a fixed timeout and provider headers
//! - [`walker`] - Depth-first walk of a directory-style metadata tree
//! - [`probes`] - Single-document probes (identity, runtime, Azure IMDS)

pub mod client;
pub mod probes;
pub mod walker;

pub use client::{FetchError, MetadataClient};
pub use walker::walk;

/// EC2 instance metadata tree (IMDSv1, no session token)
pub const AWS_METADATA_ROOT: &str = "http://169.254.169.254/latest/meta-data/";

pub const AWS_IDENTITY_URL: &str =
    "http://169.254.169.254/latest/dynamic/instance-identity/document";

pub const AWS_SERVICES_DOMAIN_URL: &str =
    "http://169.254.169.254/latest/meta-data/services/domain";

pub const GCP_METADATA_ROOT: &str = "http://metadata.google.internal/computeMetadata/v1/";

pub const AZURE_INSTANCE_URL: &str =
    "http://169.254.169.254/metadata/instance?api-version=2021-02-01";
