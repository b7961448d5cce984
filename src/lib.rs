//! cloudenum
//!
//! Enumerates exposed cloud resources across regions and accounts. API
//! actions sweep provider management APIs with credentials; local probes
//! read instance metadata and runtime endpoints from inside a workload
//! without any.
//!
//! # Module Structure
//!
//! - [`cli`] / [`options`] / [`config`] - Command line, config file and resolved options
//! - [`router`] - (mode, platform, action) to handler, with parameter validation
//! - [`dispatch`] - Runs the selected handler
//! - [`aws`] / [`gcp`] - Provider clients
//! - [`sweep`] - Region/account enumeration sweeps and the reporter seam
//! - [`metadata`] - Metadata tree walker and local probes
//! - [`output`] - Text and JSON-lines reporter

pub mod accounts;
pub mod aws;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gcp;
pub mod metadata;
pub mod options;
pub mod output;
pub mod router;
pub mod sweep;

/// Version injected at compile time via CLOUDENUM_VERSION env var (set by CI/CD),
/// or the package version for local builds.
pub const VERSION: &str = match option_env!("CLOUDENUM_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
