//! GCP API interaction module
//!
//! # Module Structure
//!
//! - [`auth`] - Application Default Credentials and the gcloud default project
//! - [`client`] - Project-bound client and service URL builders
//! - [`http`] - HTTP utilities for REST API calls
//! - [`resources`] - Paginated listings of buckets, instances, clusters and repositories
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::client::GcpClient;
//!
//! async fn example(out: &mut dyn Reporter) -> cloudenum::error::Result<()> {
//!     let client = GcpClient::new("my-project").await?;
//!     crate::gcp::resources::buckets(&client, out).await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod resources;

pub use client::GcpClient;
