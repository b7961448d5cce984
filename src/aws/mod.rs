//! AWS interaction module
//!
//! # Module Structure
//!
//! - [`context`] - Credential loading, verification and regional views
//! - [`api`] - The provider calls the sweeps need, as a trait
//! - [`sdk`] - Implementation of that trait on the AWS SDK
//! - [`regions`] - Region resolution

pub mod api;
pub mod context;
pub mod regions;
pub mod sdk;

#[cfg(test)]
pub(crate) mod stub;

pub use api::AwsApi;
pub use context::AwsContext;
pub use sdk::SdkAwsApi;
