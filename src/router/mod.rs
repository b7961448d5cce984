//! Action routing
//!
//! Maps a `(mode, platform, action)` triple to the handler that implements it
//! and checks the parameters that handler needs. The legal surface lives in
//! data (see [`registry`]) so adding an action or a platform touches one
//! table.
//!
//! Routing is pure selection: nothing here performs I/O.

mod registry;

use crate::error::ValidationError;
use crate::options::Options;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub use registry::{get_registry, legal_actions, lookup, RouteDef, RouteKey, RouteTable};

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auth,
    Unauth,
}

/// Cloud platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Aws,
    Gcp,
    Azure,
}

/// Every action name known to any platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Ami,
    Ebs,
    Ecr,
    Imdsv1,
    Beanstalk,
    Lambda,
    Cloudfront,
    Storage,
    Compute,
    Gke,
    Artifacts,
    Metadata,
    Acr,
    Aks,
    Imds,
}

/// Parameters an action may require before it can be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Profile,
    AccountsFile,
    ProjectId,
    SubscriptionId,
}

/// Concrete enumeration routine selected by a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    /// Public images per account, then private images across all accounts
    OwnedImages,
    /// Public EBS snapshots per account
    PublicSnapshots,
    /// Public ECR repositories per account (global endpoint)
    PublicRepositories,
    /// Instances still accepting IMDSv1
    MetadataOptions,
    BeanstalkEnvironments,
    LambdaFunctions,
    /// CloudFront distributions (global service)
    CloudFrontDistributions,
    /// Walk the EC2 instance metadata tree
    AwsMetadataTree,
    /// Read the instance identity document
    InstanceIdentity,
    /// Inspect the Lambda runtime surface of the current sandbox
    LambdaRuntime,
    /// Read the CloudFront-facing services domain from instance metadata
    ServicesDomain,
    /// Walk the GCE metadata server
    GcpMetadataTree,
    GcpBuckets,
    GcpInstances,
    GcpClusters,
    GcpRepositories,
    /// Read the Azure instance metadata document
    AzureInstance,
    /// Capability slot with no implementation yet
    Unsupported,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auth => "auth",
            Mode::Unauth => "unauth",
        }
    }
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Aws, Platform::Gcp, Platform::Azure];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Aws => "aws",
            Platform::Gcp => "gcp",
            Platform::Azure => "azure",
        }
    }
}

impl Action {
    pub const ALL: [Action; 15] = [
        Action::Ami,
        Action::Ebs,
        Action::Ecr,
        Action::Imdsv1,
        Action::Beanstalk,
        Action::Lambda,
        Action::Cloudfront,
        Action::Storage,
        Action::Compute,
        Action::Gke,
        Action::Artifacts,
        Action::Metadata,
        Action::Acr,
        Action::Aks,
        Action::Imds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Ami => "ami",
            Action::Ebs => "ebs",
            Action::Ecr => "ecr",
            Action::Imdsv1 => "imdsv1",
            Action::Beanstalk => "beanstalk",
            Action::Lambda => "lambda",
            Action::Cloudfront => "cloudfront",
            Action::Storage => "storage",
            Action::Compute => "compute",
            Action::Gke => "gke",
            Action::Artifacts => "artifacts",
            Action::Metadata => "metadata",
            Action::Acr => "acr",
            Action::Aks => "aks",
            Action::Imds => "imds",
        }
    }
}

impl Param {
    /// Command-line flag that supplies this parameter
    pub fn flag(&self) -> &'static str {
        match self {
            Param::Profile => "-profile",
            Param::AccountsFile => "-accounts-file",
            Param::ProjectId => "-project-id",
            Param::SubscriptionId => "-subscription-id",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(Mode, Platform, Action);

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auth" => Ok(Mode::Auth),
            "unauth" => Ok(Mode::Unauth),
            _ => Err(ValidationError::UnknownMode(s.to_string())),
        }
    }
}

impl FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownPlatform(s.to_string()))
    }
}

impl Action {
    /// Parse an action name; `None` when no platform knows it
    pub fn parse(s: &str) -> Option<Action> {
        let wanted = s.trim().to_ascii_lowercase();
        Action::ALL.into_iter().find(|a| a.as_str() == wanted)
    }
}

/// Parse raw selector strings into a route key.
///
/// Unknown actions (including names legal only for another platform or mode)
/// are reported together with the legal set for this mode and platform.
pub fn parse_key(mode: &str, platform: &str, action: &str) -> Result<RouteKey, ValidationError> {
    let mode: Mode = mode.parse()?;
    let platform: Platform = platform.parse()?;

    let unknown = || ValidationError::UnknownAction {
        mode,
        platform,
        action: action.to_string(),
        legal: legal_actions(mode, platform),
    };

    let action = Action::parse(action).ok_or_else(unknown)?;
    let key = RouteKey {
        mode,
        platform,
        action,
    };

    if lookup(&key).is_none() {
        return Err(unknown());
    }
    Ok(key)
}

/// Select the route for fully parsed options and check its required parameters
pub fn route(options: &Options) -> Result<&'static RouteDef, ValidationError> {
    let key = options.key();
    let Some(def) = lookup(&key) else {
        return Err(ValidationError::UnknownAction {
            mode: key.mode,
            platform: key.platform,
            action: key.action.to_string(),
            legal: legal_actions(key.mode, key.platform),
        });
    };

    if let Some(param) = def.required.iter().find(|p| !options.provides(**p)) {
        return Err(ValidationError::MissingRequiredParameter {
            platform: key.platform,
            action: key.action,
            param: *param,
        });
    }

    tracing::debug!(
        "routed {} {} {} -> {:?}",
        key.mode,
        key.platform,
        key.action,
        def.handler
    );
    Ok(def)
}
