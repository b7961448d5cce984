//! Resolved invocation options
//!
//! Built once from the command line plus the config file, then only read.

use crate::cli::Args;
use crate::config::{non_empty, Config};
use crate::error::ValidationError;
use crate::router::{self, Action, Mode, Param, Platform, RouteKey};
use std::path::PathBuf;
use std::time::Duration;

/// Platform-specific parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthParams {
    pub accounts_file: Option<PathBuf>,
    pub region: Option<String>,
    pub use_organization: bool,
    pub project_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// How findings are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub mode: Mode,
    pub platform: Platform,
    pub action: Action,
    pub profile: Option<String>,
    pub auth: AuthParams,
    pub output: OutputFormat,
    pub metadata_timeout: Duration,
    pub max_depth: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mode: Mode::Unauth,
            platform: Platform::Aws,
            action: Action::Imdsv1,
            profile: None,
            auth: AuthParams::default(),
            output: OutputFormat::Text,
            metadata_timeout: Config::default().metadata_timeout(),
            max_depth: None,
        }
    }
}

impl Options {
    /// Resolve command-line arguments against the config file.
    ///
    /// Fails on a missing or unknown mode, platform or action. Required
    /// parameters are checked later by [`router::route`].
    pub fn from_args(args: &Args, config: &Config) -> Result<Self, ValidationError> {
        let mode = non_empty(args.mode.as_deref()).ok_or(ValidationError::MissingMode)?;
        // Mode errors take precedence over missing flags
        mode.parse::<Mode>()?;
        let action = non_empty(args.action.as_deref()).ok_or(ValidationError::MissingAction)?;
        let platform =
            non_empty(args.platform.as_deref()).ok_or(ValidationError::MissingPlatform)?;

        let RouteKey {
            mode,
            platform,
            action,
        } = router::parse_key(&mode, &platform, &action)?;

        let auth = AuthParams {
            accounts_file: args
                .accounts_file
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .or_else(|| config.accounts_file.clone()),
            region: non_empty(args.region.as_deref())
                .or_else(|| non_empty(config.region.as_deref())),
            use_organization: args.use_organization,
            project_id: match platform {
                Platform::Gcp => config.effective_project(args.project_id.as_deref()),
                _ => non_empty(args.project_id.as_deref()),
            },
            subscription_id: non_empty(args.subscription_id.as_deref())
                .or_else(|| non_empty(config.subscription_id.as_deref())),
        };

        Ok(Self {
            mode,
            platform,
            action,
            profile: match platform {
                Platform::Aws => config.effective_profile(args.profile.as_deref()),
                _ => non_empty(args.profile.as_deref()),
            },
            auth,
            output: if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            metadata_timeout: config.metadata_timeout(),
            max_depth: args.max_depth.or(config.max_depth),
        })
    }

    pub fn key(&self) -> RouteKey {
        RouteKey {
            mode: self.mode,
            platform: self.platform,
            action: self.action,
        }
    }

    /// Whether a required parameter is present
    pub fn provides(&self, param: Param) -> bool {
        match param {
            Param::Profile => self.profile.is_some(),
            Param::AccountsFile => self.auth.accounts_file.is_some() || self.auth.use_organization,
            Param::ProjectId => self.auth.project_id.is_some(),
            Param::SubscriptionId => self.auth.subscription_id.is_some(),
        }
    }
}
