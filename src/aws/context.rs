//! AWS credential context
//!
//! The base [`SdkConfig`] is loaded once. Every regional call works on a copy
//! with the region overridden, so nothing shared is ever mutated.

use crate::error::AuthError;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::error::DisplayErrorContext;

/// Region used to list the other regions
pub const BOOTSTRAP_REGION: &str = "us-east-1";

/// Region global services (CloudFront, ECR Public, Organizations) are pinned to
pub const GLOBAL_REGION: &str = "us-east-1";

#[derive(Clone, Debug)]
pub struct AwsContext {
    base: SdkConfig,
}

impl AwsContext {
    /// Load ambient credentials, or a named profile.
    ///
    /// A named profile is verified with a caller-identity call. This is the
    /// only validity check; later calls report their own failures.
    pub async fn load(profile: Option<&str>) -> Result<Self, AuthError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(name) = profile {
            loader = loader.profile_name(name);
        }

        let context = Self {
            base: loader.load().await,
        };

        if let Some(name) = profile {
            context.verify(name).await?;
        }

        Ok(context)
    }

    async fn verify(&self, profile: &str) -> Result<(), AuthError> {
        let sts = aws_sdk_sts::Client::new(&self.with_fallback_region(BOOTSTRAP_REGION));

        match sts.get_caller_identity().send().await {
            Ok(identity) => {
                tracing::info!(
                    "Profile {} verified as {}",
                    profile,
                    identity.arn().unwrap_or("-")
                );
                Ok(())
            }
            Err(e) => Err(AuthError::InvalidCredentials {
                profile: profile.to_string(),
                cause: DisplayErrorContext(e).to_string(),
            }),
        }
    }

    /// Regional view: same credentials, different regional endpoint
    pub fn regional(&self, region: &str) -> SdkConfig {
        self.base
            .to_builder()
            .region(Region::new(region.to_string()))
            .build()
    }

    /// Base config, or a regional view when the profile carries no region
    fn with_fallback_region(&self, region: &str) -> SdkConfig {
        if self.base.region().is_some() {
            self.base.clone()
        } else {
            self.regional(region)
        }
    }
}
