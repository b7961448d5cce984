//! Error taxonomy
//!
//! Fatal errors end the invocation with a non-zero exit code. Per-call
//! failures inside a sweep are not errors at this level; they are reported
//! as [`crate::sweep::CallFailure`] and the sweep moves on.

use crate::router::{Action, Mode, Param, Platform};
use thiserror::Error;

/// Argument validation failures. Always raised before any network activity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("first argument must be either 'auth' or 'unauth'")]
    MissingMode,

    #[error("unknown mode '{0}': first argument must be either 'auth' or 'unauth'")]
    UnknownMode(String),

    #[error("-platform flag is required (valid platforms: aws, gcp, azure)")]
    MissingPlatform,

    #[error("invalid platform '{0}' (valid platforms: aws, gcp, azure)")]
    UnknownPlatform(String),

    #[error("-action flag is required")]
    MissingAction,

    #[error("action '{action}' is not valid for platform '{platform}' in {mode} mode (valid {mode} {platform} actions: {})", join_actions(.legal))]
    UnknownAction {
        mode: Mode,
        platform: Platform,
        action: String,
        legal: Vec<Action>,
    },

    #[error("{platform} {action} requires {}", .param.flag())]
    MissingRequiredParameter {
        platform: Platform,
        action: Action,
        param: Param,
    },

    #[error("{action} needs at least one account ID from -accounts-file or -use-organization")]
    EmptyAccountList { action: Action },
}

fn join_actions(actions: &[Action]) -> String {
    actions
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Credential loading and verification failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("error loading {provider} credentials: {cause}")]
    ConfigLoadFailure { provider: &'static str, cause: String },

    #[error("error verifying credentials for profile '{profile}': {cause}")]
    InvalidCredentials { profile: String, cause: String },
}

/// Region listing failed; the sweep never runs on a partial region list.
#[derive(Error, Debug)]
#[error("error getting regions: {cause}")]
pub struct ResolveError {
    pub cause: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Validation(_) => 1,
            Error::Auth(_) | Error::Resolve(_) | Error::Other(_) => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
