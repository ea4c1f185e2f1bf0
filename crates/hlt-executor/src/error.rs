//! Executor error types.

use hlt_core::{ConfigError, SdkError};
use thiserror::Error;

/// Failure of a user-triggered action.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Missing or malformed user input; no network call was made.
    #[error("{0}")]
    Validation(String),

    #[error("Unknown market id: {0}")]
    UnknownMarket(String),

    #[error("Failed to {action}: {source}")]
    Transport {
        action: &'static str,
        #[source]
        source: SdkError,
    },
}

impl ActionError {
    pub fn transport(action: &'static str, source: SdkError) -> Self {
        Self::Transport { action, source }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
            Self::UnknownMarket(_) => "unknown_market",
            Self::Transport { .. } => "transport",
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Failures while building exchange clients.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Key error: {0}")]
    Key(#[from] crate::signer::KeyError),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
