//! Error types for hlt-core.

use thiserror::Error;

/// Testnet guard failures.
///
/// Fatal in the CLI. The dashboard reports it and every action re-runs the
/// guard against the environment snapshot taken at startup, so the outcome
/// stays the same for the life of the process. Fixing it means a restart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "HL_IS_TESTNET !== 'true' (found {found:?}). This demo ONLY runs on testnet. Set HL_IS_TESTNET=true in .env"
    )]
    NotTestnet { found: Option<String> },

    #[error(
        "{name} does not look like a testnet URL: {url}. To avoid accidental mainnet requests, custom URLs must contain 'testnet'"
    )]
    NonTestnetUrl { name: &'static str, url: String },
}

/// Failures raised by an exchange SDK implementation.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The client does not provide this method; callers may try a fallback.
    #[error("{0} is not available on this client")]
    Unsupported(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Exchange functionality not available. Please provide a valid private key.")]
    MissingCredential,

    #[error("Exchange rejected request: {0}")]
    Rejected(String),
}

impl SdkError {
    /// Whether the caller should move on to the next method in a fallback chain.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
