//! Error types used throughout the workspace

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for calfeed
///
/// Every feed surfaces exactly one of these to its caller. The variant tells
/// the caller which part of the pipeline failed; the message is meant for
/// humans and may be localized.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CalFeedError {
    /// Missing or malformed feed settings, raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport failure or an empty response body
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream asked us to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Upstream answered with a semantic error code or status
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Response did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CalFeedError {
    /// Whether another attempt at the same request could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_) | Self::Timeout(_))
    }

    /// Short machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::RateLimited(_) => "rate_limited",
            Self::Upstream(_) => "upstream",
            Self::Parse(_) => "parse",
            Self::Cache(_) => "cache",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

macro_rules! map_variants {
    ($value:expr, $f:ident, [$($variant:ident),+ $(,)?]) => {
        match $value {
            $(CalFeedError::$variant(message) => CalFeedError::$variant($f(message)),)+
        }
    };
}

impl CalFeedError {
    /// The human-readable message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Network(m)
            | Self::RateLimited(m)
            | Self::Upstream(m)
            | Self::Parse(m)
            | Self::Cache(m)
            | Self::Auth(m)
            | Self::NotFound(m)
            | Self::InvalidInput(m)
            | Self::Timeout(m)
            | Self::Internal(m) => m,
        }
    }

    /// Rewrite the message, keeping the variant
    pub fn map_message(self, f: impl FnOnce(String) -> String) -> Self {
        map_variants!(
            self,
            f,
            [
                Config,
                Network,
                RateLimited,
                Upstream,
                Parse,
                Cache,
                Auth,
                NotFound,
                InvalidInput,
                Timeout,
                Internal,
            ]
        )
    }
}

impl From<serde_json::Error> for CalFeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type alias for calfeed operations
pub type Result<T> = std::result::Result<T, CalFeedError>;
