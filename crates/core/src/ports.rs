//! Port interfaces for the host runtime
//!
//! Feeds never talk to the network, the cache or an AI service directly.
//! These traits define the boundaries; `calfeed-infra` provides the
//! adapters.

use std::time::Duration;

use async_trait::async_trait;
use calfeed_domain::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An HTTP GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Per-request timeout; the gateway default applies when `None`
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self { url: url.into(), headers: Vec::new(), timeout: None }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Failure reported by an [`HttpGateway`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl GatewayError {
    /// Transport failures, timeouts and HTTP 429 are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status { status, .. } => *status == 429,
        }
    }
}

/// HTTP GET returning the raw response body
#[async_trait]
pub trait HttpGateway: Send + Sync {
    async fn get_text(&self, request: &HttpRequest) -> std::result::Result<String, GatewayError>;
}

/// Value held by a [`KeyValueCache`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CachedValue {
    Json(Value),
    Text(String),
}

/// A cached value together with its absolute expiry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: CachedValue,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Key/value store with absolute expiry
///
/// Adapters may return expired entries; callers compare `expires_at` against
/// their own clock.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn set(&self, key: &str, value: CachedValue, expires_at: DateTime<Utc>) -> Result<()>;
}

/// Renders epoch seconds as the host's display string
pub trait DateFormatter: Send + Sync {
    fn format(&self, epoch_secs: i64) -> String;
}

/// AI text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Fetches a web page as readable text
#[async_trait]
pub trait PageReader: Send + Sync {
    async fn read(&self, url: &str) -> Result<String>;
}
