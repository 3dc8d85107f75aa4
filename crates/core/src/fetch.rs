//! Retry-wrapped HTTP fetch
//!
//! Every upstream call goes through [`fetch_with_retry`]. Each attempt's
//! outcome is classified as success, retryable (transport failure, empty
//! body, rate limiting) or terminal (any other error status, unexpected
//! payload). Retryable failures are retried after a fixed delay until the
//! attempt budget runs out; terminal failures stop immediately. The whole
//! loop is bounded by an invocation timeout.

use std::time::Duration;

use calfeed_common::resilience::{
    RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
};
use calfeed_domain::CalFeedError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ports::{GatewayError, HttpGateway, HttpRequest};

/// Why a single attempt failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error("empty response body")]
    EmptyBody,

    #[error("{0}")]
    Gateway(GatewayError),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl AttemptFailure {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EmptyBody | Self::RateLimited(_) => true,
            Self::Gateway(err) => err.is_retryable(),
            Self::Upstream(_) | Self::Parse(_) => false,
        }
    }
}

/// Final failure of a retry-wrapped fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: AttemptFailure },

    #[error("attempt {attempt} failed: {reason}")]
    Terminal { attempt: u32, reason: AttemptFailure },

    #[error("fetch did not finish within {0:?}")]
    TimedOut(Duration),
}

impl FetchError {
    /// Number of attempts made, when known
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Exhausted { attempts, .. } => Some(*attempts),
            Self::Terminal { attempt, .. } => Some(*attempt),
            Self::TimedOut(_) => None,
        }
    }
}

impl From<FetchError> for CalFeedError {
    fn from(err: FetchError) -> Self {
        let message = err.to_string();
        match err {
            FetchError::TimedOut(_) => Self::Timeout(message),
            FetchError::Exhausted { last: AttemptFailure::RateLimited(_), .. } => {
                Self::RateLimited(message)
            }
            FetchError::Exhausted { .. } => Self::Network(message),
            FetchError::Terminal { reason, .. } => match reason {
                AttemptFailure::Parse(_) => Self::Parse(message),
                AttemptFailure::Gateway(GatewayError::Status { status: 401, .. }) => {
                    Self::Auth(message)
                }
                AttemptFailure::Gateway(GatewayError::Status { status: 404, .. }) => {
                    Self::NotFound(message)
                }
                AttemptFailure::Gateway(_) => Self::Network(message),
                _ => Self::Upstream(message),
            },
        }
    }
}

/// Outcome of inspecting a parsed response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Success,
    RateLimited(String),
    Failed(String),
}

/// Decides whether a parsed body is usable
pub trait ResponseClassifier: Send + Sync {
    fn classify(&self, body: &Value) -> Classification;
}

impl<F> ResponseClassifier for F
where
    F: Fn(&Value) -> Classification + Send + Sync,
{
    fn classify(&self, body: &Value) -> Classification {
        self(body)
    }
}

/// Classifier for APIs that signal errors only through HTTP status
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOnly;

impl ResponseClassifier for StatusOnly {
    fn classify(&self, _body: &Value) -> Classification {
        Classification::Success
    }
}

/// Attempt budget for one upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub request_timeout: Duration,
}

impl FetchPolicy {
    pub fn new(max_attempts: u32, delay: Duration, request_timeout: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), delay, request_timeout }
    }

    /// A single attempt, no retries
    pub fn once(request_timeout: Duration) -> Self {
        Self::new(1, Duration::ZERO, request_timeout)
    }

    /// Upper bound on the whole retry loop
    pub fn invocation_timeout(&self) -> Duration {
        (self.delay + self.request_timeout).saturating_mul(self.max_attempts)
    }
}

struct AttemptPolicy;

impl RetryPolicy<AttemptFailure> for AttemptPolicy {
    fn should_retry(&self, error: &AttemptFailure, _attempt: u32) -> RetryDecision {
        if error.is_retryable() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// GET `request` until `parse` accepts the body or the budget runs out
pub async fn fetch_with_retry<T, P>(
    gateway: &dyn HttpGateway,
    request: &HttpRequest,
    policy: &FetchPolicy,
    parse: P,
) -> Result<T, FetchError>
where
    P: Fn(String) -> Result<T, AttemptFailure>,
{
    let mut request = request.clone();
    request.timeout.get_or_insert(policy.request_timeout);
    let executor =
        RetryExecutor::new(RetryConfig::fixed(policy.max_attempts, policy.delay), AttemptPolicy);

    let attempts = executor.execute(|attempt| {
        let request = &request;
        let parse = &parse;
        async move {
            debug!(url = %request.url, attempt, "sending request");
            let body = gateway.get_text(request).await.map_err(AttemptFailure::Gateway)?;
            if body.trim().is_empty() {
                return Err(AttemptFailure::EmptyBody);
            }
            parse(body)
        }
    });

    let timeout = policy.invocation_timeout();
    match tokio::time::timeout(timeout, attempts).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(RetryError::AttemptsExhausted { attempts, last_error })) => {
            warn!(url = %request.url, attempts, error = %last_error, "retries exhausted");
            Err(FetchError::Exhausted { attempts, last: last_error })
        }
        Ok(Err(RetryError::NonRetryable { attempts, error })) => {
            warn!(url = %request.url, attempt = attempts, error = %error, "terminal fetch error");
            Err(FetchError::Terminal { attempt: attempts, reason: error })
        }
        Ok(Err(RetryError::InvalidConfiguration { message })) => Err(FetchError::Terminal {
            attempt: 0,
            reason: AttemptFailure::Upstream(message),
        }),
        Ok(Err(RetryError::TimeoutExceeded { .. })) | Err(_) => {
            warn!(url = %request.url, ?timeout, "fetch timed out");
            Err(FetchError::TimedOut(timeout))
        }
    }
}

/// Fetch a JSON body, classify it and deserialize it into `T`
pub async fn fetch_json<T: DeserializeOwned>(
    gateway: &dyn HttpGateway,
    request: &HttpRequest,
    policy: &FetchPolicy,
    classifier: &dyn ResponseClassifier,
) -> Result<T, FetchError> {
    fetch_with_retry(gateway, request, policy, |body| {
        let value: Value =
            serde_json::from_str(&body).map_err(|err| AttemptFailure::Parse(err.to_string()))?;
        match classifier.classify(&value) {
            Classification::Success => {
                serde_json::from_value(value).map_err(|err| AttemptFailure::Parse(err.to_string()))
            }
            Classification::RateLimited(reason) => Err(AttemptFailure::RateLimited(reason)),
            Classification::Failed(reason) => Err(AttemptFailure::Upstream(reason)),
        }
    })
    .await
}

/// Fetch a non-JSON body (HTML, XML) with the same retry rules
pub async fn fetch_text(
    gateway: &dyn HttpGateway,
    request: &HttpRequest,
    policy: &FetchPolicy,
) -> Result<String, FetchError> {
    fetch_with_retry(gateway, request, policy, Ok).await
}
