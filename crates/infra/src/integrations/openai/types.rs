//! OpenAI Chat Completions wire types
use calfeed_domain::CalFeedError;
use serde::{Deserialize, Serialize};

/// Text generation error types
#[derive(Debug, thiserror::Error)]
pub enum TextGenerationError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// OpenAI API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded (retry after {0}s)")]
    RateLimit(u64),

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body doesn't match expected schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),

    /// The model answered with nothing
    #[error("Empty completion")]
    EmptyCompletion,
}

impl From<TextGenerationError> for CalFeedError {
    fn from(err: TextGenerationError) -> Self {
        let message = err.to_string();
        match err {
            TextGenerationError::Network(_) => CalFeedError::Network(message),
            TextGenerationError::Api { .. } | TextGenerationError::EmptyCompletion => {
                CalFeedError::Upstream(message)
            }
            TextGenerationError::RateLimit(_) => CalFeedError::RateLimited(message),
            TextGenerationError::Authentication(_) => CalFeedError::Auth(message),
            TextGenerationError::InvalidSchema(_) => CalFeedError::Parse(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Response from OpenAI Chat Completions API
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: u32,
}
