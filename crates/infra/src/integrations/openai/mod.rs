//! OpenAI integration for feed text generation
//!
//! [`OpenAIClient`] wraps the Chat Completions API and implements the
//! [`TextGenerator`](calfeed_core::TextGenerator) port. Requests go through
//! [`HttpClient::send`](crate::http::HttpClient::send), so transport failures
//! and 5xx responses are retried with exponential backoff; 4xx responses are
//! mapped onto [`TextGenerationError`] without retrying.
//!
//! Defaults:
//! - Model: `gpt-4o-mini` (configurable via `with_model()` or `OPENAI_MODEL`)
//! - Endpoint: `https://api.openai.com/v1/chat/completions` (`OPENAI_API_URL`)

pub mod client;
pub mod types;

pub use client::OpenAIClient;
pub use types::TextGenerationError;
