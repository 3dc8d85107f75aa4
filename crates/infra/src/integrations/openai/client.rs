/// OpenAI API client for free-form text generation
use async_trait::async_trait;
use calfeed_core::TextGenerator;
use calfeed_domain::{CalFeedError, Result};
use reqwest::Method;
use tracing::{debug, info};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, TextGenerationError,
};
use crate::http::HttpClient;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 1_000;
const DEFAULT_TEMPERATURE: f32 = 0.8;

/// OpenAI API client used as the feeds' [`TextGenerator`]
pub struct OpenAIClient {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key (required)
    /// * `http_client` - HTTP client; its retry budget applies to every call
    pub fn new(api_key: String, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a compatible endpoint (proxies, local models, tests)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` as a single user message and return the reply text
    pub async fn complete(&self, prompt: &str) -> std::result::Result<String, TextGenerationError> {
        let request_payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage { role: "user".to_string(), content: prompt.to_string() }],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let request_builder = self
            .http_client
            .request(Method::POST, &self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_payload);

        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            CalFeedError::Network(msg) | CalFeedError::Internal(msg) => {
                TextGenerationError::Network(msg)
            }
            other => TextGenerationError::Network(format!("HTTP error: {}", other)),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received OpenAI API response");

        if !status.is_success() {
            return Err(self.handle_error_status(status.as_u16(), response).await);
        }

        let chat_response: ChatCompletionResponse = response.json().await.map_err(|e| {
            TextGenerationError::InvalidSchema(format!("Failed to parse response: {}", e))
        })?;

        if let Some(usage) = &chat_response.usage {
            info!(model = %self.model, tokens = usage.total_tokens, "OpenAI completion finished");
        }

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(TextGenerationError::EmptyCompletion);
        }
        Ok(text)
    }

    /// Handle HTTP error status codes
    async fn handle_error_status(
        &self,
        status: u16,
        response: reqwest::Response,
    ) -> TextGenerationError {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(60);
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            401 | 403 => {
                TextGenerationError::Authentication(format!("Invalid API key ({})", status))
            }
            429 => TextGenerationError::RateLimit(retry_after),
            _ => TextGenerationError::Api { status, message },
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.complete(prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_client(api_url: String) -> OpenAIClient {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .max_attempts(1)
            .build()
            .expect("http client");

        OpenAIClient::new("test-api-key".to_string(), http_client).with_api_url(api_url)
    }

    #[tokio::test]
    async fn generates_text() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "say hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "  hi there \n" } }],
                "usage": { "total_tokens": 12 }
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(format!("{}/v1/chat/completions", mock_server.uri()));

        let text = client.generate("say hi").await.expect("should generate");
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn handles_authentication_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let result = client.complete("x").await;

        assert!(matches!(result, Err(TextGenerationError::Authentication(_))));
    }

    #[tokio::test]
    async fn handles_rate_limit_with_retry_after() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let result = client.complete("x").await;

        assert!(matches!(result, Err(TextGenerationError::RateLimit(7))));
    }

    #[tokio::test]
    async fn empty_completion_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "   " } }]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(mock_server.uri());
        let err = client.generate("x").await.unwrap_err();

        assert!(matches!(err, CalFeedError::Upstream(_)));
    }
}
