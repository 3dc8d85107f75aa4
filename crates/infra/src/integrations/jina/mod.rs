//! Jina Reader page reader
//!
//! `https://r.jina.ai/<url>` returns a page rendered as readable text, which
//! is what the movie feed hands to the text generator.

use std::sync::Arc;

use async_trait::async_trait;
use calfeed_core::{GatewayError, HttpGateway, HttpRequest, PageReader};
use calfeed_domain::{CalFeedError, Result};
use tracing::debug;

pub const JINA_READER_URL: &str = "https://r.jina.ai";

pub struct JinaReader {
    http: Arc<dyn HttpGateway>,
    base_url: String,
    api_key: Option<String>,
}

impl JinaReader {
    pub fn new(http: Arc<dyn HttpGateway>) -> Self {
        Self { http, base_url: JINA_READER_URL.to_string(), api_key: None }
    }

    /// Authenticated requests get a higher rate limit
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl PageReader for JinaReader {
    async fn read(&self, url: &str) -> Result<String> {
        let mut request =
            HttpRequest::get(format!("{}/{}", self.base_url, url)).header("Accept", "text/plain");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let content = self.http.get_text(&request).await.map_err(|err| match err {
            GatewayError::Timeout => CalFeedError::Timeout(format!("reading {url} timed out")),
            GatewayError::Transport(msg) => CalFeedError::Network(msg),
            GatewayError::Status { status: 429, body } => CalFeedError::RateLimited(body),
            GatewayError::Status { status, .. } => {
                CalFeedError::Upstream(format!("reader returned HTTP {status} for {url}"))
            }
        })?;

        debug!(url, chars = content.chars().count(), "page read");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::HttpClient;

    #[tokio::test]
    async fn prefixes_target_url_and_sends_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/https://m.maoyan.com/"))
            .and(header("Authorization", "Bearer jina-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Title: 猫眼"))
            .expect(1)
            .mount(&server)
            .await;

        let reader = JinaReader::new(Arc::new(HttpClient::new().unwrap()))
            .with_base_url(server.uri())
            .with_api_key(Some("jina-key".into()));

        assert_eq!(reader.read("https://m.maoyan.com/").await.unwrap(), "Title: 猫眼");
    }

    #[tokio::test]
    async fn error_status_maps_to_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let reader = JinaReader::new(Arc::new(HttpClient::new().unwrap())).with_base_url(server.uri());

        let err = reader.read("https://example.com/").await.unwrap_err();
        assert!(matches!(err, CalFeedError::Upstream(_)));
    }
}
