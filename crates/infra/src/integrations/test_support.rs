//! Shared fixtures for feed tests

use std::sync::Arc;

use async_trait::async_trait;
use calfeed_common::time::MockClock;
use calfeed_core::{FeedContext, FeedContextBuilder, PageReader, TextGenerator};
use calfeed_domain::{CalFeedError, Language, Result};
use parking_lot::Mutex;

use crate::cache::MemoryCache;
use crate::dates::LocalDateFormatter;
use crate::http::HttpClient;

/// 2024-05-01 09:00 UTC, a Wednesday
pub fn clock() -> MockClock {
    MockClock::at_ymd_hms(2024, 5, 1, 9, 0, 0)
}

/// Real HTTP client, fresh memory cache, UTC dates
pub fn builder(clock: &MockClock) -> FeedContextBuilder {
    FeedContext::builder(
        Arc::new(HttpClient::new().expect("http client")),
        Arc::new(MemoryCache::new()),
        Arc::new(LocalDateFormatter::utc()),
    )
    .clock(Arc::new(clock.clone()))
    .language(Language::Zh)
}

pub fn context(clock: &MockClock) -> FeedContext {
    builder(clock).build()
}

/// Text generator returning a canned answer and recording prompts
pub struct CannedText {
    answer: Result<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedText {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self { answer: Ok(answer.to_string()), prompts: Mutex::new(Vec::new()) })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err(CalFeedError::Network("model unavailable".into())),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl TextGenerator for CannedText {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.answer.clone()
    }
}

/// Page reader returning fixed content
pub struct CannedPage(pub String);

#[async_trait]
impl PageReader for CannedPage {
    async fn read(&self, _url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
