//! Shared helpers for infra integration tests

use std::sync::Arc;

use calfeed_common::time::MockClock;
use calfeed_core::{FeedContext, KeyValueCache};
use calfeed_infra::{HttpClient, LocalDateFormatter};

/// 2024-05-01 09:00 UTC
pub fn clock() -> MockClock {
    MockClock::at_ymd_hms(2024, 5, 1, 9, 0, 0)
}

/// Context over a real HTTP client and the given cache, dates in UTC
pub fn context(cache: Arc<dyn KeyValueCache>, clock: &MockClock) -> FeedContext {
    FeedContext::builder(
        Arc::new(HttpClient::new().expect("http client should build")),
        cache,
        Arc::new(LocalDateFormatter::utc()),
    )
    .clock(Arc::new(clock.clone()))
    .build()
}
