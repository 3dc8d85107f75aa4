//! # calfeed core
//!
//! The feed pipeline, free of infrastructure.
//!
//! This crate contains:
//! - Port traits for the host runtime ([`ports`])
//! - Cache key derivation and the cache-backed fetch
//! - The retry-wrapped HTTP fetch
//! - Count formatting, localized text lookup
//! - The round-robin poll scheduler
//! - The [`EventFeed`] pipeline and feed registry
//!
//! ## Architecture Principles
//! - Depends only on `calfeed-common` and `calfeed-domain`
//! - No HTTP client, cache backend or file access
//! - All external services via traits

pub mod cache;
pub mod cache_key;
pub mod feed;
pub mod fetch;
pub mod format;
pub mod i18n;
pub mod ports;
pub mod registry;
pub mod scheduler;

pub use cache::{CacheBackedFetch, CacheReadPolicy, CacheTtl};
pub use cache_key::{day_bucket, half_hour_bucket, next_half_hour, CacheKey};
pub use feed::{
    run_feed, CachePlan, EventFeed, EventSource, FeedContext, FeedContextBuilder, FeedDescriptor,
    RetrySettings,
};
pub use fetch::{
    fetch_json, fetch_text, fetch_with_retry, AttemptFailure, Classification, FetchError,
    FetchPolicy, ResponseClassifier, StatusOnly,
};
pub use format::CountStyle;
pub use i18n::{Localizer, Phrase};
pub use ports::{
    CacheEntry, CachedValue, DateFormatter, GatewayError, HttpGateway, HttpRequest,
    KeyValueCache, PageReader, TextGenerator,
};
pub use registry::FeedRegistry;
pub use scheduler::{PollPhase, PollingState, RoundRobinScheduler};
