//! The feed pipeline
//!
//! Every feed follows the same shape: validate settings, derive a cache key,
//! look the key up, and on a miss fetch, map and store. [`EventFeed`] captures
//! the per-feed parts; [`run_feed`] is the one pipeline that drives them, and
//! [`EventSource`] is the object-safe surface the host calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use calfeed_common::time::{Clock, SystemClock};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::{debug, info, warn};

use crate::cache::{CacheBackedFetch, CacheReadPolicy, CacheTtl};
use crate::cache_key::CacheKey;
use crate::fetch::FetchPolicy;
use crate::i18n::{Localizer, Phrase};
use crate::ports::{DateFormatter, HttpGateway, KeyValueCache, PageReader, TextGenerator};

/// Retry budget declared by a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetrySettings {
    pub const NONE: Self = Self { max_attempts: 1, delay: Duration::ZERO };

    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

/// Static description of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedDescriptor {
    /// Stable identifier, also the first cache key segment
    pub id: &'static str,
    pub summary: &'static str,
    pub error_policy: ErrorPolicy,
    pub read_policy: CacheReadPolicy,
    pub retry: RetrySettings,
}

/// Where and for how long a feed's result is cached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePlan {
    pub key: CacheKey,
    pub ttl: CacheTtl,
}

impl CachePlan {
    pub fn new(key: CacheKey, ttl: CacheTtl) -> Self {
        Self { key, ttl }
    }
}

/// Host services available to a feed invocation
#[derive(Clone)]
pub struct FeedContext {
    http: Arc<dyn HttpGateway>,
    cache: Arc<dyn KeyValueCache>,
    dates: Arc<dyn DateFormatter>,
    text: Option<Arc<dyn TextGenerator>>,
    reader: Option<Arc<dyn PageReader>>,
    clock: Arc<dyn Clock>,
    tz: FixedOffset,
    localizer: Localizer,
    http_timeout: Duration,
}

impl FeedContext {
    pub fn builder(
        http: Arc<dyn HttpGateway>,
        cache: Arc<dyn KeyValueCache>,
        dates: Arc<dyn DateFormatter>,
    ) -> FeedContextBuilder {
        FeedContextBuilder {
            context: FeedContext {
                http,
                cache,
                dates,
                text: None,
                reader: None,
                clock: Arc::new(SystemClock),
                tz: Utc.fix(),
                localizer: Localizer::default(),
                http_timeout: Duration::from_secs(
                    calfeed_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS,
                ),
            },
        }
    }

    pub fn http(&self) -> &dyn HttpGateway {
        self.http.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn localizer(&self) -> Localizer {
        self.localizer
    }

    pub fn text(&self, phrase: &Phrase) -> &'static str {
        self.localizer.text(phrase)
    }

    pub fn timezone(&self) -> FixedOffset {
        self.tz
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    /// Cache helper bound to this context's clock and timezone
    pub fn cache(&self) -> CacheBackedFetch {
        CacheBackedFetch::new(self.cache.clone(), self.clock.clone(), self.tz)
    }

    pub fn now_utc(&self) -> DateTime<Utc> {
        self.clock.utc_now()
    }

    pub fn now_local(&self) -> DateTime<FixedOffset> {
        self.clock.utc_now().with_timezone(&self.tz)
    }

    /// Epoch seconds of `hour:minute` today, local time
    pub fn today_at(&self, hour: u32, minute: u32) -> i64 {
        let now = self.now_local();
        now.date_naive()
            .and_hms_opt(hour, minute, 0)
            .and_then(|naive| naive.and_local_timezone(self.tz).single())
            .map_or_else(|| now.timestamp(), |local| local.timestamp())
    }

    /// Display string for epoch seconds
    pub fn format_date(&self, epoch_secs: i64) -> String {
        self.dates.format(epoch_secs)
    }

    /// Fetch policy combining a feed's retry budget with the HTTP timeout
    pub fn fetch_policy(&self, retry: RetrySettings) -> FetchPolicy {
        FetchPolicy::new(retry.max_attempts, retry.delay, self.http_timeout)
    }

    pub fn text_generator(&self) -> Result<&dyn TextGenerator> {
        self.text
            .as_deref()
            .ok_or_else(|| CalFeedError::Config("no text generator configured".into()))
    }

    pub fn page_reader(&self) -> Result<&dyn PageReader> {
        self.reader
            .as_deref()
            .ok_or_else(|| CalFeedError::Config("no page reader configured".into()))
    }
}

/// Builder for [`FeedContext`]
pub struct FeedContextBuilder {
    context: FeedContext,
}

impl FeedContextBuilder {
    pub fn text_generator(mut self, text: Arc<dyn TextGenerator>) -> Self {
        self.context.text = Some(text);
        self
    }

    pub fn page_reader(mut self, reader: Arc<dyn PageReader>) -> Self {
        self.context.reader = Some(reader);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.context.clock = clock;
        self
    }

    pub fn timezone(mut self, tz: FixedOffset) -> Self {
        self.context.tz = tz;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.context.localizer = Localizer::new(language);
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.context.http_timeout = timeout;
        self
    }

    pub fn build(self) -> FeedContext {
        self.context
    }
}

/// Per-feed parts of the pipeline
#[async_trait]
pub trait EventFeed: Send + Sync {
    /// Validated settings for one invocation
    type Settings: Send + Sync;

    fn descriptor(&self) -> &FeedDescriptor;

    /// Validate configuration; runs before any network call
    fn settings(&self, config: &PluginConfig, ctx: &FeedContext) -> Result<Self::Settings>;

    /// Cache key and lifetime, or `None` for uncached feeds
    fn cache_plan(&self, settings: &Self::Settings, ctx: &FeedContext) -> Option<CachePlan>;

    /// Fetch and map on a cache miss
    async fn fetch(&self, settings: &Self::Settings, ctx: &FeedContext)
        -> Result<Vec<CalendarEvent>>;

    /// Final shaping of errors, e.g. localized wrapping
    fn map_error(&self, err: CalFeedError, _ctx: &FeedContext) -> CalFeedError {
        err
    }
}

/// Object-safe feed surface used by the host
#[async_trait]
pub trait EventSource: Send + Sync {
    fn feed_descriptor(&self) -> &FeedDescriptor;

    async fn fetch_events(
        &self,
        ctx: &FeedContext,
        config: &PluginConfig,
    ) -> Result<Vec<CalendarEvent>>;
}

#[async_trait]
impl<F> EventSource for F
where
    F: EventFeed,
{
    fn feed_descriptor(&self) -> &FeedDescriptor {
        EventFeed::descriptor(self)
    }

    async fn fetch_events(
        &self,
        ctx: &FeedContext,
        config: &PluginConfig,
    ) -> Result<Vec<CalendarEvent>> {
        run_feed(self, ctx, config).await
    }
}

/// Drive one invocation of `feed`
///
/// Configuration errors always propagate. Any later failure is subject to
/// the feed's [`ErrorPolicy`], which the `on_error` setting may override.
pub async fn run_feed<F: EventFeed + ?Sized>(
    feed: &F,
    ctx: &FeedContext,
    config: &PluginConfig,
) -> Result<Vec<CalendarEvent>> {
    let descriptor = EventFeed::descriptor(feed);
    let policy = config.error_policy()?.unwrap_or(descriptor.error_policy);
    let settings = feed.settings(config, ctx)?;

    let result = match feed.cache_plan(&settings, ctx) {
        Some(plan) => {
            debug!(feed = descriptor.id, key = %plan.key, "resolving through cache");
            ctx.cache()
                .get_or_fetch(&plan.key, plan.ttl, descriptor.read_policy, || {
                    feed.fetch(&settings, ctx)
                })
                .await
        }
        None => feed.fetch(&settings, ctx).await,
    };

    match result.map_err(|err| feed.map_error(err, ctx)) {
        Ok(events) => {
            info!(feed = descriptor.id, events = events.len(), "feed produced events");
            Ok(events)
        }
        Err(err) => match policy {
            ErrorPolicy::EmptyOnError => {
                warn!(feed = descriptor.id, error = %err, "feed failed, returning no events");
                Ok(Vec::new())
            }
            ErrorPolicy::Propagate => {
                warn!(feed = descriptor.id, kind = err.kind(), error = %err, "feed failed");
                Err(err)
            }
        },
    }
}
