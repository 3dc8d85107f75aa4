use async_trait::async_trait;
use calfeed_core::{
    day_bucket, CacheKey, CachePlan, CacheReadPolicy, CountStyle, EventFeed, FeedContext,
    FeedDescriptor, RetrySettings, RoundRobinScheduler,
};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, PluginConfig, Result};

use super::{fetch_videos, page_size, BILIBILI_API_URL, BILIBILI_RETRY};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "bilibili_rotation",
    summary: "Latest videos of several Bilibili uploaders, one polled per interval",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: BILIBILI_RETRY,
};

const DEFAULT_INTERVAL_MINUTES: u32 = 10;

pub struct RotationSettings {
    mids: Vec<String>,
    interval_minutes: u32,
    page_size: u32,
    icon: Option<String>,
}

/// Rotates through `mids`, polling at most one uploader per interval.
///
/// The feed manages its own cache: the polling state lives under a key that
/// embeds the local date, and every invocation returns all stored videos.
pub struct BilibiliRotation {
    api_base: String,
    retry: RetrySettings,
}

impl Default for BilibiliRotation {
    fn default() -> Self {
        Self { api_base: BILIBILI_API_URL.to_string(), retry: DESCRIPTOR.retry }
    }
}

impl BilibiliRotation {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl EventFeed for BilibiliRotation {
    type Settings = RotationSettings;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<RotationSettings> {
        let mids = config.get_list("mids");
        if mids.is_empty() {
            return Err(CalFeedError::Config("missing required setting `mids`".into()));
        }

        Ok(RotationSettings {
            mids,
            interval_minutes: config.get_u32_or("interval_minutes", DEFAULT_INTERVAL_MINUTES)?,
            page_size: page_size(config)?,
            icon: config.get_str("icon"),
        })
    }

    fn cache_plan(&self, _settings: &RotationSettings, _ctx: &FeedContext) -> Option<CachePlan> {
        None
    }

    async fn fetch(
        &self,
        settings: &RotationSettings,
        ctx: &FeedContext,
    ) -> Result<Vec<CalendarEvent>> {
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("day", day_bucket(ctx.now_local().date_naive()))
            .build();
        let scheduler = RoundRobinScheduler::from_minutes(settings.interval_minutes);

        let state = scheduler
            .run(&ctx.cache(), &key, &settings.mids, ctx.clock().epoch_secs(), |mid| async move {
                fetch_videos(
                    ctx,
                    &self.api_base,
                    self.retry,
                    &mid,
                    settings.page_size,
                    settings.icon.as_deref(),
                    CountStyle::CjkRounded,
                )
                .await
            })
            .await;

        Ok(state.events())
    }
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::test_support;

    fn body(title: &str, play: u64) -> serde_json::Value {
        json!({
            "code": 0,
            "message": "0",
            "data": { "list": { "vlist": [{
                "title": title,
                "created": 1_714_550_400,
                "author": "up",
                "play": play,
                "video_review": 0,
                "length": "01:00",
                "bvid": format!("BV{title}")
            }]}}
        })
    }

    async fn mount(server: &MockServer, mid: &str, title: &str, play: u64) {
        Mock::given(method("GET"))
            .and(query_param("mid", mid))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(title, play)))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn polls_one_uploader_per_interval_and_returns_everything_stored() {
        let server = MockServer::start().await;
        mount(&server, "1", "first", 15_550).await;
        mount(&server, "2", "second", 5).await;

        let clock = test_support::clock();
        let ctx = test_support::context(&clock);
        let feed = BilibiliRotation::default().with_api_base(server.uri());
        let config = PluginConfig::new().with("mids", "1, 2").with("interval_minutes", 10);

        let events = feed.fetch_events(&ctx, &config).await.unwrap();
        let titles: Vec<_> = events.iter().map(CalendarEvent::title).collect();
        assert_eq!(titles, vec!["first"]);
        assert!(events[0].notes().contains("播放: 1.6万"));

        clock.advance_minutes(5);
        let events = feed.fetch_events(&ctx, &config).await.unwrap();
        assert_eq!(events.len(), 1);

        clock.advance_minutes(5);
        let events = feed.fetch_events(&ctx, &config).await.unwrap();
        let titles: Vec<_> = events.iter().map(CalendarEvent::title).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn empty_mid_list_is_a_config_error() {
        let ctx = test_support::context(&test_support::clock());
        let err = BilibiliRotation::default()
            .fetch_events(&ctx, &PluginConfig::new().with("mids", " , "))
            .await
            .unwrap_err();
        assert!(matches!(err, CalFeedError::Config(_)));
    }
}
