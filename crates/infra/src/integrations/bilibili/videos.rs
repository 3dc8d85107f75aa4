use async_trait::async_trait;
use calfeed_core::{
    CacheKey, CachePlan, CacheReadPolicy, CacheTtl, CountStyle, EventFeed, FeedContext,
    FeedDescriptor, RetrySettings,
};
use calfeed_domain::{CalendarEvent, ErrorPolicy, PluginConfig, Result};

use super::{fetch_videos, page_size, BILIBILI_API_URL, BILIBILI_RETRY};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "bilibili_user_videos",
    summary: "Latest videos of one Bilibili uploader",
    error_policy: ErrorPolicy::EmptyOnError,
    read_policy: CacheReadPolicy::DeserializeOnRead,
    retry: BILIBILI_RETRY,
};

const CACHE_MINUTES: i64 = 30;

pub struct VideoSettings {
    mid: String,
    page_size: u32,
    icon: Option<String>,
}

/// One uploader's latest videos, cached for half an hour
pub struct BilibiliUserVideos {
    api_base: String,
    retry: RetrySettings,
}

impl Default for BilibiliUserVideos {
    fn default() -> Self {
        Self { api_base: BILIBILI_API_URL.to_string(), retry: DESCRIPTOR.retry }
    }
}

impl BilibiliUserVideos {
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
impl EventFeed for BilibiliUserVideos {
    type Settings = VideoSettings;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<VideoSettings> {
        Ok(VideoSettings {
            mid: config.require_str("mid")?,
            page_size: page_size(config)?,
            icon: config.get_str("icon"),
        })
    }

    fn cache_plan(&self, settings: &VideoSettings, _ctx: &FeedContext) -> Option<CachePlan> {
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("mid", &settings.mid)
            .part("ps", settings.page_size)
            .build();
        Some(CachePlan::new(key, CacheTtl::Minutes(CACHE_MINUTES)))
    }

    async fn fetch(&self, settings: &VideoSettings, ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        fetch_videos(
            ctx,
            &self.api_base,
            self.retry,
            &settings.mid,
            settings.page_size,
            settings.icon.as_deref(),
            CountStyle::CjkTruncated,
        )
        .await
    }
}
