//! Top five films in cinemas, extracted from the Maoyan mobile site
//!
//! The page is fetched through the page reader and condensed by the text
//! generator; the result is cached until the end of the local day.

use async_trait::async_trait;
use calfeed_core::{
    day_bucket, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, EventFeed, FeedContext,
    FeedDescriptor, RetrySettings,
};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, PluginConfig, Result};
use tracing::{debug, info};

pub const MAOYAN_URL: &str = "https://m.maoyan.com/";

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "maoyan_hot_movies",
    summary: "Top five films now showing, per Maoyan",
    error_policy: ErrorPolicy::EmptyOnError,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::NONE,
};

const TITLE: &str = "影院热映电影 TOP5";
const COLOR: &str = "#FF6B35";
const ICON: &str = "https://www.maoyan.com/favicon.ico";
const MIN_CONTENT_CHARS: usize = 100;
const MAX_CONTENT_CHARS: usize = 8000;

fn prompt(content: &str) -> String {
    format!(
        "请分析以下猫眼电影页面内容，提取当前影院热映的电影名称。\n\n\
         要求：\n\
         1. 提取前 5 部热映电影\n\
         2. 按以下格式输出：\n\n\
         1. 电影名称1\n\
         2. 电影名称2\n\
         3. 电影名称3\n\
         ...\n\n\
         点击查看更多电影信息\n\n\
         注意：只输出电影名称，不要评分、主演等其他信息\n\n\
         页面内容：\n{content}"
    )
}

pub struct MaoyanHotMovies;

#[async_trait]
impl EventFeed for MaoyanHotMovies {
    type Settings = ();

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, _config: &PluginConfig, _ctx: &FeedContext) -> Result<()> {
        Ok(())
    }

    fn cache_plan(&self, _settings: &(), ctx: &FeedContext) -> Option<CachePlan> {
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("day", day_bucket(ctx.now_local().date_naive()))
            .build();
        Some(CachePlan::new(key, CacheTtl::UntilEndOfDay))
    }

    async fn fetch(&self, _settings: &(), ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        let page = ctx.page_reader()?.read(MAOYAN_URL).await?;
        let chars = page.chars().count();
        debug!(chars, "maoyan page read");
        if chars < MIN_CONTENT_CHARS {
            return Err(CalFeedError::Upstream(format!("page content too short ({chars} chars)")));
        }

        let content: String = page.chars().take(MAX_CONTENT_CHARS).collect();
        let answer = ctx.text_generator()?.generate(&prompt(&content)).await?;
        let notes = answer.trim();
        if notes.is_empty() {
            return Err(CalFeedError::Upstream("text generator returned no films".into()));
        }

        let now = ctx.format_date(ctx.clock().epoch_secs());
        let event = CalendarEvent::builder(TITLE)
            .start(now.clone())
            .end(now)
            .color(COLOR)
            .notes(notes)
            .icon(Some(ICON.to_string()))
            .href(Some(MAOYAN_URL.to_string()))
            .all_day(true)
            .build()?;

        info!("maoyan top films generated");
        Ok(vec![event])
    }
}
