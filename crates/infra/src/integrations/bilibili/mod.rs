//! Bilibili uploader videos
//!
//! Two feeds share the space-search endpoint: [`BilibiliUserVideos`] lists
//! one uploader's latest videos, [`BilibiliRotation`] spreads polling of
//! several uploaders over successive invocations.
//!
//! The endpoint signals rate limiting with payload code `-799` on an HTTP 200,
//! so the classifier, not the status, decides whether to retry.

mod rotation;
mod types;
mod videos;

use std::time::Duration;

use calfeed_core::{
    fetch_json, Classification, CountStyle, FeedContext, HttpRequest, Phrase, RetrySettings,
};
use calfeed_domain::{CalFeedError, CalendarEvent, Language, Result};
use serde_json::Value;
use tracing::debug;

pub use rotation::BilibiliRotation;
pub use videos::BilibiliUserVideos;

use self::types::{SpaceSearchResponse, Video};
use super::keep_valid;

pub const BILIBILI_API_URL: &str = "https://api.bilibili.com";

const VIDEO_COLOR: &str = "#FB7299";
const RATE_LIMITED_CODE: i64 = -799;
const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 50;

/// Eight attempts one second apart
pub const BILIBILI_RETRY: RetrySettings = RetrySettings::fixed(8, Duration::from_secs(1));

const UPLOADER: Phrase = Phrase::new(&[(Language::Zh, "UP主"), (Language::En, "Uploader")]);
const PLAYS: Phrase = Phrase::new(&[(Language::Zh, "播放"), (Language::En, "Plays")]);
const DANMAKU: Phrase = Phrase::new(&[(Language::Zh, "弹幕"), (Language::En, "Danmaku")]);
const DURATION: Phrase = Phrase::new(&[(Language::Zh, "时长"), (Language::En, "Duration")]);
const UNKNOWN: Phrase = Phrase::new(&[(Language::Zh, "未知"), (Language::En, "unknown")]);

fn classify(body: &Value) -> Classification {
    let message = body["message"].as_str().unwrap_or("unknown").to_string();
    match body["code"].as_i64() {
        Some(0) => Classification::Success,
        Some(RATE_LIMITED_CODE) => Classification::RateLimited(message),
        Some(code) => Classification::Failed(format!("code={code}, message={message}")),
        None => Classification::Failed("response has no code".into()),
    }
}

/// Latest videos of uploader `mid` as events
pub(crate) async fn fetch_videos(
    ctx: &FeedContext,
    api_base: &str,
    retry: RetrySettings,
    mid: &str,
    page_size: u32,
    icon: Option<&str>,
    counts: CountStyle,
) -> Result<Vec<CalendarEvent>> {
    let request = HttpRequest::get(format!(
        "{api_base}/x/space/arc/search?mid={}&pn=1&ps={page_size}&order=pubdate",
        urlencoding::encode(mid)
    ))
    .header("Accept", "application/json")
    .header("Referer", "https://www.bilibili.com/");

    let response: SpaceSearchResponse =
        fetch_json(ctx.http(), &request, &ctx.fetch_policy(retry), &classify).await?;

    let videos = response.data.and_then(|data| data.list).and_then(|list| list.vlist).ok_or_else(
        || {
            CalFeedError::Parse(format!(
                "video list missing: code={}, message={}",
                response.code,
                response.message.as_deref().unwrap_or("unknown")
            ))
        },
    )?;

    debug!(mid, videos = videos.len(), "bilibili videos fetched");
    Ok(keep_valid("bilibili", videos.into_iter().map(|video| map_video(ctx, video, icon, counts))))
}

fn map_video(
    ctx: &FeedContext,
    video: Video,
    icon: Option<&str>,
    counts: CountStyle,
) -> Result<CalendarEvent> {
    let published = ctx.format_date(video.created);
    let length = video.length.filter(|l| !l.trim().is_empty());
    let notes = format!(
        "{}: {}\n{}: {}\n{}: {}\n{}: {}",
        ctx.text(&UPLOADER),
        video.author,
        ctx.text(&PLAYS),
        counts.format(video.play),
        ctx.text(&DANMAKU),
        counts.format(video.video_review),
        ctx.text(&DURATION),
        length.as_deref().unwrap_or(ctx.text(&UNKNOWN)),
    );

    CalendarEvent::builder(video.title)
        .start(published.clone())
        .end(published)
        .color(VIDEO_COLOR)
        .notes(notes)
        .icon(icon.map(str::to_string))
        .href(Some(format!("https://www.bilibili.com/video/{}", video.bvid)))
        .point_in_time(true)
        .build()
}

/// `page_size` setting, clamped to what the endpoint accepts
fn page_size(config: &calfeed_domain::PluginConfig) -> Result<u32> {
    Ok(config.get_u32_or("page_size", DEFAULT_PAGE_SIZE)?.clamp(1, MAX_PAGE_SIZE))
}
