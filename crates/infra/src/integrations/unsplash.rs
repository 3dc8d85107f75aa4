//! Three Unsplash photos a day, each on a theme picked by the day of month

use std::time::Duration;

use async_trait::async_trait;
use calfeed_core::{
    day_bucket, fetch_json, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, Classification,
    EventFeed, FeedContext, FeedDescriptor, HttpRequest, Phrase, RetrySettings,
};
use calfeed_domain::constants::PLACEHOLDER_COLOR;
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{keep_valid, token_fingerprint};

pub const UNSPLASH_API_URL: &str = "https://api.unsplash.com";

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "unsplash_daily_theme",
    summary: "Three themed Unsplash photos per day",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::fixed(3, Duration::from_secs(1)),
};

const CACHE_MINUTES: i64 = 24 * 60;
const DEFAULT_TITLE: &str = "Unsplash Photo";

const THEMES: [&str; 31] = [
    "Nature",
    "Wallpapers",
    "Travel",
    "Architecture",
    "Animals",
    "Street Photography",
    "Textures & Patterns",
    "Film",
    "Food & Drink",
    "People",
    "Business & Work",
    "Technology",
    "Art & Culture",
    "History",
    "Fashion",
    "Interiors",
    "Health & Wellness",
    "Spirituality",
    "Experimental",
    "Sports",
    "Cars",
    "Water",
    "Sky",
    "Forest",
    "City",
    "Minimalism",
    "Abstract",
    "Space",
    "Mountains",
    "Beach",
    "Music",
];

/// Theme offsets paired with the local hour each photo is shown at
const SLOTS: [(usize, u32); 3] = [(0, 10), (5, 13), (10, 18)];

const FAILED: Phrase = Phrase::new(&[
    (Language::Zh, "Unsplash 插件执行失败"),
    (Language::En, "Unsplash feed failed"),
]);
const PHOTOGRAPHER: Phrase =
    Phrase::new(&[(Language::Zh, "摄影师"), (Language::En, "Photographer")]);
const THEME: Phrase = Phrase::new(&[(Language::Zh, "主题"), (Language::En, "Theme")]);
const DESCRIPTION: Phrase =
    Phrase::new(&[(Language::Zh, "描述"), (Language::En, "Description")]);

#[derive(Debug, Deserialize)]
struct Photo {
    alt_description: Option<String>,
    description: Option<String>,
    color: Option<String>,
    user: User,
    links: Links,
    urls: Urls,
}

#[derive(Debug, Deserialize)]
struct User {
    name: String,
    profile_image: Option<ProfileImage>,
}

#[derive(Debug, Deserialize)]
struct ProfileImage {
    small: String,
}

#[derive(Debug, Deserialize)]
struct Links {
    html: String,
}

#[derive(Debug, Deserialize)]
struct Urls {
    small: String,
}

/// Themes for a day of month (1-31), in display order
fn themes_for_day(day: u32) -> [&'static str; 3] {
    SLOTS.map(|(offset, _)| THEMES[(day as usize + offset) % THEMES.len()])
}

fn classify(body: &Value) -> Classification {
    match body.get("errors") {
        Some(Value::Array(errors)) => {
            let messages: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
            Classification::Failed(format!("Unsplash API error: {}", messages.join(", ")))
        }
        Some(other) => Classification::Failed(format!("Unsplash API error: {other}")),
        None => Classification::Success,
    }
}

pub struct UnsplashDailyTheme {
    api_base: String,
    retry: RetrySettings,
}

impl Default for UnsplashDailyTheme {
    fn default() -> Self {
        Self { api_base: UNSPLASH_API_URL.to_string(), retry: DESCRIPTOR.retry }
    }
}

impl UnsplashDailyTheme {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    async fn random_photo(
        &self,
        ctx: &FeedContext,
        access_key: &str,
        theme: &str,
    ) -> Result<Photo> {
        let request = HttpRequest::get(format!(
            "{}/photos/random?query={}&orientation=landscape",
            self.api_base,
            urlencoding::encode(theme)
        ))
        .header("Authorization", format!("Client-ID {access_key}"))
        .header("Accept-Version", "v1");

        Ok(fetch_json(ctx.http(), &request, &ctx.fetch_policy(self.retry), &classify).await?)
    }
}

#[async_trait]
impl EventFeed for UnsplashDailyTheme {
    type Settings = String;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<String> {
        config.require_str("access_key")
    }

    fn cache_plan(&self, access_key: &String, ctx: &FeedContext) -> Option<CachePlan> {
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("day", day_bucket(ctx.now_local().date_naive()))
            .part("key", token_fingerprint(access_key))
            .build();
        Some(CachePlan::new(key, CacheTtl::Minutes(CACHE_MINUTES)))
    }

    async fn fetch(&self, access_key: &String, ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        let themes = themes_for_day(ctx.now_local().day());
        let mut mapped = Vec::with_capacity(themes.len());

        for (theme, (_, hour)) in themes.into_iter().zip(SLOTS) {
            let photo = self.random_photo(ctx, access_key, theme).await?;
            debug!(theme, "unsplash photo fetched");
            mapped.push(map_photo(ctx, photo, theme, hour));
        }

        Ok(keep_valid(DESCRIPTOR.id, mapped))
    }

    fn map_error(&self, err: CalFeedError, ctx: &FeedContext) -> CalFeedError {
        let prefix = ctx.text(&FAILED);
        err.map_message(|message| format!("{prefix}: {message}"))
    }
}

fn map_photo(ctx: &FeedContext, photo: Photo, theme: &str, hour: u32) -> Result<CalendarEvent> {
    let mut notes = format!(
        "{}: {}\n{}: {theme}",
        ctx.text(&PHOTOGRAPHER),
        photo.user.name,
        ctx.text(&THEME)
    );
    if let Some(description) = photo.description.filter(|d| !d.is_empty()) {
        notes.push_str(&format!("\n{}: {description}", ctx.text(&DESCRIPTION)));
    }

    let at = ctx.format_date(ctx.today_at(hour, 0));
    let title = photo
        .alt_description
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    CalendarEvent::builder(title)
        .start(at.clone())
        .end(at)
        .color(photo.color.unwrap_or_else(|| PLACEHOLDER_COLOR.to_string()))
        .notes(notes)
        .href(Some(photo.links.html))
        .icon(photo.user.profile_image.map(|image| image.small))
        .image_url(Some(photo.urls.small))
        .point_in_time(true)
        .build()
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::test_support;

    fn photo(alt: Option<&str>) -> serde_json::Value {
        json!({
            "alt_description": alt,
            "description": "morning light",
            "color": "#0C2626",
            "user": {"name": "Ansel", "profile_image": {"small": "https://img.example/a.jpg"}},
            "links": {"html": "https://unsplash.com/photos/abc"},
            "urls": {"small": "https://images.example/abc-small.jpg"}
        })
    }

    #[test]
    fn themes_rotate_with_the_day_of_month() {
        assert_eq!(themes_for_day(1), ["Wallpapers", "Textures & Patterns", "Technology"]);
        assert_eq!(themes_for_day(30), ["Music", "Animals", "People"]);
    }

    #[tokio::test]
    async fn three_photos_at_fixed_hours() {
        let server = MockServer::start().await;
        // 2024-05-01: themes for day 1
        for (theme, alt) in [
            ("Wallpapers", Some("blue wall")),
            ("Textures & Patterns", None),
            ("Technology", Some("desk")),
        ] {
            Mock::given(method("GET"))
                .and(path("/photos/random"))
                .and(query_param("query", theme))
                .and(query_param("orientation", "landscape"))
                .and(header("Authorization", "Client-ID key123"))
                .and(header("Accept-Version", "v1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(photo(alt)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let clock = test_support::clock();
        let ctx = test_support::context(&clock);
        let feed = UnsplashDailyTheme::default().with_api_base(server.uri());
        let config = PluginConfig::new().with("access_key", "key123");

        let events = feed.fetch_events(&ctx, &config).await.unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].title(), "blue wall");
        assert_eq!(events[0].start_date(), "2024-05-01 10:00");
        assert_eq!(events[1].title(), "Unsplash Photo");
        assert_eq!(events[1].start_date(), "2024-05-01 13:00");
        assert_eq!(events[2].start_date(), "2024-05-01 18:00");
        assert_eq!(events[0].notes(), "摄影师: Ansel\n主题: Wallpapers\n描述: morning light");
        assert_eq!(events[0].color(), "#0C2626");
        assert_eq!(events[0].icon(), Some("https://img.example/a.jpg"));
        assert_eq!(events[0].image_url(), Some("https://images.example/abc-small.jpg"));

        clock.advance_minutes(60);
        assert_eq!(feed.fetch_events(&ctx, &config).await.unwrap(), events);
    }

    #[tokio::test]
    async fn each_access_key_gets_its_own_cached_day() {
        let server = MockServer::start().await;
        for key in ["first-key", "second-key"] {
            Mock::given(method("GET"))
                .and(path("/photos/random"))
                .and(header("Authorization", format!("Client-ID {key}").as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_json(photo(Some(key))))
                .expect(3)
                .mount(&server)
                .await;
        }

        let ctx = test_support::context(&test_support::clock());
        let feed = UnsplashDailyTheme::default().with_api_base(server.uri());
        let first = PluginConfig::new().with("access_key", "first-key");
        let second = PluginConfig::new().with("access_key", "second-key");

        let from_first = feed.fetch_events(&ctx, &first).await.unwrap();
        let from_second = feed.fetch_events(&ctx, &second).await.unwrap();

        assert_eq!(from_first[0].title(), "first-key");
        assert_eq!(from_second[0].title(), "second-key");
        assert_eq!(feed.fetch_events(&ctx, &first).await.unwrap(), from_first);
    }

    #[tokio::test]
    async fn api_errors_fail_the_whole_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"errors": ["Rate Limit Exceeded"]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let err = UnsplashDailyTheme::default()
            .with_api_base(server.uri())
            .fetch_events(&ctx, &PluginConfig::new().with("access_key", "k"))
            .await
            .unwrap_err();

        assert!(err.message().starts_with("Unsplash 插件执行失败: "));
        assert!(err.message().contains("Rate Limit Exceeded"));
    }
}
