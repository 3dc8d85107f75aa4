//! Steam wishlist discounts
//!
//! Resolves a vanity name to a SteamID64 through the community XML profile,
//! reads the public wishlist, then asks the store for price details of the
//! first games one at a time. Results are cached per half-hour slot.

mod types;

use std::time::Duration;

use async_trait::async_trait;
use calfeed_core::{
    day_bucket, fetch_json, fetch_text, half_hour_bucket, next_half_hour, CacheKey, CachePlan,
    CacheReadPolicy, CacheTtl, EventFeed, FeedContext, FeedDescriptor, HttpRequest, Phrase,
    RetrySettings, StatusOnly,
};
use calfeed_domain::constants::{discount_color, PLACEHOLDER_COLOR};
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use self::types::{AppData, AppDetailsResponse, PriceOverview, WishlistResponse};
use super::keep_valid;

pub const STEAM_COMMUNITY_URL: &str = "https://steamcommunity.com";
pub const STEAM_API_URL: &str = "https://api.steampowered.com";
pub const STEAM_STORE_URL: &str = "https://store.steampowered.com";

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "steam_wishlist_discount",
    summary: "Discounted games on a public Steam wishlist",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::fixed(3, Duration::from_secs(1)),
};

/// Games checked per invocation
const MAX_GAMES: usize = 50;
const DEFAULT_PACING: Duration = Duration::from_millis(100);
const NO_DISCOUNT_COLOR: &str = "#4A90E2";

static STEAM_ID64: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<steamID64>(\d+)</steamID64>").expect("steamID64 regex should compile")
});

const FAILED: Phrase = Phrase::new(&[
    (Language::Zh, "Steam 愿望单插件执行失败"),
    (Language::En, "Steam wishlist feed failed"),
]);
const PROFILE_NOT_FOUND: Phrase = Phrase::new(&[
    (Language::Zh, "无法找到对应的Steam ID，请确认用户名正确且资料为公开。"),
    (Language::En, "No Steam ID found; check the user name and that the profile is public."),
]);
const EMPTY_TITLE: Phrase =
    Phrase::new(&[(Language::Zh, "Steam 愿望单为空"), (Language::En, "Steam wishlist is empty")]);
const EMPTY_NOTES: Phrase = Phrase::new(&[
    (Language::Zh, "您的 Steam 愿望单中没有游戏，或者愿望单未设置为公开。"),
    (Language::En, "Your Steam wishlist has no games, or it is not public."),
]);
const NO_DISCOUNT_TITLE: Phrase = Phrase::new(&[
    (Language::Zh, "愿望单暂无打折游戏"),
    (Language::En, "No discounts on your wishlist"),
]);
const CHECKED: Phrase =
    Phrase::new(&[(Language::Zh, "已检查愿望单中的前"), (Language::En, "Checked the first")]);
const CHECKED_SUFFIX: Phrase = Phrase::new(&[
    (Language::Zh, "个游戏，暂时没有发现打折游戏。"),
    (Language::En, "games on the wishlist, none are discounted."),
]);
const ORIGINAL_PRICE: Phrase =
    Phrase::new(&[(Language::Zh, "原价"), (Language::En, "Original price")]);
const FINAL_PRICE: Phrase = Phrase::new(&[(Language::Zh, "现价"), (Language::En, "Price")]);
const DISCOUNT: Phrase = Phrase::new(&[(Language::Zh, "折扣"), (Language::En, "Discount")]);

/// A wishlist game currently on sale
struct Discounted {
    app_id: u64,
    name: String,
    header_image: Option<String>,
    price: PriceOverview,
}

pub struct SteamWishlistDiscount {
    community_base: String,
    api_base: String,
    store_base: String,
    retry: RetrySettings,
    pacing: Duration,
}

impl Default for SteamWishlistDiscount {
    fn default() -> Self {
        Self {
            community_base: STEAM_COMMUNITY_URL.to_string(),
            api_base: STEAM_API_URL.to_string(),
            store_base: STEAM_STORE_URL.to_string(),
            retry: DESCRIPTOR.retry,
            pacing: DEFAULT_PACING,
        }
    }
}

impl SteamWishlistDiscount {
    /// Point all three Steam hosts at one base URL
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.community_base = base.clone();
        self.api_base = base.clone();
        self.store_base = base;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Pause between consecutive store lookups
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    async fn resolve_steam_id(&self, ctx: &FeedContext, name: &str) -> Result<String> {
        if name.len() == 17 && name.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(name.to_string());
        }

        let request = HttpRequest::get(format!(
            "{}/id/{}?xml=1",
            self.community_base,
            urlencoding::encode(name)
        ));
        let profile = fetch_text(ctx.http(), &request, &ctx.fetch_policy(self.retry)).await?;

        STEAM_ID64
            .captures(&profile)
            .and_then(|caps| caps.get(1))
            .map(|id| id.as_str().to_string())
            .ok_or_else(|| CalFeedError::NotFound(ctx.text(&PROFILE_NOT_FOUND).to_string()))
    }

    async fn wishlist(&self, ctx: &FeedContext, steam_id: &str) -> Result<Vec<u64>> {
        let request = HttpRequest::get(format!(
            "{}/IWishlistService/GetWishlist/v1?steamid={steam_id}",
            self.api_base
        ));
        let wishlist: WishlistResponse =
            fetch_json(ctx.http(), &request, &ctx.fetch_policy(self.retry), &StatusOnly).await?;
        Ok(wishlist.response.items.into_iter().map(|item| item.appid).collect())
    }

    /// Store details for one game, or `None` when unavailable
    async fn app_details(&self, ctx: &FeedContext, app_id: u64) -> Option<AppData> {
        let request = HttpRequest::get(format!(
            "{}/api/appdetails?appids={app_id}&cc=cn&l=schinese&filters=price_overview,basic",
            self.store_base
        ));
        let policy = ctx.fetch_policy(RetrySettings::NONE);

        match fetch_json::<AppDetailsResponse>(ctx.http(), &request, &policy, &StatusOnly).await {
            Ok(mut details) => details
                .remove(&app_id.to_string())
                .filter(|entry| entry.success)
                .and_then(|entry| entry.data),
            Err(err) => {
                warn!(app_id, error = %err, "skipping game without store details");
                None
            }
        }
    }

    async fn discounted(&self, ctx: &FeedContext, app_ids: &[u64]) -> Vec<Discounted> {
        let mut discounted = Vec::new();
        for (index, &app_id) in app_ids.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }

            let Some(data) = self.app_details(ctx, app_id).await else {
                continue;
            };
            if let Some(price) = data.price_overview.filter(|price| price.discount_percent > 0) {
                debug!(app_id, discount = price.discount_percent, "discounted game");
                discounted.push(Discounted {
                    app_id,
                    name: data.name,
                    header_image: data.header_image,
                    price,
                });
            }
        }
        discounted
    }
}

#[async_trait]
impl EventFeed for SteamWishlistDiscount {
    type Settings = String;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<String> {
        config.require_str("steam_id")
    }

    fn cache_plan(&self, steam_id: &String, ctx: &FeedContext) -> Option<CachePlan> {
        let now = ctx.now_local();
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("user", steam_id)
            .part("day", day_bucket(now.date_naive()))
            .part("slot", half_hour_bucket(now.time()))
            .build();
        let expires = next_half_hour(&now).with_timezone(&Utc);
        Some(CachePlan::new(key, CacheTtl::Until(expires)))
    }

    async fn fetch(&self, steam_id: &String, ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        let resolved = self.resolve_steam_id(ctx, steam_id).await?;
        let mut app_ids = self.wishlist(ctx, &resolved).await?;
        info!(steam_id = %resolved, games = app_ids.len(), "steam wishlist fetched");

        let noon = ctx.format_date(ctx.today_at(12, 0));
        if app_ids.is_empty() {
            let event = CalendarEvent::builder(ctx.text(&EMPTY_TITLE))
                .start(noon.clone())
                .end(noon)
                .color(PLACEHOLDER_COLOR)
                .notes(ctx.text(&EMPTY_NOTES))
                .all_day(true)
                .point_in_time(true)
                .build()?;
            return Ok(vec![event]);
        }

        app_ids.truncate(MAX_GAMES);
        let discounted = self.discounted(ctx, &app_ids).await;

        if discounted.is_empty() {
            let notes =
                format!("{} {} {}", ctx.text(&CHECKED), app_ids.len(), ctx.text(&CHECKED_SUFFIX));
            let event = CalendarEvent::builder(ctx.text(&NO_DISCOUNT_TITLE))
                .start(noon.clone())
                .end(noon)
                .color(NO_DISCOUNT_COLOR)
                .notes(notes)
                .href(Some(format!("https://steamcommunity.com/id/{steam_id}/wishlist")))
                .all_day(true)
                .point_in_time(true)
                .build()?;
            return Ok(vec![event]);
        }

        let midnight = ctx.format_date(ctx.today_at(0, 0));
        let mapped = discounted.into_iter().map(|game| map_game(ctx, &midnight, game));
        Ok(keep_valid(DESCRIPTOR.id, mapped))
    }

    fn map_error(&self, err: CalFeedError, ctx: &FeedContext) -> CalFeedError {
        let prefix = ctx.text(&FAILED);
        err.map_message(|message| format!("{prefix}: {message}"))
    }
}

fn map_game(ctx: &FeedContext, date: &str, game: Discounted) -> Result<CalendarEvent> {
    let percent = game.price.discount_percent;
    let notes = format!(
        "{}: {}\n{}: {}\n{}: -{percent}%",
        ctx.text(&ORIGINAL_PRICE),
        game.price.original_price(),
        ctx.text(&FINAL_PRICE),
        game.price.final_price(),
        ctx.text(&DISCOUNT),
    );

    CalendarEvent::builder(format!("{} (-{percent}%)", game.name))
        .start(date)
        .end(date)
        .color(discount_color(percent))
        .notes(notes)
        .href(Some(format!("https://store.steampowered.com/app/{}", game.app_id)))
        .image_url(game.header_image)
        .all_day(true)
        .point_in_time(true)
        .build()
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::test_support;

    async fn mount_profile(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/id/gaben"))
            .and(query_param("xml", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<?xml version=\"1.0\"?><profile><steamID64>76561197960287930</steamID64></profile>",
            ))
            .mount(server)
            .await;
    }

    async fn mount_wishlist(server: &MockServer, items: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/IWishlistService/GetWishlist/v1"))
            .and(query_param("steamid", "76561197960287930"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": {"items": items}})),
            )
            .mount(server)
            .await;
    }

    async fn mount_details(server: &MockServer, app_id: u64, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/appdetails"))
            .and(query_param("appids", app_id.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn feed(server: &MockServer) -> SteamWishlistDiscount {
        SteamWishlistDiscount::default()
            .with_base_url(server.uri())
            .with_pacing(Duration::ZERO)
            .with_retry(RetrySettings::NONE)
    }

    #[tokio::test]
    async fn discounted_games_become_all_day_events() {
        let server = MockServer::start().await;
        mount_profile(&server).await;
        mount_wishlist(&server, json!([{"appid": 10}, {"appid": 20}, {"appid": 30}])).await;
        mount_details(
            &server,
            10,
            json!({"10": {"success": true, "data": {
                "name": "Counter-Strike",
                "header_image": "https://cdn.example/10.jpg",
                "price_overview": {
                    "discount_percent": 80, "initial": 3700, "final": 740,
                    "initial_formatted": "¥ 37.00", "final_formatted": "¥ 7.40"
                }
            }}}),
        )
        .await;
        mount_details(
            &server,
            20,
            json!({"20": {"success": true, "data": {
                "name": "Full Price",
                "price_overview": {"discount_percent": 0, "initial": 100, "final": 100}
            }}}),
        )
        .await;
        mount_details(&server, 30, json!({"30": {"success": false}})).await;

        let clock = test_support::clock();
        let ctx = test_support::context(&clock);
        let config = PluginConfig::new().with("steam_id", "gaben");

        let events = feed(&server).fetch_events(&ctx, &config).await.unwrap();

        assert_eq!(events.len(), 1);
        let game = &events[0];
        assert_eq!(game.title(), "Counter-Strike (-80%)");
        assert_eq!(game.start_date(), "2024-05-01 00:00");
        assert_eq!(game.color(), "#E74C3C");
        assert_eq!(game.notes(), "原价: ¥ 37.00\n现价: ¥ 7.40\n折扣: -80%");
        assert_eq!(game.href(), Some("https://store.steampowered.com/app/10"));
        assert_eq!(game.image_url(), Some("https://cdn.example/10.jpg"));
        assert!(game.is_all_day());

        // Same half-hour slot: served from cache, details not fetched again
        clock.advance_minutes(20);
        assert_eq!(feed(&server).fetch_events(&ctx, &config).await.unwrap(), events);
    }

    #[tokio::test]
    async fn empty_wishlist_yields_placeholder_at_noon() {
        let server = MockServer::start().await;
        mount_profile(&server).await;
        mount_wishlist(&server, json!([])).await;

        let ctx = test_support::context(&test_support::clock());
        let events = feed(&server)
            .fetch_events(&ctx, &PluginConfig::new().with("steam_id", "gaben"))
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title(), "Steam 愿望单为空");
        assert_eq!(events[0].start_date(), "2024-05-01 12:00");
        assert_eq!(events[0].color(), PLACEHOLDER_COLOR);
    }

    #[tokio::test]
    async fn no_discounts_reports_how_many_games_were_checked() {
        let server = MockServer::start().await;
        mount_profile(&server).await;
        mount_wishlist(&server, json!([{"appid": 20}])).await;
        mount_details(
            &server,
            20,
            json!({"20": {"success": true, "data": {"name": "Full Price"}}}),
        )
        .await;

        let ctx = test_support::context(&test_support::clock());
        let events = feed(&server)
            .fetch_events(&ctx, &PluginConfig::new().with("steam_id", "gaben"))
            .await
            .unwrap();

        assert_eq!(events[0].title(), "愿望单暂无打折游戏");
        assert_eq!(events[0].color(), "#4A90E2");
        assert!(events[0].notes().contains(" 1 "));
        assert_eq!(events[0].href(), Some("https://steamcommunity.com/id/gaben/wishlist"));
    }

    #[tokio::test]
    async fn unknown_profile_is_wrapped_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/id/nobody"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<response><error>not found</error></response>"),
            )
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let err = feed(&server)
            .fetch_events(&ctx, &PluginConfig::new().with("steam_id", "nobody"))
            .await
            .unwrap_err();

        assert!(matches!(&err, CalFeedError::NotFound(_)));
        assert!(err.message().starts_with("Steam 愿望单插件执行失败: "));
    }
}
