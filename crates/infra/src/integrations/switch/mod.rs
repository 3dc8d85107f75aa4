//! Nintendo Switch wishlist discounts, Japanese eShop
//!
//! Prices come from the eShop price API in one request; names, cover art and
//! hardware compatibility are scraped from the store page of each game that
//! is on sale.

mod types;

use std::time::Duration;

use async_trait::async_trait;
use calfeed_core::{
    fetch_json, fetch_text, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, Classification,
    EventFeed, FeedContext, FeedDescriptor, HttpRequest, Phrase, RetrySettings,
};
use calfeed_domain::constants::discount_color;
use calfeed_domain::{CalFeedError, CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use self::types::{Amount, Price, PriceResponse};
use super::keep_valid;

pub const NINTENDO_PRICE_URL: &str = "https://api.ec.nintendo.com";
pub const NINTENDO_STORE_URL: &str = "https://store-jp.nintendo.com";

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "switch_wishlist_discount",
    summary: "Discounted Switch games from a list of eShop ids (Japan)",
    error_policy: ErrorPolicy::Propagate,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::fixed(3, Duration::from_secs(1)),
};

const MAX_GAMES: usize = 10;
const CACHE_MINUTES: i64 = 120;

static OG_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"property="og:title"\s+content="([^"]*)""#).expect("og:title regex should compile")
});
static OG_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"property="og:image"\s+content="([^"]*)""#).expect("og:image regex should compile")
});
static PLAYS_ON_SWITCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""productDetail\.playableHardNotice\.label":\[\{"type":\d+,"value":"Nintendo Switch"\}\]"#,
    )
    .expect("switch hardware regex should compile")
});
static PLAYS_ON_SWITCH_2: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#""productDetail\.playableHardNotice\.label\.onlySuper":\[\{"type":\d+,"value":"Nintendo Switch 2"\}\]"#,
    )
    .expect("switch 2 hardware regex should compile")
});

const FAILED: Phrase = Phrase::new(&[
    (Language::Zh, "Switch 愿望单插件执行失败"),
    (Language::En, "Switch wishlist feed failed"),
]);
const IDS_REQUIRED: Phrase = Phrase::new(&[
    (Language::Zh, "游戏 ID 列表不能为空，请在插件配置中填入要监控的游戏 ID。"),
    (Language::En, "The game id list is empty; add the eShop ids to watch."),
]);
const NO_PRICES: Phrase = Phrase::new(&[
    (Language::Zh, "未找到游戏价格信息，请检查游戏 ID 是否正确。"),
    (Language::En, "No price information found; check the game ids."),
]);
const GAME_ID: Phrase = Phrase::new(&[(Language::Zh, "游戏 ID"), (Language::En, "Game ID")]);
const ORIGINAL_PRICE: Phrase =
    Phrase::new(&[(Language::Zh, "原价"), (Language::En, "Original price")]);
const FINAL_PRICE: Phrase = Phrase::new(&[(Language::Zh, "现价"), (Language::En, "Price")]);
const DISCOUNT: Phrase = Phrase::new(&[(Language::Zh, "折扣"), (Language::En, "Discount")]);
const HARDWARE: Phrase = Phrase::new(&[(Language::Zh, "对应本体"), (Language::En, "Plays on")]);

/// What the store page tells about a game
#[derive(Debug, Default, PartialEq, Eq)]
struct StoreInfo {
    name: Option<String>,
    image: Option<String>,
    hardware: Option<&'static str>,
}

impl StoreInfo {
    fn parse(page: &str) -> Self {
        let capture = |regex: &Regex| {
            regex
                .captures(page)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .filter(|value| !value.is_empty())
        };
        let hardware = match (PLAYS_ON_SWITCH.is_match(page), PLAYS_ON_SWITCH_2.is_match(page)) {
            (true, true) => Some("Switch/Switch 2"),
            (false, true) => Some("Switch 2"),
            (true, false) => Some("Switch"),
            (false, false) => None,
        };
        Self { name: capture(&OG_TITLE), image: capture(&OG_IMAGE), hardware }
    }
}

/// Ids with any leading letter removed, at most ten
fn clean_ids(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|id| {
            let mut chars = id.chars();
            match chars.next() {
                Some(first) if first.is_ascii_alphabetic() => chars.as_str().trim().to_string(),
                _ => id,
            }
        })
        .filter(|id| !id.is_empty())
        .take(MAX_GAMES)
        .collect()
}

pub struct SwitchWishlistDiscount {
    price_base: String,
    store_base: String,
    retry: RetrySettings,
}

impl Default for SwitchWishlistDiscount {
    fn default() -> Self {
        Self {
            price_base: NINTENDO_PRICE_URL.to_string(),
            store_base: NINTENDO_STORE_URL.to_string(),
            retry: DESCRIPTOR.retry,
        }
    }
}

impl SwitchWishlistDiscount {
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.price_base = base.clone();
        self.store_base = base;
        self
    }

    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    fn store_url(&self, id: &str) -> String {
        format!("{}/item/software/D{id}", self.store_base)
    }

    async fn store_info(&self, ctx: &FeedContext, id: &str) -> StoreInfo {
        let request = HttpRequest::get(self.store_url(id));
        match fetch_text(ctx.http(), &request, &ctx.fetch_policy(RetrySettings::NONE)).await {
            Ok(page) => StoreInfo::parse(&page),
            Err(err) => {
                warn!(id, error = %err, "store page unavailable, using defaults");
                StoreInfo::default()
            }
        }
    }

    async fn map_price(
        &self,
        ctx: &FeedContext,
        price: &Price,
        percent: u32,
    ) -> Result<CalendarEvent> {
        let id = price.title_id.to_string();
        let info = self.store_info(ctx, &id).await;
        let name = info.name.unwrap_or_else(|| format!("{}: {id}", ctx.text(&GAME_ID)));
        let amount = |amount: &Option<Amount>| {
            amount.as_ref().map(|a| a.amount.clone()).unwrap_or_default()
        };

        let mut notes = format!(
            "{}: {}\n{}: {}\n{}: -{percent}%",
            ctx.text(&ORIGINAL_PRICE),
            amount(&price.regular_price),
            ctx.text(&FINAL_PRICE),
            amount(&price.discount_price),
            ctx.text(&DISCOUNT),
        );
        if let Some(hardware) = info.hardware {
            notes.push_str(&format!("\n{}: {hardware}", ctx.text(&HARDWARE)));
        }

        let date = ctx.format_date(ctx.today_at(0, 0));
        CalendarEvent::builder(format!("{name} (-{percent}%)"))
            .start(date.clone())
            .end(date)
            .color(discount_color(percent))
            .notes(notes)
            .href(Some(format!("{NINTENDO_STORE_URL}/item/software/D{id}")))
            .image_url(info.image)
            .all_day(true)
            .point_in_time(true)
            .build()
    }
}

#[async_trait]
impl EventFeed for SwitchWishlistDiscount {
    type Settings = Vec<String>;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, ctx: &FeedContext) -> Result<Vec<String>> {
        let ids = clean_ids(config.get_list("game_ids"));
        if ids.is_empty() {
            return Err(CalFeedError::Config(ctx.text(&IDS_REQUIRED).to_string()));
        }
        Ok(ids)
    }

    fn cache_plan(&self, ids: &Vec<String>, _ctx: &FeedContext) -> Option<CachePlan> {
        let key = CacheKey::builder(DESCRIPTOR.id).part("ids", ids.join("+")).build();
        Some(CachePlan::new(key, CacheTtl::Minutes(CACHE_MINUTES)))
    }

    async fn fetch(&self, ids: &Vec<String>, ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        let request = HttpRequest::get(format!(
            "{}/v1/price?country=JP&ids={}&lang=ja",
            self.price_base,
            ids.join(",")
        ));
        let no_prices = ctx.text(&NO_PRICES);
        let classify = |body: &Value| match body["prices"].as_array() {
            Some(prices) if !prices.is_empty() => Classification::Success,
            _ => Classification::Failed(no_prices.to_string()),
        };
        let response: PriceResponse =
            fetch_json(ctx.http(), &request, &ctx.fetch_policy(self.retry), &classify).await?;

        let mut mapped = Vec::new();
        for price in &response.prices {
            if price.sales_status == "not_found" {
                debug!(id = price.title_id, "unknown title id");
                continue;
            }
            if let Some(percent) = price.discount_percent() {
                mapped.push(self.map_price(ctx, price, percent).await);
            }
        }
        Ok(keep_valid(DESCRIPTOR.id, mapped))
    }

    fn map_error(&self, err: CalFeedError, ctx: &FeedContext) -> CalFeedError {
        let prefix = ctx.text(&FAILED);
        err.map_message(|message| format!("{prefix}: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::integrations::test_support;

    const STORE_PAGE: &str = r#"<html><head>
        <meta property="og:title" content="ゼルダの伝説">
        <meta property="og:image" content="https://img.example/zelda.jpg">
        </head><script>{"productDetail.playableHardNotice.label":[{"type":0,"value":"Nintendo Switch"}],
        "productDetail.playableHardNotice.label.onlySuper":[{"type":0,"value":"Nintendo Switch 2"}]}</script>"#;

    #[test]
    fn ids_lose_their_letter_prefix_and_are_capped() {
        let raw = vec!["D70010000000025".to_string(), "70010000000026".into(), "X".into()];
        assert_eq!(clean_ids(raw), vec!["70010000000025", "70010000000026"]);

        let many: Vec<String> = (0..15).map(|i| i.to_string()).collect();
        assert_eq!(clean_ids(many).len(), 10);
    }

    #[test]
    fn store_page_yields_name_image_and_hardware() {
        let info = StoreInfo::parse(STORE_PAGE);
        assert_eq!(info.name.as_deref(), Some("ゼルダの伝説"));
        assert_eq!(info.image.as_deref(), Some("https://img.example/zelda.jpg"));
        assert_eq!(info.hardware, Some("Switch/Switch 2"));
        assert_eq!(StoreInfo::parse("<html></html>"), StoreInfo::default());
    }

    #[tokio::test]
    async fn discounted_titles_become_events() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/price"))
            .and(query_param("country", "JP"))
            .and(query_param("ids", "70010000000025,70010000000026,70010000000027"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prices": [
                {
                    "title_id": 70010000000025u64,
                    "sales_status": "onsale",
                    "regular_price": {"amount": "7,678円", "currency": "JPY", "raw_value": "7678"},
                    "discount_price": {"amount": "1,919円", "currency": "JPY", "raw_value": "1919"}
                },
                {
                    "title_id": 70010000000026u64,
                    "sales_status": "onsale",
                    "regular_price": {"amount": "2,000円", "currency": "JPY", "raw_value": "2000"}
                },
                {"title_id": 70010000000027u64, "sales_status": "not_found"}
            ]})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/item/software/D70010000000025"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STORE_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let config = PluginConfig::new()
            .with("game_ids", "D70010000000025, 70010000000026, 70010000000027");

        let events = SwitchWishlistDiscount::default()
            .with_base_url(server.uri())
            .fetch_events(&ctx, &config)
            .await
            .unwrap();

        assert_eq!(events.len(), 1);
        let game = &events[0];
        assert_eq!(game.title(), "ゼルダの伝説 (-75%)");
        assert_eq!(game.color(), "#E74C3C");
        assert_eq!(
            game.notes(),
            "原价: 7,678円\n现价: 1,919円\n折扣: -75%\n对应本体: Switch/Switch 2"
        );
        assert_eq!(
            game.href(),
            Some("https://store-jp.nintendo.com/item/software/D70010000000025")
        );
        assert_eq!(game.image_url(), Some("https://img.example/zelda.jpg"));
    }

    #[tokio::test]
    async fn empty_price_list_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prices": []})))
            .mount(&server)
            .await;

        let ctx = test_support::context(&test_support::clock());
        let err = SwitchWishlistDiscount::default()
            .with_base_url(server.uri())
            .fetch_events(&ctx, &PluginConfig::new().with("game_ids", "1"))
            .await
            .unwrap_err();

        assert!(matches!(&err, CalFeedError::Upstream(_)));
        assert!(err.message().starts_with("Switch 愿望单插件执行失败: "));
        assert!(err.message().contains("未找到游戏价格信息"));
    }

    #[tokio::test]
    async fn blank_id_list_is_a_config_error() {
        let ctx = test_support::context(&test_support::clock());
        let err = SwitchWishlistDiscount::default()
            .fetch_events(&ctx, &PluginConfig::new().with("game_ids", " , "))
            .await
            .unwrap_err();
        assert!(matches!(err, CalFeedError::Config(_)));
    }
}
