//! A daily quote from the text generator
//!
//! The quote is generated at most once per day, style and language, and shown
//! in a morning, afternoon or evening slot. Without a working generator the
//! feed shows a built-in quote for the style and does not cache it.

mod prompt;

use async_trait::async_trait;
use calfeed_core::{
    day_bucket, CacheKey, CachePlan, CacheReadPolicy, CacheTtl, EventFeed, FeedContext,
    FeedDescriptor, Phrase, RetrySettings,
};
use calfeed_domain::{CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use tracing::{debug, info, warn};

use self::prompt::{QuoteLanguage, Style};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "daily_wisdom",
    summary: "One generated quote per day",
    error_policy: ErrorPolicy::EmptyOnError,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::NONE,
};

const ICON: &str = "💡";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" | "早上" => Some(Self::Morning),
            "afternoon" | "下午" => Some(Self::Afternoon),
            "evening" | "傍晚" => Some(Self::Evening),
            _ => None,
        }
    }

    fn hours(self) -> (u32, u32) {
        match self {
            Self::Morning => (7, 9),
            Self::Afternoon => (14, 16),
            Self::Evening => (18, 20),
        }
    }

    fn title(self) -> &'static Phrase {
        match self {
            Self::Morning => &MORNING,
            Self::Afternoon => &AFTERNOON,
            Self::Evening => &EVENING,
        }
    }
}

const MORNING: Phrase =
    Phrase::new(&[(Language::Zh, "早安智慧语录"), (Language::En, "Morning wisdom")]);
const AFTERNOON: Phrase =
    Phrase::new(&[(Language::Zh, "午后智慧语录"), (Language::En, "Afternoon wisdom")]);
const EVENING: Phrase =
    Phrase::new(&[(Language::Zh, "傍晚智慧语录"), (Language::En, "Evening wisdom")]);

pub struct WisdomSettings {
    style: Style,
    language: QuoteLanguage,
    slot: TimeSlot,
}

/// Reads a setting through `parse`, warning and using `default` on unknown values
fn lenient<T>(
    config: &PluginConfig,
    key: &str,
    default: T,
    parse: impl Fn(&str) -> Option<T>,
) -> T {
    match config.get_str(key) {
        Some(raw) => parse(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "unrecognised setting, using default");
            default
        }),
        None => default,
    }
}

pub struct DailyWisdom;

impl DailyWisdom {
    async fn quote(&self, settings: &WisdomSettings, ctx: &FeedContext) -> String {
        let today = ctx.now_local().date_naive();
        let key = CacheKey::builder(DESCRIPTOR.id)
            .part("day", day_bucket(today))
            .part("style", settings.style.key())
            .part("lang", settings.language.key())
            .build();
        let cache = ctx.cache();

        if let Some(text) = cache.lookup::<String>(&key).await {
            debug!("using cached quote");
            return text;
        }

        let generated = match ctx.text_generator() {
            Ok(generator) => {
                generator.generate(&prompt::build(settings.style, settings.language, today)).await
            }
            Err(err) => Err(err),
        };

        match generated {
            Ok(text) if !text.trim().is_empty() && !text.starts_with("Error:") => {
                let text = text.trim().to_string();
                cache.store(&key, CacheTtl::UntilEndOfDay, DESCRIPTOR.read_policy, &text).await;
                info!(style = settings.style.key(), "quote generated");
                text
            }
            Ok(text) => {
                warn!(answer = %text, "unusable quote, using fallback");
                prompt::fallback(settings.style, settings.language)
            }
            Err(err) => {
                warn!(error = %err, "quote generation failed, using fallback");
                prompt::fallback(settings.style, settings.language)
            }
        }
    }
}

#[async_trait]
impl EventFeed for DailyWisdom {
    type Settings = WisdomSettings;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, ctx: &FeedContext) -> Result<WisdomSettings> {
        let display = QuoteLanguage::for_display(ctx.localizer().language());
        let language = lenient(config, "language", Some(display), QuoteLanguage::parse);

        Ok(WisdomSettings {
            style: lenient(config, "style", Style::default(), Style::parse),
            language: language.unwrap_or(display),
            slot: lenient(config, "time", TimeSlot::Morning, TimeSlot::parse),
        })
    }

    fn cache_plan(&self, _settings: &WisdomSettings, _ctx: &FeedContext) -> Option<CachePlan> {
        None
    }

    async fn fetch(
        &self,
        settings: &WisdomSettings,
        ctx: &FeedContext,
    ) -> Result<Vec<CalendarEvent>> {
        let quote = self.quote(settings, ctx).await;
        let (start, end) = settings.slot.hours();

        let event = CalendarEvent::builder(ctx.text(settings.slot.title()))
            .start(ctx.format_date(ctx.today_at(start, 0)))
            .end(ctx.format_date(ctx.today_at(end, 0)))
            .color(settings.style.color())
            .notes(quote)
            .icon(Some(ICON.to_string()))
            .build()?;

        Ok(vec![event])
    }
}

#[cfg(test)]
mod tests {
    use calfeed_core::EventSource;

    use super::*;
    use crate::integrations::test_support::{self, CannedText};

    #[tokio::test]
    async fn generated_quote_is_cached_for_the_day() {
        let clock = test_support::clock();
        let text = CannedText::answering("  知行合一。 ");
        let ctx = test_support::builder(&clock).text_generator(text.clone()).build();
        let config = PluginConfig::new().with("style", "哲理").with("time", "evening");

        let events = DailyWisdom.fetch_events(&ctx, &config).await.unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.title(), "傍晚智慧语录");
        assert_eq!(event.notes(), "知行合一。");
        assert_eq!(event.start_date(), "2024-05-01 18:00");
        assert_eq!(event.end_date(), "2024-05-01 20:00");
        assert_eq!(event.color(), "#4ECDC4");
        assert_eq!(event.icon(), Some("💡"));
        assert!(!event.is_all_day());
        assert!(!event.is_point_in_time());

        clock.advance_minutes(120);
        DailyWisdom.fetch_events(&ctx, &config).await.unwrap();
        assert_eq!(text.calls(), 1);
        assert!(text.prompts.lock()[0].contains("哲理"));
    }

    #[tokio::test]
    async fn failed_generation_falls_back_without_caching() {
        let clock = test_support::clock();
        let text = CannedText::failing();
        let ctx = test_support::builder(&clock).text_generator(text.clone()).build();
        let config = PluginConfig::new().with("language", "英文");

        let first = DailyWisdom.fetch_events(&ctx, &config).await.unwrap();
        DailyWisdom.fetch_events(&ctx, &config).await.unwrap();

        assert_eq!(first[0].notes(), "Every day is a new beginning, believe in your strength!");
        assert_eq!(first[0].title(), "早安智慧语录");
        assert_eq!(text.calls(), 2);
    }

    #[tokio::test]
    async fn error_answers_are_not_shown() {
        let clock = test_support::clock();
        let text = CannedText::answering("Error: quota exceeded");
        let ctx = test_support::builder(&clock).text_generator(text).build();

        let events = DailyWisdom
            .fetch_events(&ctx, &PluginConfig::new().with("style", "幽默"))
            .await
            .unwrap();

        assert_eq!(events[0].notes(), "生活就像咖啡，苦一点没关系，加点糖就甜了！");
    }

    #[tokio::test]
    async fn works_without_a_generator() {
        let clock = test_support::clock();
        let ctx = test_support::builder(&clock).language(Language::En).build();

        let events = DailyWisdom
            .fetch_events(&ctx, &PluginConfig::new().with("language", "auto"))
            .await
            .unwrap();

        assert_eq!(events[0].title(), "Morning wisdom");
        assert!(events[0].notes().starts_with("Every day"));
    }
}
