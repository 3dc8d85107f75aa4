use async_trait::async_trait;
use calfeed_core::{
    fetch_json, CachePlan, CacheReadPolicy, EventFeed, FeedContext, FeedDescriptor, Phrase,
    RetrySettings,
};
use calfeed_domain::{CalendarEvent, ErrorPolicy, Language, PluginConfig, Result};
use chrono::Duration;
use tracing::info;

use crate::integrations::keep_valid;
use super::types::Event;
use super::{classify_list, request, GITHUB_API_URL};

const DESCRIPTOR: FeedDescriptor = FeedDescriptor {
    id: "github_public_events",
    summary: "GitHub public timeline, for discovering active projects",
    error_policy: ErrorPolicy::EmptyOnError,
    read_policy: CacheReadPolicy::Structured,
    retry: RetrySettings::NONE,
};

const DEFAULT_LIMIT: u32 = 10;

const NOTES: Phrase =
    Phrase::new(&[(Language::Zh, "GitHub 公开事件"), (Language::En, "GitHub public event")]);

/// Uncached single request; failures yield no events
pub struct GithubPublicEvents {
    api_base: String,
}

impl Default for GithubPublicEvents {
    fn default() -> Self {
        Self { api_base: GITHUB_API_URL.to_string() }
    }
}

impl GithubPublicEvents {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl EventFeed for GithubPublicEvents {
    type Settings = usize;

    fn descriptor(&self) -> &FeedDescriptor {
        &DESCRIPTOR
    }

    fn settings(&self, config: &PluginConfig, _ctx: &FeedContext) -> Result<usize> {
        Ok(config.get_u32_or("limit", DEFAULT_LIMIT)? as usize)
    }

    fn cache_plan(&self, _limit: &usize, _ctx: &FeedContext) -> Option<CachePlan> {
        None
    }

    async fn fetch(&self, limit: &usize, ctx: &FeedContext) -> Result<Vec<CalendarEvent>> {
        let request = request(format!("{}/events", self.api_base), None);
        let timeline: Vec<Event> =
            fetch_json(ctx.http(), &request, &ctx.fetch_policy(DESCRIPTOR.retry), &classify_list)
                .await?;

        let events = keep_valid(
            DESCRIPTOR.id,
            timeline.into_iter().take(*limit).map(|event| map_event(ctx, event)),
        );
        info!(count = events.len(), "github public events mapped");
        Ok(events)
    }
}

fn map_event(ctx: &FeedContext, event: Event) -> Result<CalendarEvent> {
    let actor = &event.actor.login;
    let repo = event.repo_name();
    let payload = &event.payload;
    let action = payload.action.as_deref().unwrap_or_default();

    let (title, color) = match event.kind.as_str() {
        "WatchEvent" => (format!("{actor} starred {repo}"), "#f1c232"),
        "ForkEvent" => (format!("{actor} forked {repo}"), "#34a853"),
        "IssuesEvent" => (format!("{actor} {action} issue in {repo}"), "#ea4335"),
        "PushEvent" => (format!("{actor} pushed to {repo}"), "#4285f4"),
        "CreateEvent" => {
            let ref_type = payload.ref_type.as_deref().unwrap_or_default();
            (format!("{actor} created {ref_type} in {repo}"), "#ff6d01")
        }
        "PullRequestEvent" => (format!("{actor} {action} pull request in {repo}"), "#9b59b6"),
        other => (format!("{actor} {other} in {repo}"), "#666666"),
    };

    let start = event.created_at;
    let end = start + Duration::hours(1);

    CalendarEvent::builder(title)
        .start(ctx.format_date(start.timestamp()))
        .end(ctx.format_date(end.timestamp()))
        .color(color)
        .notes(format!("{} - {repo}", ctx.text(&NOTES)))
        .icon(event.actor.avatar_url.clone())
        .href(Some(format!("https://github.com/{repo}")))
        .point_in_time(true)
        .build()
}
