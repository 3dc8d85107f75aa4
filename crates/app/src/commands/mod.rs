//! Commands the CLI exposes

use std::time::Instant;

use calfeed_domain::{CalFeedError, CalendarEvent, PluginConfig, Result};
use serde::Serialize;

use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

/// One row of `calfeed list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    pub id: &'static str,
    pub summary: &'static str,
    pub configured: bool,
}

/// Registered feeds in id order, flagged when the config has a section
pub fn list_feeds(ctx: &AppContext) -> Vec<FeedSummary> {
    ctx.registry
        .descriptors()
        .map(|descriptor| FeedSummary {
            id: descriptor.id,
            summary: descriptor.summary,
            configured: ctx.config.feeds.contains_key(descriptor.id),
        })
        .collect()
}

/// Run `feed_id` with its config section, `overrides` taking precedence
pub async fn run_feed(
    ctx: &AppContext,
    feed_id: &str,
    overrides: PluginConfig,
) -> Result<Vec<CalendarEvent>> {
    let start = Instant::now();
    let feed = ctx.registry.get(feed_id)?;

    let mut config = ctx.config.feed(feed_id);
    config.merge(overrides);

    let result = feed.fetch_events(&ctx.feeds, &config).await;
    log_command_execution(feed_id, start.elapsed(), &result);
    result
}

/// Parse a `key=value` setting from the command line
pub fn parse_setting(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(CalFeedError::InvalidInput(format!("expected key=value, got `{raw}`"))),
    }
}
