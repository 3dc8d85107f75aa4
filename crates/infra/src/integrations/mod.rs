//! External service integrations
//!
//! One module per upstream service. Every feed implements
//! [`EventFeed`](calfeed_core::EventFeed); [`default_feeds`] lists them all
//! with production endpoints.

use std::sync::Arc;

use calfeed_core::EventSource;
use calfeed_domain::{CalendarEvent, Result};
use sha2::{Digest, Sha256};
use tracing::warn;

pub mod bilibili;
pub mod daily_wisdom;
pub mod github;
pub mod jina;
pub mod maoyan;
pub mod openai;
pub mod steam;
pub mod switch;
pub mod unsplash;

#[cfg(test)]
mod test_support;

/// Events that mapped cleanly; failed items are logged and dropped
pub(crate) fn keep_valid<I>(feed: &'static str, mapped: I) -> Vec<CalendarEvent>
where
    I: IntoIterator<Item = Result<CalendarEvent>>,
{
    mapped
        .into_iter()
        .filter_map(|event| match event {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(feed, error = %err, "skipping upstream item");
                None
            }
        })
        .collect()
}

/// Short stable digest of a credential, for cache keys
pub(crate) fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)[..12].to_string()
}

/// Every feed, configured for the real upstream services
pub fn default_feeds() -> Vec<Arc<dyn EventSource>> {
    vec![
        Arc::new(bilibili::BilibiliUserVideos::default()),
        Arc::new(bilibili::BilibiliRotation::default()),
        Arc::new(github::GithubNotifications::default()),
        Arc::new(github::GithubUserEvents::default()),
        Arc::new(github::GithubPublicEvents::default()),
        Arc::new(steam::SteamWishlistDiscount::default()),
        Arc::new(switch::SwitchWishlistDiscount::default()),
        Arc::new(unsplash::UnsplashDailyTheme::default()),
        Arc::new(daily_wisdom::DailyWisdom),
        Arc::new(maoyan::MaoyanHotMovies),
    ]
}

#[cfg(test)]
mod tests {
    use calfeed_domain::CalFeedError;

    use super::*;

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = token_fingerprint("ghp_secret");
        assert_eq!(a.len(), 12);
        assert_eq!(a, token_fingerprint("ghp_secret"));
        assert_ne!(a, token_fingerprint("ghp_other"));
        assert!(!a.contains("secret"));
    }

    #[test]
    fn failed_items_are_dropped() {
        let items = vec![
            CalendarEvent::builder("kept").start("2024-05-01 09:00").build(),
            Err(CalFeedError::Parse("bad item".into())),
            CalendarEvent::builder("").start("2024-05-01 10:00").build(),
        ];
        let kept = keep_valid("test_feed", items);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title(), "kept");
    }
}
