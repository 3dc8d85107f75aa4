//! GitHub feeds
//!
//! [`GithubNotifications`] needs a personal access token, [`GithubUserEvents`]
//! takes one optionally, [`GithubPublicEvents`] is anonymous. All three read
//! JSON arrays; an object in their place carries an API error message.

mod notifications;
mod public_events;
mod types;
mod user_events;

use std::time::Duration;

use calfeed_core::{Classification, HttpRequest, RetrySettings};
use serde_json::Value;

pub use notifications::GithubNotifications;
pub use public_events::GithubPublicEvents;
pub use user_events::GithubUserEvents;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Three attempts one second apart
pub const GITHUB_RETRY: RetrySettings = RetrySettings::fixed(3, Duration::from_secs(1));

/// GET `url` with the v3 media type and an optional token
fn request(url: String, token: Option<&str>) -> HttpRequest {
    let request = HttpRequest::get(url).header("Accept", ACCEPT);
    match token {
        Some(token) => request.header("Authorization", format!("token {token}")),
        None => request,
    }
}

fn classify_list(body: &Value) -> Classification {
    match body {
        Value::Array(_) => Classification::Success,
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => Classification::Failed(format!("GitHub API error: {message}")),
            None => Classification::Failed("GitHub API returned an object, expected a list".into()),
        },
        _ => Classification::Failed("GitHub API returned an unexpected payload".into()),
    }
}
