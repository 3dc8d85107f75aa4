use std::time::Duration;

use calfeed_domain::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn,calfeed=info";

/// Install the global subscriber, writing to stderr
///
/// `json` switches to one JSON object per line. Calling this twice is a
/// no-op for the second call.
pub fn init(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.with_target(false).try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a feed run with structured fields.
///
/// `feed` is the feed id; error kinds come from [`calfeed_domain::CalFeedError::kind`].
#[inline]
pub fn log_command_execution<T>(feed: &str, elapsed: Duration, result: &Result<Vec<T>>) {
    let duration_ms = elapsed.as_millis() as u64;

    match result {
        Ok(events) => info!(feed, duration_ms, events = events.len(), "feed_run_success"),
        Err(err) => warn!(feed, duration_ms, kind = err.kind(), "feed_run_failure"),
    }
}
