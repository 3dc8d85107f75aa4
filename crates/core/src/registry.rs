//! Feed registry

use std::collections::BTreeMap;
use std::sync::Arc;

use calfeed_domain::{CalFeedError, Result};

use crate::feed::{EventSource, FeedDescriptor};

/// Feeds known to the host, keyed by id
#[derive(Clone, Default)]
pub struct FeedRegistry {
    feeds: BTreeMap<&'static str, Arc<dyn EventSource>>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feed; a later registration with the same id replaces the earlier
    pub fn register(&mut self, feed: Arc<dyn EventSource>) -> &mut Self {
        self.feeds.insert(feed.feed_descriptor().id, feed);
        self
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn EventSource>> {
        self.feeds
            .get(id)
            .cloned()
            .ok_or_else(|| CalFeedError::NotFound(format!("unknown feed `{id}`")))
    }

    /// Descriptors in id order
    pub fn descriptors(&self) -> impl Iterator<Item = &FeedDescriptor> {
        self.feeds.values().map(|feed| feed.feed_descriptor())
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
