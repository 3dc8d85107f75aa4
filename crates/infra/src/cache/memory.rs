//! In-memory cache backed by moka

use async_trait::async_trait;
use calfeed_core::{CacheEntry, CachedValue, KeyValueCache};
use calfeed_domain::constants::DEFAULT_MEMORY_CACHE_CAPACITY;
use calfeed_domain::Result;
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use tracing::debug;

/// Bounded in-process cache
///
/// Evicts by size once `max_capacity` entries are held. Cloning is cheap and
/// clones share storage.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CACHE_CAPACITY)
    }

    pub fn with_capacity(max_capacity: u64) -> Self {
        Self { entries: Cache::builder().max_capacity(max_capacity).build() }
    }

    pub fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let entry = self.entries.get(key);
        debug!(key, hit = entry.is_some(), "memory cache lookup");
        Ok(entry)
    }

    async fn set(&self, key: &str, value: CachedValue, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn returns_stored_entry_with_its_expiry() {
        let cache = MemoryCache::new();
        let expires_at = Utc::now() + Duration::minutes(5);

        cache.set("feed|user=ada", CachedValue::Json(json!([1, 2])), expires_at).await.unwrap();

        let entry = cache.get("feed|user=ada").await.unwrap().expect("entry");
        assert_eq!(entry.value, CachedValue::Json(json!([1, 2])));
        assert_eq!(entry.expires_at, expires_at);
        assert!(cache.get("feed|user=bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_write_wins() {
        let cache = MemoryCache::with_capacity(10);
        let expires_at = Utc::now();

        cache.set("k", CachedValue::Text("first".into()), expires_at).await.unwrap();
        cache.set("k", CachedValue::Text("second".into()), expires_at).await.unwrap();

        let entry = cache.get("k").await.unwrap().expect("entry");
        assert_eq!(entry.value, CachedValue::Text("second".into()));
        assert_eq!(cache.entry_count(), 1);
    }
}
