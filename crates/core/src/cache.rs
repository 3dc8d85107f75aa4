//! Cache-backed fetch
//!
//! Wraps an expensive producer with a read-through, write-through cache. A
//! fresh hit returns the stored value without calling the producer. Cache
//! problems never fail an invocation: unreadable entries count as misses and
//! failed writes are only logged.

use std::future::Future;
use std::sync::Arc;

use calfeed_common::time::Clock;
use calfeed_domain::constants::MIN_END_OF_DAY_TTL_MINUTES;
use calfeed_domain::Result;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache_key::CacheKey;
use crate::ports::{CachedValue, KeyValueCache};

/// How long a freshly written entry stays valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTtl {
    Minutes(i64),
    /// Until the next local midnight, but never less than a few minutes
    UntilEndOfDay,
    Until(DateTime<Utc>),
}

impl CacheTtl {
    /// Absolute expiry for an entry written at `now`
    pub fn expires_at(&self, now: DateTime<Utc>, tz: FixedOffset) -> DateTime<Utc> {
        match self {
            Self::Minutes(minutes) => now + Duration::minutes(*minutes),
            Self::UntilEndOfDay => {
                let local = now.with_timezone(&tz);
                let midnight = local
                    .date_naive()
                    .succ_opt()
                    .and_then(|next| next.and_hms_opt(0, 0, 0))
                    .and_then(|naive| naive.and_local_timezone(tz).single())
                    .map(|at| at.with_timezone(&Utc))
                    .unwrap_or(now);
                midnight.max(now + Duration::minutes(MIN_END_OF_DAY_TTL_MINUTES))
            }
            Self::Until(at) => *at,
        }
    }
}

/// Representation used when storing a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheReadPolicy {
    /// Store as a JSON value
    Structured,
    /// Store as a serialized string, parse on read
    DeserializeOnRead,
}

/// Read-through cache over a [`KeyValueCache`] port
#[derive(Clone)]
pub struct CacheBackedFetch {
    cache: Arc<dyn KeyValueCache>,
    clock: Arc<dyn Clock>,
    tz: FixedOffset,
}

impl CacheBackedFetch {
    pub fn new(cache: Arc<dyn KeyValueCache>, clock: Arc<dyn Clock>, tz: FixedOffset) -> Self {
        Self { cache, clock, tz }
    }

    /// Return the cached value for `key`, or produce, store and return it
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: CacheTtl,
        policy: CacheReadPolicy,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.lookup::<T>(key).await {
            debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        debug!(key = %key, "cache miss");
        let value = fetch().await?;
        self.store(key, ttl, policy, &value).await;
        Ok(value)
    }

    /// Fresh cached value for `key`, if any
    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let entry = match self.cache.get(key.as_str()).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %key, error = %err, "cache read failed, treating as miss");
                return None;
            }
        };

        if !entry.is_fresh(self.clock.utc_now()) {
            debug!(key = %key, expires_at = %entry.expires_at, "cache entry expired");
            return None;
        }

        let decoded = match entry.value {
            CachedValue::Json(value) => serde_json::from_value(value),
            CachedValue::Text(text) => serde_json::from_str(&text),
        };

        match decoded {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %key, error = %err, "cached entry is corrupt, treating as miss");
                None
            }
        }
    }

    /// Write `value` under `key`; failures are logged and swallowed
    pub async fn store<T: Serialize>(
        &self,
        key: &CacheKey,
        ttl: CacheTtl,
        policy: CacheReadPolicy,
        value: &T,
    ) {
        let encoded = match policy {
            CacheReadPolicy::Structured => serde_json::to_value(value).map(CachedValue::Json),
            CacheReadPolicy::DeserializeOnRead => serde_json::to_string(value).map(CachedValue::Text),
        };

        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(key = %key, error = %err, "failed to encode value for cache");
                return;
            }
        };

        let expires_at = ttl.expires_at(self.clock.utc_now(), self.tz);
        if let Err(err) = self.cache.set(key.as_str(), encoded, expires_at).await {
            warn!(key = %key, error = %err, "cache write failed");
        }
    }
}
