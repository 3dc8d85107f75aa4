//! JSON file cache for the command-line host
//!
//! The whole cache is one JSON object keyed by cache key. It is loaded once
//! when opened and rewritten on every `set` through a temporary file that is
//! renamed over the original, so a crash mid-write leaves the previous
//! contents intact.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use calfeed_core::{CacheEntry, CachedValue, KeyValueCache};
use calfeed_domain::{CalFeedError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::errors::InfraError;

pub struct FileCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl FileCache {
    /// Open the cache at `path`, creating parent directories as needed
    ///
    /// A missing file starts an empty cache. An unreadable or corrupt file is
    /// logged and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "cache file is corrupt, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(io_error(err)),
        };

        info!(path = %path.display(), entries = entries.len(), "file cache opened");
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop entries that expired before `now` and persist the result
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "purged expired cache entries");
            persist(&self.path, &entries)?;
        }
        Ok(removed)
    }
}

fn persist(path: &Path, entries: &BTreeMap<String, CacheEntry>) -> Result<()> {
    let json = serde_json::to_vec_pretty(entries)
        .map_err(|err| CalFeedError::from(InfraError::from(err)))?;
    let tmp = path.with_extension("json.tmp");

    let mut file = fs::File::create(&tmp).map_err(io_error)?;
    file.write_all(&json).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)?;
    Ok(())
}

fn io_error(err: std::io::Error) -> CalFeedError {
    InfraError::from(err).into()
}

#[async_trait]
impl KeyValueCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: CachedValue, expires_at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        persist(&self.path, &entries)
    }
}
