//! Host and feed configuration types
//!
//! A feed receives its settings as a flat map of JSON scalars. Values may come
//! from a TOML/JSON config file or from `--set key=value` on the command line,
//! so the typed accessors accept both native JSON types and their string
//! spellings (`"20"` for a number, `"true"` for a bool).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::errors::{CalFeedError, Result};
use crate::language::Language;
use crate::impl_domain_status_conversions;

/// Config key that overrides a feed's default [`ErrorPolicy`]
pub const ERROR_POLICY_KEY: &str = "on_error";

/// What a feed does with a failure after the pipeline gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Return the error to the caller
    Propagate,
    /// Log the error and return an empty event list
    EmptyOnError,
}

impl_domain_status_conversions!(ErrorPolicy {
    Propagate => "propagate",
    EmptyOnError => "empty",
});

/// Settings handed to a feed for a single invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginConfig {
    values: BTreeMap<String, Value>,
}

impl PluginConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: PluginConfig) {
        self.values.extend(other.values);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// String value for `key`. Numbers are rendered as strings; blank strings
    /// and `null` count as absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Like [`PluginConfig::get_str`] but a missing value is a config error
    pub fn require_str(&self, key: &str) -> Result<String> {
        self.get_str(key)
            .ok_or_else(|| CalFeedError::Config(format!("missing required setting `{key}`")))
    }

    /// Non-negative integer for `key`, `None` when absent
    pub fn get_u32(&self, key: &str) -> Result<Option<u32>> {
        let invalid = || CalFeedError::Config(format!("setting `{key}` must be a whole number"));
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                n.as_u64().and_then(|v| u32::try_from(v).ok()).map(Some).ok_or_else(invalid)
            }
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    pub fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        Ok(self.get_u32(key)?.unwrap_or(default))
    }

    /// Boolean for `key`; accepts `true`/`false`/`1`/`0` strings
    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::Number(n)) => Ok(n.as_i64().unwrap_or_default() != 0),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "" => Ok(default),
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                other => {
                    Err(CalFeedError::Config(format!("setting `{key}` must be a bool, got `{other}`")))
                }
            },
            Some(_) => Err(CalFeedError::Config(format!("setting `{key}` must be a bool"))),
        }
    }

    /// List for `key`: a JSON array or a comma-separated string. Blank
    /// entries are dropped.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        let raw: Vec<String> = match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
            Some(Value::Number(n)) => vec![n.to_string()],
            _ => Vec::new(),
        };

        raw.into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Error policy override from the `on_error` key, if present
    pub fn error_policy(&self) -> Result<Option<ErrorPolicy>> {
        self.get_str(ERROR_POLICY_KEY)
            .map(|raw| raw.parse::<ErrorPolicy>().map_err(CalFeedError::Config))
            .transpose()
    }
}

impl<K, V> FromIterator<(K, V)> for PluginConfig
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Self::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

/// Text generation settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextGenerationConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub api_url: Option<String>,
}

/// Host-level configuration shared by every feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// File cache location; an in-memory cache is used when unset
    pub cache_path: Option<PathBuf>,
    pub language: Language,
    pub http_timeout_secs: u64,
    /// Fixed UTC offset such as `+08:00`; the system offset when unset
    pub utc_offset: Option<String>,
    pub openai: TextGenerationConfig,
    pub jina_api_key: Option<String>,
    /// Per-feed settings keyed by feed id
    pub feeds: BTreeMap<String, PluginConfig>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cache_path: None,
            language: Language::default(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            utc_offset: None,
            openai: TextGenerationConfig::default(),
            jina_api_key: None,
            feeds: BTreeMap::new(),
        }
    }
}

impl HostConfig {
    /// Settings for `feed_id`, empty when the feed has no section
    pub fn feed(&self, feed_id: &str) -> PluginConfig {
        self.feeds.get(feed_id).cloned().unwrap_or_default()
    }
}
