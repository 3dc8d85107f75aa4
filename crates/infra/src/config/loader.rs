//! Configuration loader
//!
//! Loads the host configuration from a config file and environment variables.
//!
//! ## Loading Strategy
//! 1. Load the file given explicitly, or the first probed file if any
//! 2. Start from defaults when no file is found
//! 3. Apply environment variables on top; they always win
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CALFEED_CACHE_PATH`: File cache location
//! - `CALFEED_LANGUAGE`: Display language tag (`zh`, `en-US`, ...)
//! - `CALFEED_HTTP_TIMEOUT_SECS`: Per-request HTTP timeout
//! - `CALFEED_UTC_OFFSET`: Fixed offset for dates and day buckets (`+08:00`)
//! - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_API_URL`: Text generation
//! - `JINA_API_KEY`: Page reader key
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./calfeed.toml` or `./calfeed.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names relative to the executable location
//!
//! Feed settings live in per-feed sections:
//!
//! ```toml
//! language = "en"
//!
//! [feeds.github_user_events]
//! username = "octocat"
//! limit = 20
//! ```

use std::path::{Path, PathBuf};

use calfeed_domain::{CalFeedError, HostConfig, Language, Result};
use chrono::FixedOffset;

const CONFIG_FILE_NAMES: [&str; 4] = ["calfeed.toml", "calfeed.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CalFeedError::Config` if:
/// - An explicitly given file does not exist
/// - The file format is invalid
/// - An environment variable has an invalid value
pub fn load(path: Option<PathBuf>) -> Result<HostConfig> {
    let base = match path {
        Some(path) => load_from_file(&path)?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(&found)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                HostConfig::default()
            }
        },
    };

    apply_env(base)
}

/// Overlay environment variables on `config`
///
/// # Errors
/// Returns `CalFeedError::Config` for unparseable values.
pub fn apply_env(mut config: HostConfig) -> Result<HostConfig> {
    if let Some(path) = env_opt("CALFEED_CACHE_PATH") {
        config.cache_path = Some(PathBuf::from(path));
    }

    if let Some(tag) = env_opt("CALFEED_LANGUAGE") {
        config.language = Language::from_tag(&tag).ok_or_else(|| {
            CalFeedError::Config(format!("Unsupported language in CALFEED_LANGUAGE: {}", tag))
        })?;
    }

    if let Some(raw) = env_opt("CALFEED_HTTP_TIMEOUT_SECS") {
        config.http_timeout_secs = raw
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| CalFeedError::Config(format!("Invalid HTTP timeout: {}", raw)))?;
    }

    if let Some(offset) = env_opt("CALFEED_UTC_OFFSET") {
        parse_utc_offset(&offset)?;
        config.utc_offset = Some(offset);
    }

    if let Some(key) = env_opt("OPENAI_API_KEY") {
        config.openai.api_key = Some(key);
    }
    if let Some(model) = env_opt("OPENAI_MODEL") {
        config.openai.model = Some(model);
    }
    if let Some(url) = env_opt("OPENAI_API_URL") {
        config.openai.api_url = Some(url);
    }
    if let Some(key) = env_opt("JINA_API_KEY") {
        config.jina_api_key = Some(key);
    }

    Ok(config)
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CalFeedError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: &Path) -> Result<HostConfig> {
    if !path.exists() {
        return Err(CalFeedError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| CalFeedError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<HostConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let config: HostConfig = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CalFeedError::Config(format!("Invalid TOML format: {}", e)))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| CalFeedError::Config(format!("Invalid JSON format: {}", e)))?,
        _ => {
            return Err(CalFeedError::Config(format!("Unsupported config format: {}", extension)))
        }
    };

    if let Some(offset) = &config.utc_offset {
        parse_utc_offset(offset)?;
    }
    Ok(config)
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Parse a `+HH:MM` / `-HH:MM` offset
///
/// # Errors
/// Returns `CalFeedError::Config` for anything else.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset> {
    let invalid = || CalFeedError::Config(format!("Invalid UTC offset `{}`, expected +HH:MM", raw));
    let trimmed = raw.trim();
    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Non-blank environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
