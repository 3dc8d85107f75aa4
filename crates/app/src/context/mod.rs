//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use calfeed_core::{FeedContext, FeedRegistry, HttpGateway, KeyValueCache};
use calfeed_domain::{HostConfig, Result};
use calfeed_infra::integrations::jina::JinaReader;
use calfeed_infra::integrations::openai::OpenAIClient;
use calfeed_infra::{
    config, default_feeds, FileCache, HttpClient, LocalDateFormatter, MemoryCache,
};
use chrono::{FixedOffset, Local, Offset, Utc};
use tracing::{info, warn};

/// Application context - holds the registry and the services feeds run on
pub struct AppContext {
    pub config: HostConfig,
    pub registry: FeedRegistry,
    pub feeds: FeedContext,
}

impl AppContext {
    /// Context with every built-in feed registered
    pub fn new(config: HostConfig) -> Result<Self> {
        let mut registry = FeedRegistry::new();
        for feed in default_feeds() {
            registry.register(feed);
        }
        Self::with_registry(config, registry)
    }

    /// Context over a caller-supplied registry
    pub fn with_registry(config: HostConfig, registry: FeedRegistry) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let http = HttpClient::builder().timeout(timeout).build()?;
        let gateway: Arc<dyn HttpGateway> = Arc::new(http.clone());
        let offset = utc_offset(&config)?;

        let cache: Arc<dyn KeyValueCache> = match &config.cache_path {
            Some(path) => {
                let cache = FileCache::open(path)?;
                match cache.purge_expired(Utc::now()) {
                    Ok(purged) => info!(path = %path.display(), purged, "using file cache"),
                    Err(err) => warn!(error = %err, "could not purge expired cache entries"),
                }
                Arc::new(cache)
            }
            None => Arc::new(MemoryCache::new()),
        };

        let reader = JinaReader::new(gateway.clone()).with_api_key(config.jina_api_key.clone());
        let mut builder =
            FeedContext::builder(gateway, cache, Arc::new(LocalDateFormatter::new(offset)))
                .page_reader(Arc::new(reader))
                .timezone(offset)
                .language(config.language)
                .http_timeout(timeout);

        if let Some(api_key) = config.openai.api_key.clone() {
            let mut client = OpenAIClient::new(api_key, http);
            if let Some(model) = &config.openai.model {
                client = client.with_model(model.clone());
            }
            if let Some(url) = &config.openai.api_url {
                client = client.with_api_url(url.clone());
            }
            info!(model = client.model(), "text generation enabled");
            builder = builder.text_generator(Arc::new(client));
        }

        info!(feeds = registry.len(), language = ?config.language, "app context ready");
        Ok(Self { config, registry, feeds: builder.build() })
    }
}

/// Configured offset, or the system's current one
fn utc_offset(host: &HostConfig) -> Result<FixedOffset> {
    match host.utc_offset.as_deref() {
        Some(raw) => config::parse_utc_offset(raw),
        None => Ok(Local::now().offset().fix()),
    }
}
