use std::collections::BTreeMap;
use std::sync::Arc;

use formweave_core::AppResult;
use formweave_domain::{FormSchema, NodeKind, OptionSource, SelectOption};
use tracing::{debug, warn};

use crate::option_source_ports::{OptionSourceCache, OptionSourceFetcher};

/// Default lifetime of cached option lists.
pub const DEFAULT_OPTION_CACHE_TTL_SECONDS: u32 = 300;

/// Loads select options from remote sources through an owned cache.
#[derive(Clone)]
pub struct OptionSourceService {
    fetcher: Arc<dyn OptionSourceFetcher>,
    cache: Option<Arc<dyn OptionSourceCache>>,
    cache_ttl_seconds: u32,
}

impl OptionSourceService {
    /// Creates an uncached service.
    #[must_use]
    pub fn new(fetcher: Arc<dyn OptionSourceFetcher>) -> Self {
        Self {
            fetcher,
            cache: None,
            cache_ttl_seconds: DEFAULT_OPTION_CACHE_TTL_SECONDS,
        }
    }

    /// Adds option list caching.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn OptionSourceCache>, ttl_seconds: u32) -> Self {
        self.cache = Some(cache);
        self.cache_ttl_seconds = ttl_seconds;
        self
    }

    /// Returns options for one source.
    ///
    /// Fetch failures are logged and yield no options. Cache failures are
    /// logged and bypassed.
    pub async fn load_options(&self, source: &OptionSource) -> Vec<SelectOption> {
        let signature = source.request_signature();

        if let Some(cache) = &self.cache {
            match cache.get_options(&signature).await {
                Ok(Some(options)) => {
                    debug!(url = %source.url(), "option source cache hit");
                    return options;
                }
                Ok(None) => debug!(url = %source.url(), "option source cache miss"),
                Err(error) => {
                    warn!(url = %source.url(), error = %error, "option source cache read failed");
                }
            }
        }

        let rows = match self.fetcher.fetch_rows(source).await {
            Ok(rows) => rows,
            Err(error) => {
                warn!(url = %source.url(), error = %error, "option source fetch failed");
                return Vec::new();
            }
        };
        let options = source.options_from_rows(&rows);

        if let Some(cache) = &self.cache
            && let Err(error) = cache
                .set_options(&signature, options.clone(), self.cache_ttl_seconds)
                .await
        {
            warn!(url = %source.url(), error = %error, "option source cache write failed");
        }

        options
    }

    /// Loads options for every select node with a data source, keyed by node id.
    pub async fn resolve_schema_options(
        &self,
        schema: &FormSchema,
    ) -> BTreeMap<String, Vec<SelectOption>> {
        let mut resolved = BTreeMap::new();
        for node in schema.walk() {
            let NodeKind::Select(select) = node.kind() else {
                continue;
            };
            let Some(source) = &select.data_source else {
                continue;
            };

            let options = self.load_options(source).await;
            resolved.insert(node.id().as_str().to_owned(), options);
        }
        resolved
    }

    /// Empties the cache.
    pub async fn clear_cache(&self) -> AppResult<()> {
        match &self.cache {
            Some(cache) => cache.clear().await,
            None => Ok(()),
        }
    }
}
