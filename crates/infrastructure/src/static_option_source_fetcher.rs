use std::collections::HashMap;

use async_trait::async_trait;
use formweave_application::OptionSourceFetcher;
use formweave_core::{AppError, AppResult};
use formweave_domain::OptionSource;
use serde_json::{Map, Value};
use tracing::debug;

/// Fetcher serving pre-registered row payloads keyed by source URL.
#[derive(Debug, Clone, Default)]
pub struct StaticOptionSourceFetcher {
    rows_by_url: HashMap<String, Value>,
}

impl StaticOptionSourceFetcher {
    /// Creates a fetcher with no registered sources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the rows returned for one URL.
    #[must_use]
    pub fn with_rows(mut self, url: impl Into<String>, rows: Value) -> Self {
        self.rows_by_url.insert(url.into(), rows);
        self
    }

    /// Builds a fetcher from a `{ url: rows }` JSON object.
    pub fn from_json(payload: &str) -> AppResult<Self> {
        let rows_by_url: Map<String, Value> = serde_json::from_str(payload)?;
        Ok(Self {
            rows_by_url: rows_by_url.into_iter().collect(),
        })
    }
}

#[async_trait]
impl OptionSourceFetcher for StaticOptionSourceFetcher {
    async fn fetch_rows(&self, source: &OptionSource) -> AppResult<Value> {
        let url = source.url().as_str();
        debug!(url, method = ?source.method(), "serving static option rows");

        self.rows_by_url
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no option rows registered for '{url}'")))
    }
}
