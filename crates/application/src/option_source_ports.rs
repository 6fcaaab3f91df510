use async_trait::async_trait;
use formweave_core::AppResult;
use formweave_domain::{OptionSource, SelectOption};
use serde_json::Value;

/// Connector returning raw rows for an option source.
#[async_trait]
pub trait OptionSourceFetcher: Send + Sync {
    /// Fetches the raw row payload for one source.
    async fn fetch_rows(&self, source: &OptionSource) -> AppResult<Value>;
}

/// Cache port for mapped option lists keyed by request signature.
#[async_trait]
pub trait OptionSourceCache: Send + Sync {
    /// Returns fresh cached options for one signature.
    async fn get_options(&self, signature: &str) -> AppResult<Option<Vec<SelectOption>>>;

    /// Stores options for one signature with ttl.
    async fn set_options(
        &self,
        signature: &str,
        options: Vec<SelectOption>,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Drops every cached entry.
    async fn clear(&self) -> AppResult<()>;
}
