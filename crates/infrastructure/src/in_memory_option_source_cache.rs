use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use formweave_application::OptionSourceCache;
use formweave_core::AppResult;
use formweave_domain::SelectOption;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct OptionCacheEntry {
    options: Vec<SelectOption>,
    expires_at: Instant,
}

/// Process-local option list cache with per-entry expiry.
#[derive(Default)]
pub struct InMemoryOptionSourceCache {
    entries: RwLock<HashMap<String, OptionCacheEntry>>,
}

impl InMemoryOptionSourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionSourceCache for InMemoryOptionSourceCache {
    async fn get_options(&self, signature: &str) -> AppResult<Option<Vec<SelectOption>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(signature) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.options.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(signature)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(signature);
        }

        Ok(None)
    }

    async fn set_options(
        &self,
        signature: &str,
        options: Vec<SelectOption>,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            signature.to_owned(),
            OptionCacheEntry {
                options,
                expires_at,
            },
        );

        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
