//! Cache-aside view over the aggregated catalog.
//!
//! Two keys make up the cached view: the item list and its length. They are
//! only ever written together ([`CacheAside::write_aggregate`]) or dropped
//! together ([`CacheAside::invalidate_aggregate`]).
//!
//! There is no lock around the keys. Concurrent merges, or a merge racing a
//! rebuild, resolve as last-writer-wins; a rebuild always reflects the store
//! at the moment it ran and will overwrite a slower upload's prepend. The
//! view converges again at the next invalidation or TTL expiry.

use std::time::Duration;
use tracing::{debug, info, warn};

use super::aggregate::Aggregator;
use crate::cache::CacheClient;
use crate::constants::CACHE_KEY_PREFIX;
use crate::models::MediaItem;
use crate::store::MediaStoreError;

pub fn list_key() -> String {
    format!("{}:all", CACHE_KEY_PREFIX)
}

pub fn total_key() -> String {
    format!("{}:total", CACHE_KEY_PREFIX)
}

pub struct CacheAside {
    cache: CacheClient,
    aggregator: Aggregator,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(cache: CacheClient, aggregator: Aggregator, ttl: Duration) -> Self {
        Self {
            cache,
            aggregator,
            ttl,
        }
    }

    /// Cached list when present, otherwise a full rebuild from the store
    /// which then repopulates both keys.
    pub async fn read(&self) -> Result<Vec<MediaItem>, MediaStoreError> {
        if let Some(items) = self.cache.get::<Vec<MediaItem>>(&list_key()).await {
            debug!(count = items.len(), "Serving media list from cache");
            return Ok(items);
        }

        let items = self.aggregator.fetch_all().await?;
        self.write_aggregate(&items).await;
        Ok(items)
    }

    /// Prepends freshly uploaded items to the cached list. On a miss the
    /// view is dropped instead so the next read rebuilds it from the store.
    pub async fn merge(&self, new_items: &[MediaItem]) {
        if !self.cache.is_enabled() {
            return;
        }

        match self.cache.get::<Vec<MediaItem>>(&list_key()).await {
            Some(cached) => {
                let mut updated = Vec::with_capacity(new_items.len() + cached.len());
                updated.extend_from_slice(new_items);
                updated.extend(cached);
                if self.write_aggregate(&updated).await {
                    info!(
                        added = new_items.len(),
                        total = updated.len(),
                        "Merged uploads into cached media list"
                    );
                }
            }
            None => {
                self.invalidate_aggregate().await;
            }
        }
    }

    /// Cached total when present, otherwise the length of [`Self::read`].
    pub async fn count(&self) -> Result<usize, MediaStoreError> {
        if let Some(total) = self.cache.get::<usize>(&total_key()).await {
            return Ok(total);
        }
        Ok(self.read().await?.len())
    }

    /// Writes the list and its count with one TTL. If either write fails
    /// both keys are dropped so they never disagree.
    pub async fn write_aggregate(&self, items: &[MediaItem]) -> bool {
        if !self.cache.is_enabled() {
            return false;
        }

        let written = self.cache.set(&list_key(), items, self.ttl).await
            && self.cache.set(&total_key(), &items.len(), self.ttl).await;

        if !written {
            warn!("Failed to write cached media list, invalidating");
            self.invalidate_aggregate().await;
        }
        written
    }

    pub async fn invalidate_aggregate(&self) -> bool {
        if !self.cache.is_enabled() {
            return false;
        }

        let list_deleted = self.cache.delete(&list_key()).await;
        let total_deleted = self.cache.delete(&total_key()).await;
        debug!(list_deleted, total_deleted, "Invalidated cached media list");
        list_deleted && total_deleted
    }
}
