//! Gallery core: upload pipeline, catalog aggregation and the cache-aside
//! view that ties them together.

pub mod aggregate;
pub mod cache_aside;
pub mod normalize;
pub mod upload;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::cache::CacheClient;
use crate::config::Config;
use crate::constants::{MAX_SEARCH_PAGES, SEARCH_PAGE_SIZE};
use crate::error::AppResult;
use crate::models::{IncomingFile, MediaItem, UploadMetadata};
use crate::store::MediaStore;

pub use aggregate::{AggregateOptions, Aggregator};
pub use cache_aside::CacheAside;
pub use upload::UploadPipeline;
pub use validation::ValidationError;

#[derive(Debug, Clone)]
pub struct GallerySettings {
    pub folder: String,
    pub file_prefix: String,
    pub cache_ttl: Duration,
    pub page_size: u32,
    pub max_pages: u32,
}

impl GallerySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            folder: config.media_store.folder.clone(),
            file_prefix: config.media_store.file_prefix.clone(),
            cache_ttl: config.cache.ttl(),
            page_size: SEARCH_PAGE_SIZE,
            max_pages: MAX_SEARCH_PAGES,
        }
    }
}

pub struct Gallery {
    pipeline: UploadPipeline,
    cache_aside: CacheAside,
}

impl Gallery {
    pub fn new(store: Arc<dyn MediaStore>, cache: CacheClient, settings: GallerySettings) -> Self {
        let aggregator = Aggregator::new(
            Arc::clone(&store),
            AggregateOptions {
                folder: settings.folder.clone(),
                page_size: settings.page_size,
                max_pages: settings.max_pages,
            },
        );

        Self {
            pipeline: UploadPipeline::new(store, settings.folder, settings.file_prefix),
            cache_aside: CacheAside::new(cache, aggregator, settings.cache_ttl),
        }
    }

    /// Uploads a validated batch and folds it into the cached view.
    ///
    /// A store failure part-way through leaves the earlier files in the
    /// store with no rollback; the cached view is dropped so they show up
    /// on the next listing.
    pub async fn upload(
        &self,
        files: Vec<IncomingFile>,
        metadata: UploadMetadata,
    ) -> AppResult<Vec<MediaItem>> {
        let outcome = self.pipeline.upload(files, &metadata).await?;

        if let Some(e) = outcome.error {
            if !outcome.uploaded.is_empty() {
                warn!(
                    orphaned = outcome.uploaded.len(),
                    "Batch aborted after partial upload, invalidating cached media list"
                );
                self.cache_aside.invalidate_aggregate().await;
            }
            return Err(e.into());
        }

        self.cache_aside.merge(&outcome.uploaded).await;
        Ok(outcome.uploaded)
    }

    pub async fn list_all(&self) -> AppResult<Vec<MediaItem>> {
        Ok(self.cache_aside.read().await?)
    }

    pub async fn total_count(&self) -> AppResult<usize> {
        Ok(self.cache_aside.count().await?)
    }
}
