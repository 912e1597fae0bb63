//! Full-catalog aggregation across resource types.

use std::sync::Arc;
use tracing::{info, warn};

use super::normalize::{normalize, sort_newest_first};
use crate::constants::{MAX_SEARCH_PAGES, SEARCH_PAGE_SIZE};
use crate::models::{MediaItem, ResourceType};
use crate::store::{MediaStore, MediaStoreError, SearchQuery};

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub folder: String,
    pub page_size: u32,
    /// Per resource type; reaching it stops paging without failing
    pub max_pages: u32,
}

impl AggregateOptions {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            page_size: SEARCH_PAGE_SIZE,
            max_pages: MAX_SEARCH_PAGES,
        }
    }
}

pub struct Aggregator {
    store: Arc<dyn MediaStore>,
    options: AggregateOptions,
}

impl Aggregator {
    pub fn new(store: Arc<dyn MediaStore>, options: AggregateOptions) -> Self {
        Self { store, options }
    }

    /// Pages through every resource type and returns the merged catalog,
    /// newest first. Any failed page fails the whole aggregation.
    pub async fn fetch_all(&self) -> Result<Vec<MediaItem>, MediaStoreError> {
        let mut items = Vec::new();
        let mut pages_fetched = Vec::with_capacity(ResourceType::ALL.len());
        let mut truncated = false;

        for resource_type in ResourceType::ALL {
            let (pages, hit_ceiling) = self.fetch_resource_type(resource_type, &mut items).await?;
            pages_fetched.push(format!("{}={}", resource_type, pages));
            truncated |= hit_ceiling;
        }

        // Each search is only ordered within its own resource type.
        sort_newest_first(&mut items);

        info!(
            total = items.len(),
            pages = %pages_fetched.join(","),
            truncated,
            folder = %self.options.folder,
            "Fetched full media catalog from store"
        );

        Ok(items)
    }

    async fn fetch_resource_type(
        &self,
        resource_type: ResourceType,
        items: &mut Vec<MediaItem>,
    ) -> Result<(u32, bool), MediaStoreError> {
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            let query = SearchQuery {
                folder: self.options.folder.clone(),
                resource_type,
                cursor: cursor.take(),
                page_size: self.options.page_size,
            };
            let page = self.store.search(&query).await?;
            pages += 1;

            items.extend(page.records.iter().map(|record| normalize(record, None)));

            let Some(next) = page.next_cursor() else {
                break;
            };

            if pages >= self.options.max_pages {
                warn!(
                    resource_type = %resource_type,
                    max_pages = self.options.max_pages,
                    "Page limit reached, remaining results skipped"
                );
                return Ok((pages, true));
            }

            cursor = Some(next.to_string());
        }

        Ok((pages, false))
    }
}
