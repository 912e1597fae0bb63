#![cfg(test)]

use crate::app::create_app;
use crate::cache::{CacheBackend, CacheClient, CacheError};
use crate::config::Config;
use crate::gallery::normalize::normalize;
use crate::gallery::{Gallery, GallerySettings};
use crate::models::{IncomingFile, MediaItem, ResourceType};
use crate::store::{
    MediaStore, MediaStoreError, RawRecord, SearchPage, SearchQuery, UploadOptions,
};
use crate::utils::datetime::parse_datetime;
use async_trait::async_trait;
use axum::Router;
use chrono::{Duration as ChronoDuration, SecondsFormat, TimeZone, Utc};
use serde_json::json;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Record as the store would return it from a search, with uploader context
pub fn raw_record(public_id: &str, resource_type: ResourceType, created_at: &str) -> RawRecord {
    let format = match resource_type {
        ResourceType::Image => "jpg",
        ResourceType::Video => "mp4",
    };

    RawRecord {
        public_id: public_id.to_string(),
        secure_url: format!(
            "https://res.example.com/demo/{}/upload/v1700000000/{}.{}",
            resource_type, public_id, format
        ),
        created_at: created_at.to_string(),
        resource_type,
        format: format.to_string(),
        context: Some(json!({
            "custom_name": "Tester",
            "custom_message": "hello"
        })),
    }
}

pub fn media_item(public_id: &str, resource_type: ResourceType, created_at: &str) -> MediaItem {
    normalize(&raw_record(public_id, resource_type, created_at), None)
}

pub fn incoming_file(file_name: &str, content_type: &str, size: usize) -> IncomingFile {
    IncomingFile {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        data: vec![0u8; size],
    }
}

pub fn test_settings() -> GallerySettings {
    GallerySettings {
        folder: "gallery".to_string(),
        file_prefix: "photo".to_string(),
        cache_ttl: Duration::from_secs(300),
        page_size: 500,
        max_pages: 100,
    }
}

/// Create a test app backed by the given fakes
pub fn create_test_app(store: Arc<FakeMediaStore>, cache: CacheClient) -> Router {
    create_test_app_with_config(store, cache, &Config::default())
}

pub fn create_test_app_with_config(
    store: Arc<FakeMediaStore>,
    cache: CacheClient,
    config: &Config,
) -> Router {
    let gallery = Arc::new(Gallery::new(store, cache, test_settings()));
    create_app(config, gallery)
}

#[derive(Default)]
struct StoreState {
    records: Vec<RawRecord>,
    search_queries: Vec<SearchQuery>,
    uploads: Vec<UploadOptions>,
    upload_calls: usize,
    fail_search_on_call: Option<usize>,
    fail_upload_on_call: Option<usize>,
    endless: Option<ResourceType>,
    uploaded_count: i64,
}

/// In-memory media store with call recording and injectable failures.
#[derive(Default)]
pub struct FakeMediaStore {
    state: Mutex<StoreState>,
}

impl FakeMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, records: Vec<RawRecord>) {
        self.state.lock().unwrap().records.extend(records);
    }

    /// Every search for `resource_type` returns a full page and a cursor.
    pub fn set_endless_pages(&self, resource_type: ResourceType) {
        self.state.lock().unwrap().endless = Some(resource_type);
    }

    /// The n-th search call (1-based, counted across all searches) fails.
    pub fn fail_search_on_call(&self, call: usize) {
        self.state.lock().unwrap().fail_search_on_call = Some(call);
    }

    /// The n-th upload call (1-based) fails.
    pub fn fail_upload_on_call(&self, call: usize) {
        let mut state = self.state.lock().unwrap();
        state.fail_upload_on_call = Some(state.upload_calls + call);
    }

    pub fn search_calls(&self) -> usize {
        self.state.lock().unwrap().search_queries.len()
    }

    pub fn search_queries(&self) -> Vec<SearchQuery> {
        self.state.lock().unwrap().search_queries.clone()
    }

    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    pub fn uploaded_options(&self) -> Vec<UploadOptions> {
        self.state.lock().unwrap().uploads.clone()
    }
}

fn in_folder(record: &RawRecord, folder: &str) -> bool {
    folder.is_empty() || record.public_id.starts_with(&format!("{}/", folder))
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(
        &self,
        _data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<RawRecord, MediaStoreError> {
        let mut state = self.state.lock().unwrap();
        state.upload_calls += 1;
        if state.fail_upload_on_call == Some(state.upload_calls) {
            return Err(MediaStoreError::Server(503, "upload unavailable".to_string()));
        }

        state.uploaded_count += 1;
        let created_at = (Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
            + ChronoDuration::seconds(state.uploaded_count))
        .to_rfc3339_opts(SecondsFormat::Secs, true);

        let public_id = if options.folder.is_empty() {
            options.public_id.clone()
        } else {
            format!("{}/{}", options.folder, options.public_id)
        };
        let format = options
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());

        let record = RawRecord {
            secure_url: format!(
                "https://res.example.com/demo/{}/upload/v1700000000/{}.{}",
                options.resource_type, public_id, format
            ),
            public_id,
            created_at,
            resource_type: options.resource_type,
            format,
            context: Some(json!({
                "custom": {
                    "custom_name": options.uploader.name,
                    "custom_message": options.uploader.message,
                }
            })),
        };

        state.records.push(record.clone());
        state.uploads.push(options.clone());
        Ok(record)
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, MediaStoreError> {
        let mut state = self.state.lock().unwrap();
        state.search_queries.push(query.clone());
        let call = state.search_queries.len();

        if state.fail_search_on_call == Some(call) {
            return Err(MediaStoreError::Server(503, "search unavailable".to_string()));
        }

        if state.endless == Some(query.resource_type) {
            let records = (0..query.page_size)
                .map(|i| {
                    raw_record(
                        &format!("{}/endless_{}_{}", query.folder, call, i),
                        query.resource_type,
                        "2024-01-01T00:00:00Z",
                    )
                })
                .collect();
            return Ok(SearchPage {
                records,
                next_cursor: Some(format!("page-{}", call)),
            });
        }

        let mut matching: Vec<RawRecord> = state
            .records
            .iter()
            .filter(|r| r.resource_type == query.resource_type && in_folder(r, &query.folder))
            .cloned()
            .collect();
        matching.sort_by_cached_key(|r| Reverse(parse_datetime(&r.created_at)));

        let start: usize = query
            .cursor
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or(0)
            .min(matching.len());
        let end = (start + query.page_size as usize).min(matching.len());
        let next_cursor = (end < matching.len()).then(|| end.to_string());

        Ok(SearchPage {
            records: matching[start..end].to_vec(),
            next_cursor,
        })
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, (String, Duration)>,
    fail_all: bool,
    fail_sets_for: HashSet<String>,
}

/// Map-backed cache backend; TTLs are recorded but never enforced.
#[derive(Default)]
pub struct FakeCacheBackend {
    state: Mutex<CacheState>,
}

impl FakeCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self, fail: bool) {
        self.state.lock().unwrap().fail_all = fail;
    }

    pub fn fail_sets_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .fail_sets_for
            .insert(key.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(key)
            .map(|(value, _)| value.clone())
    }

    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state
            .lock()
            .unwrap()
            .entries
            .get(key)
            .map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl CacheBackend for FakeCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let state = self.state.lock().unwrap();
        if state.fail_all {
            return Err(CacheError::Unreachable("connection refused".to_string()));
        }
        Ok(state.entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all || state.fail_sets_for.contains(key) {
            return Err(CacheError::Backend("write rejected".to_string()));
        }
        state.entries.insert(key.to_string(), (value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all {
            return Err(CacheError::Unreachable("connection refused".to_string()));
        }
        state.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_store_pages_by_cursor() {
        let store = FakeMediaStore::new();
        store.seed(
            (0..5)
                .map(|i| {
                    raw_record(
                        &format!("gallery/img_{}", i),
                        ResourceType::Image,
                        &format!("2024-01-0{}T00:00:00Z", i + 1),
                    )
                })
                .collect(),
        );

        let mut query = SearchQuery {
            folder: "gallery".to_string(),
            resource_type: ResourceType::Image,
            cursor: None,
            page_size: 2,
        };
        let first = store.search(&query).await.unwrap();
        assert_eq!(first.records.len(), 2);
        assert_eq!(first.records[0].public_id, "gallery/img_4");
        assert_eq!(first.next_cursor(), Some("2"));

        query.cursor = Some("4".to_string());
        let last = store.search(&query).await.unwrap();
        assert_eq!(last.records.len(), 1);
        assert!(last.next_cursor().is_none());
    }

    #[tokio::test]
    async fn test_fake_store_upload_is_searchable() {
        let store = FakeMediaStore::new();
        let options = UploadOptions {
            folder: "gallery".to_string(),
            resource_type: ResourceType::Video,
            public_id: "photo_x".to_string(),
            uploader: Default::default(),
            file_name: "clip.MOV".to_string(),
            content_type: "video/quicktime".to_string(),
        };
        let record = store.upload(vec![1, 2, 3], &options).await.unwrap();
        assert_eq!(record.public_id, "gallery/photo_x");
        assert_eq!(record.format, "mov");

        let page = store
            .search(&SearchQuery {
                folder: "gallery".to_string(),
                resource_type: ResourceType::Video,
                cursor: None,
                page_size: 10,
            })
            .await
            .unwrap();
        assert_eq!(page.records.len(), 1);
    }

    #[tokio::test]
    async fn test_fake_cache_failure_modes() {
        let cache = FakeCacheBackend::new();
        cache.fail_sets_for("locked");
        assert!(cache
            .set("locked", "v".to_string(), Duration::from_secs(1))
            .await
            .is_err());
        assert!(cache
            .set("open", "v".to_string(), Duration::from_secs(1))
            .await
            .is_ok());

        cache.fail_all(true);
        assert!(cache.get("open").await.is_err());
    }
}
