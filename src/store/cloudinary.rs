//! Cloudinary media store client
//!
//! Uploads go through the signed upload endpoint, listing goes through the
//! Search API with Basic authentication.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::MediaStoreError;
use super::types::{RawRecord, SearchPage, SearchQuery, UploadOptions};
use super::MediaStore;
use crate::config::MediaStoreConfig;
use crate::constants::RETRY_BACKOFF;
use crate::utils::hash::sha256_hex;

#[derive(Clone)]
pub struct CloudinaryClient {
    http_client: Client,
    /// `{api_base_url}/{cloud_name}`
    base_url: String,
    api_key: String,
    api_secret: String,
    /// Retries for search requests only; uploads are never repeated
    max_retries: u32,
}

impl CloudinaryClient {
    pub fn new(config: &MediaStoreConfig) -> Result<Self, MediaStoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| MediaStoreError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: format!(
                "{}/{}",
                config.api_base_url.trim_end_matches('/'),
                config.cloud_name
            ),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn sign(&self, params: &[(&str, String)]) -> String {
        sha256_hex(format!("{}{}", string_to_sign(params), self.api_secret))
    }

    async fn with_retry<F, Fut, T>(&self, operation: &str, f: F) -> Result<T, MediaStoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, MediaStoreError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = RETRY_BACKOFF[(attempt as usize).min(RETRY_BACKOFF.len() - 1)];
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        error = %e,
                        "Media store request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn search_once(&self, query: &SearchQuery) -> Result<SearchPage, MediaStoreError> {
        let mut body = json!({
            "expression": query.expression(),
            "sort_by": [{ "created_at": "desc" }],
            "with_field": ["context"],
            "max_results": query.page_size,
        });
        if let Some(cursor) = &query.cursor {
            body["next_cursor"] = Value::String(cursor.clone());
        }

        let response = self
            .http_client
            .post(self.endpoint("resources/search"))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&body)
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(
        &self,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<RawRecord, MediaStoreError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = vec![
            ("context", options.context()),
            ("folder", options.folder.clone()),
            ("overwrite", "false".to_string()),
            ("public_id", options.public_id.clone()),
            ("timestamp", timestamp),
            ("unique_filename", "false".to_string()),
        ];
        let signature = self.sign(&params);

        let file_part = Part::bytes(data)
            .file_name(options.file_name.clone())
            .mime_str(&options.content_type)
            .map_err(|e| MediaStoreError::Request(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(
            public_id = %options.public_id,
            resource_type = %options.resource_type,
            "Uploading to media store"
        );

        let response = self
            .http_client
            .post(self.endpoint(&format!("{}/upload", options.resource_type)))
            .multipart(form)
            .send()
            .await?;

        read_json(response).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, MediaStoreError> {
        self.with_retry("search", || self.search_once(query)).await
    }
}

/// Sorted `key=value&...` string covered by the upload signature. Empty
/// values are left out, as the store does when verifying.
pub fn string_to_sign(params: &[(&str, String)]) -> String {
    let mut pairs: Vec<_> = params.iter().filter(|(_, value)| !value.is_empty()).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, MediaStoreError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(MediaStoreError::from_status(
            status.as_u16(),
            &error_message(&body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| MediaStoreError::MalformedResponse(e.to_string()))
}

/// Extracts `error.message` from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
