//! Batch upload pipeline.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

use super::normalize::normalize;
use super::validation::validate_batch;
use crate::constants::PUBLIC_ID_SUFFIX_LEN;
use crate::error::AppResult;
use crate::models::{IncomingFile, MediaItem, UploadMetadata, Uploader};
use crate::store::{MediaStore, MediaStoreError, UploadOptions};
use crate::utils::datetime::batch_stamp;

const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Result of the remote half of an upload. On failure, `uploaded` holds
/// the items that reached the store before the failing file.
pub struct BatchOutcome {
    pub uploaded: Vec<MediaItem>,
    pub error: Option<MediaStoreError>,
}

pub struct UploadPipeline {
    store: Arc<dyn MediaStore>,
    folder: String,
    file_prefix: String,
}

impl UploadPipeline {
    pub fn new(store: Arc<dyn MediaStore>, folder: String, file_prefix: String) -> Self {
        Self {
            store,
            folder,
            file_prefix,
        }
    }

    /// Validates the entire batch, then uploads file by file in input
    /// order. Validation failures never reach the store.
    pub async fn upload(
        &self,
        files: Vec<IncomingFile>,
        metadata: &UploadMetadata,
    ) -> AppResult<BatchOutcome> {
        let resource_types = validate_batch(&files, metadata)?;

        let uploader = Uploader {
            name: metadata.name.trim().to_string(),
            message: metadata.message.trim().to_string(),
        };
        let public_ids = generate_public_ids(&self.file_prefix, &Utc::now(), files.len());

        let mut uploaded = Vec::with_capacity(files.len());
        for ((file, resource_type), public_id) in
            files.into_iter().zip(resource_types).zip(public_ids)
        {
            let options = UploadOptions {
                folder: self.folder.clone(),
                resource_type,
                public_id,
                uploader: uploader.clone(),
                file_name: file.file_name,
                content_type: file.content_type,
            };

            match self.store.upload(file.data, &options).await {
                Ok(record) => uploaded.push(normalize(&record, Some(uploader.clone()))),
                Err(e) => {
                    error!(
                        file = %options.file_name,
                        already_uploaded = uploaded.len(),
                        error = %e,
                        "Upload failed, earlier files in the batch remain in the store"
                    );
                    return Ok(BatchOutcome {
                        uploaded,
                        error: Some(e),
                    });
                }
            }
        }

        info!(count = uploaded.len(), uploader = %uploader.name, "Uploaded batch");
        Ok(BatchOutcome {
            uploaded,
            error: None,
        })
    }
}

/// `{prefix}_{YYYYMMDD}_{HHMMSS}_{suffix}` for each file of a batch. The
/// stamp is shared; suffixes are distinct within the batch.
pub fn generate_public_ids(prefix: &str, now: &DateTime<Utc>, count: usize) -> Vec<String> {
    let stamp = batch_stamp(now);
    let mut rng = rand::thread_rng();
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);

    while ids.len() < count {
        let suffix: String = (0..PUBLIC_ID_SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        if seen.insert(suffix.clone()) {
            ids.push(format!("{}_{}_{}", prefix, stamp, suffix));
        }
    }

    ids
}
