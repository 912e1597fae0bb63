//! Remote media store adapter.

pub mod cloudinary;
pub mod errors;
pub mod types;

use async_trait::async_trait;

pub use cloudinary::CloudinaryClient;
pub use errors::MediaStoreError;
pub use types::*;

/// Operations the gallery needs from the remote media store.
///
/// Implementations do not retry on behalf of the caller unless explicitly
/// configured to, and never roll back earlier uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload one file and return the store's canonical record for it.
    async fn upload(
        &self,
        data: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<RawRecord, MediaStoreError>;

    /// Fetch one page of assets in a folder, newest first.
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, MediaStoreError>;
}
