//! Raw store records to client-facing [`MediaItem`]s.

use std::cmp::Reverse;

use crate::constants::{VIDEO_PREVIEW_TRANSFORMATION, VIDEO_THUMBNAIL_TRANSFORMATION};
use crate::models::{MediaItem, ResourceType, Uploader};
use crate::store::RawRecord;
use crate::utils::datetime::parse_datetime;

const UPLOAD_SEGMENT: &str = "/upload/";

/// Inserts a transformation right after the first `/upload/` segment of a
/// delivery URL. URLs without that segment are returned unchanged.
pub fn with_transformation(url: &str, transformation: &str) -> String {
    url.replacen(
        UPLOAD_SEGMENT,
        &format!("{}{}/", UPLOAD_SEGMENT, transformation),
        1,
    )
}

/// `(thumbnail, preview)` for an asset.
pub fn presentation_urls(url: &str, resource_type: ResourceType) -> (String, String) {
    match resource_type {
        ResourceType::Image => (url.to_string(), url.to_string()),
        ResourceType::Video => (
            with_transformation(url, VIDEO_THUMBNAIL_TRANSFORMATION),
            with_transformation(url, VIDEO_PREVIEW_TRANSFORMATION),
        ),
    }
}

pub fn display_name(public_id: &str, format: &str) -> String {
    let base = public_id.rsplit('/').next().unwrap_or(public_id);
    format!("{}.{}", base, format)
}

/// Builds the normalized item. When `uploader` is `None` it is recovered
/// from the context stored on the asset.
pub fn normalize(record: &RawRecord, uploader: Option<Uploader>) -> MediaItem {
    let (thumbnail, preview) = presentation_urls(&record.secure_url, record.resource_type);

    MediaItem {
        id: record.public_id.clone(),
        name: display_name(&record.public_id, &record.format),
        url: record.secure_url.clone(),
        thumbnail,
        preview,
        created_time: record.created_at.clone(),
        uploader: uploader.unwrap_or_else(|| record.uploader()),
        resource_type: record.resource_type,
        format: record.format.clone(),
    }
}

/// Newest first by `created_time`. Stable, and unparseable timestamps sort
/// after every parseable one.
pub fn sort_newest_first(items: &mut [MediaItem]) {
    items.sort_by_cached_key(|item| Reverse(parse_datetime(&item.created_time)));
}
