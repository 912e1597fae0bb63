use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ACCEPTED_IMAGE_TYPES, ACCEPTED_VIDEO_TYPES, MAX_IMAGE_SIZE, MAX_VIDEO_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Video,
}

impl ResourceType {
    pub const ALL: [ResourceType; 2] = [ResourceType::Image, ResourceType::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }

    /// Classifies a declared content type, returning `None` for anything
    /// outside the accepted image and video sets.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if ACCEPTED_IMAGE_TYPES.contains(&content_type.as_str()) {
            Some(ResourceType::Image)
        } else if ACCEPTED_VIDEO_TYPES.contains(&content_type.as_str()) {
            Some(ResourceType::Video)
        } else {
            None
        }
    }

    pub fn max_size(&self) -> usize {
        match self {
            ResourceType::Image => MAX_IMAGE_SIZE,
            ResourceType::Video => MAX_VIDEO_SIZE,
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uploader {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    pub url: String,
    pub thumbnail: String,
    pub preview: String,
    pub created_time: String,
    pub uploader: Uploader,
    pub resource_type: ResourceType,
    pub format: String,
}

/// A file received from the client, already read into memory.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadMetadata {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<MediaItem>,
}

#[derive(Debug, Serialize)]
pub struct FileCountResponse {
    pub total: usize,
}
