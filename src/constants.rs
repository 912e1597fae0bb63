use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("GALLERY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.yaml"))
});

pub static STATIC_DIR: Lazy<PathBuf> = Lazy::new(|| {
    std::env::var("GALLERY_STATIC_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("dist"))
});

pub const MAX_FILES_PER_UPLOAD: usize = 10;
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_VIDEO_SIZE: usize = 100 * 1024 * 1024;

/// Largest request body a valid batch can produce, plus headroom for the
/// multipart framing and text fields.
pub const MAX_UPLOAD_BODY_SIZE: usize = MAX_FILES_PER_UPLOAD * MAX_VIDEO_SIZE + 1024 * 1024;

pub const ACCEPTED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];
pub const ACCEPTED_VIDEO_TYPES: [&str; 4] =
    ["video/mp4", "video/quicktime", "video/x-msvideo", "video/webm"];

pub const DEFAULT_FILE_PREFIX: &str = "photo";
pub const PUBLIC_ID_SUFFIX_LEN: usize = 6;

pub const SEARCH_PAGE_SIZE: u32 = 500;
pub const MAX_SEARCH_PAGES: u32 = 100;

pub const CACHE_KEY_PREFIX: &str = "gallery:files";
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
pub const DEFAULT_MEMORY_CACHE_CAPACITY: u64 = 64;

pub const VIDEO_THUMBNAIL_TRANSFORMATION: &str = "f_jpg,so_2";
pub const VIDEO_PREVIEW_TRANSFORMATION: &str = "w_400,q_auto:low,so_0,eo_6";

pub const CONTEXT_NAME_KEY: &str = "custom_name";
pub const CONTEXT_MESSAGE_KEY: &str = "custom_message";

pub const RETRY_BACKOFF: [Duration; 3] = [
    Duration::from_millis(500),
    Duration::from_millis(1000),
    Duration::from_millis(2000),
];
