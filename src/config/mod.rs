use crate::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_FILE_PREFIX, DEFAULT_MEMORY_CACHE_CAPACITY,
    MAX_UPLOAD_BODY_SIZE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request body ceiling for uploads, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    MAX_UPLOAD_BODY_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaStoreConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Folder every upload lands in and every listing is scoped to
    #[serde(default)]
    pub folder: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Bounded retries for listing requests; 0 disables retrying
    #[serde(default)]
    pub max_retries: u32,
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

fn default_api_base_url() -> String {
    "https://api.cloudinary.com/v1_1".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

impl MediaStoreConfig {
    pub fn has_credentials(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl Default for MediaStoreConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: String::new(),
            file_prefix: default_file_prefix(),
            api_base_url: default_api_base_url(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cache_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Use an in-process cache when no remote cache is configured
    #[serde(default)]
    pub in_memory: bool,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: u64,
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_CACHE_TTL_SECONDS
}

fn default_cache_timeout_seconds() -> u64 {
    5
}

fn default_memory_capacity() -> u64 {
    DEFAULT_MEMORY_CACHE_CAPACITY
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            ttl_seconds: default_ttl_seconds(),
            timeout_seconds: default_cache_timeout_seconds(),
            in_memory: false,
            memory_capacity: default_memory_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub media_store: MediaStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

pub fn load_config(config_path: &Path) -> Config {
    if !config_path.exists() {
        return Config::default();
    }

    match fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

/// Overlays deployment environment variables on a loaded config.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(port) = var("PORT").and_then(|p| p.trim().parse().ok()) {
        config.server.port = port;
    }
    if let Some(value) = var("CLOUDINARY_CLOUD_NAME") {
        config.media_store.cloud_name = value;
    }
    if let Some(value) = var("CLOUDINARY_API_KEY") {
        config.media_store.api_key = value;
    }
    if let Some(value) = var("CLOUDINARY_API_SECRET") {
        config.media_store.api_secret = value;
    }
    if let Some(value) = var("CLOUDINARY_UPLOAD_FOLDER") {
        config.media_store.folder = value;
    }
    if let Some(value) = var("CLOUDINARY_FILE_PREFIX") {
        config.media_store.file_prefix = value;
    }
    if let Some(value) = var("UPSTASH_REDIS_REST_URL") {
        config.cache.url = Some(value);
    }
    if let Some(value) = var("UPSTASH_REDIS_REST_TOKEN") {
        config.cache.token = Some(value);
    }
}

pub fn save_default_config(config_path: &Path) -> std::io::Result<()> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).map_err(|e| std::io::Error::other(e.to_string()))?;
    fs::write(config_path, yaml)
}
