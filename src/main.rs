use gallery_api::app::create_app;
use gallery_api::cache::CacheClient;
use gallery_api::config::{apply_env_overrides, load_config, save_default_config};
use gallery_api::constants::CONFIG_PATH;
use gallery_api::gallery::{Gallery, GallerySettings};
use gallery_api::logging::{init_logging, install_panic_hook};
use gallery_api::store::CloudinaryClient;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--init-config") {
        match save_default_config(&CONFIG_PATH) {
            Ok(_) => {
                println!("Default configuration saved to {:?}", *CONFIG_PATH);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to save default configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Missing .env is fine; the process environment may already be set
    dotenvy::dotenv().ok();

    init_logging();
    install_panic_hook();

    let mut config = load_config(&CONFIG_PATH);
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    if !config.media_store.has_credentials() {
        warn!("Media store credentials are not configured, uploads and listings will fail");
    }
    if config.media_store.folder.trim().is_empty() {
        warn!("Media store folder is not configured, listings will cover the whole account");
    }

    let store = match CloudinaryClient::new(&config.media_store) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create media store client: {}", e);
            std::process::exit(1);
        }
    };
    let cache = CacheClient::from_config(&config.cache);
    let gallery = Arc::new(Gallery::new(
        store,
        cache,
        GallerySettings::from_config(&config),
    ));

    let app = create_app(&config, gallery);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("Starting gallery API on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }
}
