use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::constants::STATIC_DIR;
use crate::gallery::Gallery;
use crate::logging::request_logger;
use crate::routes::api_router;
use crate::VERSION;

#[derive(Clone)]
pub struct AppState {
    pub gallery: Arc<Gallery>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: VERSION.to_string(),
    })
}

pub fn create_app(config: &Config, gallery: Arc<Gallery>) -> Router {
    let state = AppState { gallery };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(middleware::from_fn(request_logger))
        .layer(cors)
        .with_state(state);

    with_static_fallback(app, STATIC_DIR.clone())
}

/// Serves the built frontend for non-API paths when `static_dir` exists,
/// falling back to `index.html` for client-side routes.
fn with_static_fallback(app: Router, static_dir: PathBuf) -> Router {
    if !static_dir.is_dir() {
        return app;
    }

    app.fallback(move |req: Request<Body>| {
        let static_dir = static_dir.clone();
        async move {
            let path = req.uri().path().trim_start_matches('/').to_string();

            if path == "api" || path.starts_with("api/") || !is_safe_relative(&path) {
                return (StatusCode::NOT_FOUND, "Not Found").into_response();
            }

            let file_path = static_dir.join(&path);
            if !path.is_empty() && file_path.is_file() {
                return serve_static_file(file_path).await;
            }

            let index_path = static_dir.join("index.html");
            if index_path.is_file() {
                return serve_static_file(index_path).await;
            }

            (StatusCode::NOT_FOUND, "Not Found").into_response()
        }
    })
}

fn is_safe_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
}

async fn serve_static_file(path: PathBuf) -> Response {
    match tokio::fs::read(&path).await {
        Ok(contents) => {
            let mime_type = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime_type)],
                Body::from(contents),
            )
                .into_response()
        }
        Err(_) => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
