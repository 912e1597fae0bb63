use axum::{
    body::Body,
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Largest JSON body the request logger will buffer for its payload column
const MAX_LOGGED_BODY: usize = 64 * 1024;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gallery_api=info,tower_http=warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

pub async fn request_logger(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let is_static = !path.starts_with("/api/") && path != "/health";
    let payload = extract_json_payload(&mut request).await;

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if is_static {
        return response;
    }

    let duration_ms = duration.as_secs_f64() * 1000.0;
    let log_line = format!(
        "{} {} {} {:05.2}ms {}",
        method,
        path,
        status.as_u16(),
        duration_ms,
        payload.unwrap_or_else(|| "{}".to_string())
    );

    match status.as_u16() {
        200..=299 => info!("{}", log_line),
        400..=499 => warn!("{}", log_line),
        500..=599 => error!("{}", log_line),
        _ => info!("{}", log_line),
    }

    response
}

fn is_json(request: &Request<Body>) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}

fn declared_length(request: &Request<Body>) -> Option<usize> {
    request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Compacted JSON body of a POST. Multipart uploads, bodies without a
/// `Content-Length` and bodies over [`MAX_LOGGED_BODY`] are left untouched.
async fn extract_json_payload(request: &mut Request<Body>) -> Option<String> {
    if request.method() != Method::POST || !is_json(request) {
        return None;
    }
    match declared_length(request) {
        Some(length) if length <= MAX_LOGGED_BODY => {}
        _ => return None,
    }

    let body = std::mem::replace(request.body_mut(), Body::empty());
    let bytes = match axum::body::to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(_) => return None,
    };

    let compact = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(value) => value.to_string(),
        Err(_) => String::from_utf8_lossy(&bytes).trim().to_string(),
    };

    *request.body_mut() = Body::from(bytes);

    Some(compact)
}

pub fn log_panic(info: &std::panic::PanicHookInfo) {
    let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic payload".to_string()
    };

    let location = if let Some(loc) = info.location() {
        format!("{}:{}:{}", loc.file(), loc.line(), loc.column())
    } else {
        "unknown location".to_string()
    };

    error!("PANIC at {}: {}", location, payload);
}

pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_payload_is_compacted_and_restored() {
        let mut request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, "11")
            .body(Body::from("{ \"a\" : 1 }"))
            .unwrap();

        let payload = extract_json_payload(&mut request).await;
        assert_eq!(payload.as_deref(), Some("{\"a\":1}"));

        let restored = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&restored[..], b"{ \"a\" : 1 }");
    }

    #[tokio::test]
    async fn test_oversized_json_body_reaches_handler_intact() {
        let large = format!("{{\"data\":\"{}\"}}", "x".repeat(MAX_LOGGED_BODY + 1));
        let mut request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/files")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, large.len().to_string())
            .body(Body::from(large.clone()))
            .unwrap();

        assert!(extract_json_payload(&mut request).await.is_none());
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body.len(), large.len());
    }

    #[tokio::test]
    async fn test_logger_passes_large_json_through() {
        use axum::{routing::post, Router};
        use axum_test::TestServer;

        async fn echo_len(body: axum::body::Bytes) -> String {
            body.len().to_string()
        }

        let app = Router::new()
            .route("/api/echo", post(echo_len))
            .layer(axum::middleware::from_fn(request_logger));
        let server = TestServer::new(app).unwrap();

        let payload = serde_json::json!({ "data": "y".repeat(70 * 1024) });
        let sent = payload.to_string().len();
        let response = server.post("/api/echo").json(&payload).await;
        response.assert_status_ok();
        assert_eq!(response.text(), sent.to_string());
    }

    #[tokio::test]
    async fn test_multipart_body_is_not_captured() {
        let mut request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
            .body(Body::from("--x--"))
            .unwrap();

        assert!(extract_json_payload(&mut request).await.is_none());
        let body = axum::body::to_bytes(request.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"--x--");
    }
}
