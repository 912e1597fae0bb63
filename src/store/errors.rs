//! Remote media store error types.
//!
//! HTTP statuses are mapped to variants so callers can decide on retries
//! without string matching.

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("Media store credentials rejected: {0}")]
    Unauthorized(String),

    #[error("Media store rate limit or quota exceeded")]
    RateLimited,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Server error ({0}): {1}")]
    Server(u16, String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl MediaStoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaStoreError::RateLimited
                | MediaStoreError::Timeout
                | MediaStoreError::Network(_)
                | MediaStoreError::Server(_, _)
        )
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => MediaStoreError::Unauthorized(body.to_string()),
            404 => MediaStoreError::NotFound(body.to_string()),
            408 => MediaStoreError::Timeout,
            420 | 429 => MediaStoreError::RateLimited,
            500..=599 => MediaStoreError::Server(status, body.to_string()),
            _ => MediaStoreError::Request(format!("HTTP {}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for MediaStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MediaStoreError::Timeout
        } else if err.is_decode() {
            MediaStoreError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            MediaStoreError::from_status(status.as_u16(), &err.to_string())
        } else {
            MediaStoreError::Network(err.to_string())
        }
    }
}
