//! Upstash Redis REST backend.
//!
//! Each operation is one Redis command posted as a JSON array; the reply is
//! `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::{CacheBackend, CacheError};

#[derive(Clone)]
pub struct UpstashCache {
    http_client: Client,
    url: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl UpstashCache {
    pub fn new(url: &str, token: &str, timeout_seconds: u64) -> Result<Self, CacheError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn command(&self, command: Value) -> Result<Option<Value>, CacheError> {
        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;
        let reply = serde_json::from_str::<CommandReply>(&body);

        if !status.is_success() {
            let detail = reply
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or_else(|| body.trim().to_string());
            return Err(CacheError::Backend(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let reply = reply.map_err(|e| CacheError::Malformed(e.to_string()))?;
        if let Some(error) = reply.error {
            return Err(CacheError::Backend(error));
        }

        Ok(reply.result.filter(|v| !v.is_null()))
    }
}

pub(crate) fn get_command(key: &str) -> Value {
    json!(["GET", key])
}

pub(crate) fn set_command(key: &str, value: &str, ttl: Duration) -> Value {
    json!(["SET", key, value, "EX", ttl.as_secs().max(1).to_string()])
}

pub(crate) fn delete_command(key: &str) -> Value {
    json!(["DEL", key])
}

#[async_trait]
impl CacheBackend for UpstashCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.command(get_command(key)).await? {
            None => Ok(None),
            Some(Value::String(raw)) => Ok(Some(raw)),
            Some(other) => Err(CacheError::Malformed(format!(
                "expected string reply for GET, got {}",
                other
            ))),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.command(set_command(key, &value, ttl)).await.map(|_| ())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.command(delete_command(key)).await.map(|_| ())
    }
}
