//! Base JSON-RPC 2.0 HTTP client.
//!
//! Every method is a POST of a JSON-RPC envelope to the endpoint root.
//! Supports Basic auth, configurable timeout, and retry with exponential
//! backoff on transient failures.

use crate::error::RpcError;
use base64::Engine;
use obsidian_types::constants::DEFAULT_RPC_ENDPOINT;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC 2.0 request envelope.
#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Turn `host:port` or a full URL into a base URL without trailing slash.
pub fn normalize_endpoint(endpoint: &str) -> Result<String, RpcError> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(RpcError::InvalidEndpoint(endpoint.to_string()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let url = reqwest::Url::parse(&with_scheme)
        .map_err(|_| RpcError::InvalidEndpoint(endpoint.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RpcError::InvalidEndpoint(endpoint.to_string()));
    }

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// Configuration for an RPC client.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Base URL (e.g., `http://localhost:8545`).
    pub url: String,
    /// Optional username for Basic auth.
    pub username: Option<String>,
    /// Optional password for Basic auth.
    pub password: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Number of retry attempts on transient failure.
    pub retries: u32,
    /// Initial delay between retries (doubles each attempt).
    pub retry_delay: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_ENDPOINT.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl RpcConfig {
    /// Default policy against a user-supplied endpoint.
    pub fn for_endpoint(endpoint: &str) -> Result<Self, RpcError> {
        Ok(Self {
            url: normalize_endpoint(endpoint)?,
            ..Default::default()
        })
    }
}

/// Async JSON-RPC client for the Obsidian node.
pub struct RpcClient {
    client: reqwest::Client,
    config: RpcConfig,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Create a new client against `host:port` or a URL.
    pub fn new(endpoint: &str) -> Result<Self, RpcError> {
        Self::with_config(RpcConfig::for_endpoint(endpoint)?)
    }

    /// Create a new client with full configuration.
    pub fn with_config(config: RpcConfig) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(RpcError::Client)?;

        Ok(Self {
            client,
            config,
            request_id: AtomicU64::new(0),
        })
    }

    /// Get the configured base URL.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn auth_header(&self) -> Option<HeaderValue> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => {
                let creds = format!("{}:{}", user, pass);
                let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
                HeaderValue::from_str(&format!("Basic {}", encoded)).ok()
            }
            _ => None,
        }
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(auth) = self.auth_header() {
            headers.insert(AUTHORIZATION, auth);
        }
        headers
    }

    /// Call a JSON-RPC 2.0 method.
    ///
    /// Transient failures are retried up to `retries` times with doubling
    /// delay; the last error is returned once attempts run out.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let url = format!("{}/", self.config.url);
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id(),
            method,
            params,
        };

        let attempts = self.config.retries + 1;
        let mut last_err = RpcError::NoResult {
            context: method.to_string(),
        };

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.retry_delay * 2u32.saturating_pow(attempt - 1);
                log::warn!(
                    "{} failed ({}), retry {}/{} in {:?}",
                    method,
                    last_err,
                    attempt,
                    attempts - 1,
                    delay
                );
                tokio::time::sleep(delay).await;
            }

            match self.do_call(&url, &req, method).await {
                Ok(val) => return Ok(val),
                Err(e) => {
                    let should_retry = e.is_transient() && attempt + 1 < attempts;
                    if !should_retry {
                        return Err(e);
                    }
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn do_call(
        &self,
        url: &str,
        req: &JsonRpcRequest<'_>,
        method: &str,
    ) -> Result<Value, RpcError> {
        let resp = self
            .client
            .post(url)
            .headers(self.build_headers())
            .json(req)
            .send()
            .await
            .map_err(|e| RpcError::transport(method, url, e))?;

        let status = resp.status().as_u16();

        if status == 401 {
            return Err(RpcError::AuthFailed {
                url: url.to_string(),
            });
        }

        // The node answers handler failures with a JSON-RPC error body; only
        // fall back to the HTTP status when no such body is present.
        let text = resp
            .text()
            .await
            .map_err(|e| RpcError::transport(method, url, e))?;

        let body: JsonRpcResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(e) if status >= 400 => {
                log::debug!("{} returned HTTP {} without JSON-RPC body: {}", method, status, e);
                return Err(RpcError::HttpStatus {
                    method: method.to_string(),
                    url: url.to_string(),
                    status,
                    body: text.chars().take(500).collect(),
                });
            }
            Err(e) => return Err(RpcError::Json(e)),
        };

        if let Some(err) = body.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
                method: method.to_string(),
            });
        }

        if status >= 400 {
            return Err(RpcError::HttpStatus {
                method: method.to_string(),
                url: url.to_string(),
                status,
                body: text.chars().take(500).collect(),
            });
        }

        body.result.ok_or(RpcError::NoResult {
            context: method.to_string(),
        })
    }
}
