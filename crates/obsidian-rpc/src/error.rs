//! RPC error types.

use thiserror::Error;

/// JSON-RPC 2.0 standard error codes.
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    /// The node reports every handler failure under this code.
    pub const INTERNAL_ERROR: i64 = -32603;
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid endpoint \"{0}\"")]
    InvalidEndpoint(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{method} to {url} timed out")]
    Timeout { method: String, url: String },

    #[error("cannot connect to {url} ({method}): {source}")]
    Connection {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error calling {method} on {url}: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} on {url} returned HTTP {status}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("authentication failed for {url}")]
    AuthFailed { url: String },

    #[error("RPC error {code} from {method}: {message}")]
    Rpc {
        code: i64,
        message: String,
        method: String,
    },

    #[error("no result in response to {context}")]
    NoResult { context: String },

    #[error("unexpected response to {method}: {detail}")]
    UnexpectedResponse { method: String, detail: String },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RpcError {
    /// Classify a transport-level failure from reqwest.
    pub(crate) fn transport(method: &str, url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            RpcError::Timeout {
                method: method.to_string(),
                url: url.to_string(),
            }
        } else if source.is_connect() {
            RpcError::Connection {
                method: method.to_string(),
                url: url.to_string(),
                source,
            }
        } else {
            RpcError::Http {
                method: method.to_string(),
                url: url.to_string(),
                source,
            }
        }
    }

    /// Whether a retry might succeed: timeouts, refused connections, and 5xx.
    ///
    /// JSON-RPC error objects are the node's verdict and never transient.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Timeout { .. } | RpcError::Connection { .. } => true,
            RpcError::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout { .. })
    }

    /// Whether the node answered with a JSON-RPC error object.
    pub fn is_rejection(&self) -> bool {
        matches!(self, RpcError::Rpc { .. })
    }

    /// Whether the node refused a query because it has never seen the address.
    pub fn is_unknown_address(&self) -> bool {
        match self {
            RpcError::Rpc { message, .. } => {
                let m = message.to_ascii_lowercase();
                m.contains("address not found")
                    || m.contains("unknown address")
                    || m.contains("no such address")
                    || m.contains("not in wallet")
            }
            _ => false,
        }
    }
}
