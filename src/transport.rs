//! HTTP transport
//!
//! One request in, one response out. No retries and no interpretation of the
//! body; status handling lives in the client.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Sent on every request
pub const USER_AGENT: &str = concat!("prior-rust/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A request relative to the service base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            bearer: None,
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn with_bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

/// Raw status and body of a completed round trip
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a usable response. Safe to retry.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid service URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("cannot reach {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("unreadable response from server: {0}")]
    Decode(String),
}

/// Performs a single HTTP round trip
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// reqwest blocking transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, TransportError> {
        let parsed = Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl {
                url: base_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Http {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| classify(&url, e))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| TransportError::Decode(e.to_string()))?;

        debug!(method = %request.method, path = %request.path, status, "prior api call");
        Ok(ApiResponse { status, body })
    }
}

fn classify(url: &str, err: reqwest::Error) -> TransportError {
    let url = url.to_string();
    if err.is_timeout() {
        TransportError::Timeout { url }
    } else if err.is_connect() {
        TransportError::Connect {
            url,
            reason: err.to_string(),
        }
    } else {
        TransportError::Http {
            url,
            reason: err.to_string(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = HttpTransport::new("ftp://share.cg3.io", 5).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));

        let err = HttpTransport::new("not a url", 5).unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }

    #[test]
    fn test_trims_trailing_slash() {
        let transport = HttpTransport::new("https://custom.example/", 5).unwrap();
        assert_eq!(transport.base_url(), "https://custom.example");
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) is closed on any sane test host.
        let transport = HttpTransport::new("http://127.0.0.1:9", 2).unwrap();
        let err = transport.send(&ApiRequest::get("/v1/agents/me")).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connect { .. } | TransportError::Timeout { .. } | TransportError::Http { .. }
        ));
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::post("/v1/knowledge/search", serde_json::json!({"query": "q"}))
            .with_bearer("ask_1");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.bearer.as_deref(), Some("ask_1"));
        assert_eq!(req.body.unwrap()["query"], "q");
    }
}
