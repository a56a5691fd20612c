//! HTTP transport abstraction.
//!
//! This module provides a pluggable transport layer that abstracts the
//! underlying HTTP mechanism (reqwest for production, mock for testing).
//!
//! # Design
//!
//! The transport is dumb on purpose: it performs exactly one HTTP exchange
//! per call and reports any HTTP status as a success. Mapping statuses to
//! the error taxonomy, attaching credentials, and retrying are the
//! client's job - the transport only distinguishes "got a response" from
//! "the network failed", so the 401-refresh pipeline can see raw statuses.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_json(200, serde_json::json!({"ok": true}));
//! let response = transport.execute(request).await?;
//! ```

mod mock;
mod reqwest_transport;

pub use mock::{MockTransport, RecordedRequest};
pub use reqwest_transport::ReqwestTransport;

use async_trait::async_trait;
use ledger_types::ApiError;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Transport errors: the network failed and no response was received.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// Host name resolution failed.
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    /// The server actively refused the connection.
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    /// Catch-all connectivity failure.
    #[error("network error: {0}")]
    Network(String),

    /// The request could not be constructed (caller/library misuse).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ApiError::Timeout,
            TransportError::Dns(msg) => ApiError::DnsFailure(msg),
            TransportError::ConnectionRefused(msg) => ApiError::ConnectionRefused(msg),
            TransportError::Network(msg) => ApiError::Network(msg),
            TransportError::InvalidRequest(msg) => ApiError::Configuration(msg),
        }
    }
}

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{}", s)
    }
}

/// One outbound HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL (base URL already resolved by the client).
    pub url: String,
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<serde_json::Value>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Create a request with no query, headers, or body.
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A received HTTP response. Any status counts as "received".
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response from a status and JSON value (test helper).
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub struct MultipartPart {
    /// Field name.
    pub name: String,
    /// File name, for file parts.
    pub filename: Option<String>,
    /// MIME type, when known.
    pub mime: Option<String>,
    /// Raw part data.
    pub data: Vec<u8>,
}

/// A multipart form body, transport-agnostic.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// The parts, in order.
    pub parts: Vec<MultipartPart>,
}

impl MultipartForm {
    /// Create an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(MultipartPart {
            name: name.to_string(),
            filename: None,
            mime: None,
            data: value.as_bytes().to_vec(),
        });
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, mime: &str, data: Vec<u8>) -> Self {
        self.parts.push(MultipartPart {
            name: name.to_string(),
            filename: Some(filename.to_string()),
            mime: Some(mime.to_string()),
            data,
        });
        self
    }

    /// Total payload bytes across all parts (excluding boundaries).
    pub fn payload_len(&self) -> usize {
        self.parts.iter().map(|p| p.data.len()).sum()
    }
}

/// Callback receiving fractional upload progress, 0-100.
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

/// Trait for performing HTTP exchanges.
///
/// Implementations handle the underlying mechanism (reqwest, mock). Both
/// methods resolve with a response for *any* HTTP status; errors mean the
/// network itself failed.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform an ordinary request.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Perform a multipart upload, reporting progress when supported.
    async fn execute_multipart(
        &self,
        request: HttpRequest,
        form: MultipartForm,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, TransportError>;
}
