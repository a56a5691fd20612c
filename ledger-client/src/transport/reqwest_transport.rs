//! Production transport backed by reqwest.

use super::{
    HttpRequest, HttpResponse, HttpTransport, Method, MultipartForm, ProgressCallback,
    TransportError,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Upload bodies are streamed in chunks this large so progress callbacks
/// fire while bytes are still in flight.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// HTTP transport backed by a shared [`reqwest::Client`].
///
/// Timeouts are per-request (the client carries no default), so ordinary
/// calls and long multipart uploads can use different bounds.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build the transport. Fails only on TLS backend initialization.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }

    fn builder(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .timeout(request.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    async fn finish(
        builder: reqwest::RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(classify_reqwest_error)?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.builder(&request);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Self::finish(builder).await
    }

    async fn execute_multipart(
        &self,
        request: HttpRequest,
        form: MultipartForm,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, TransportError> {
        let total = form.payload_len().max(1) as u64;
        let sent = Arc::new(AtomicU64::new(0));

        let mut multipart = reqwest::multipart::Form::new();
        for part in form.parts {
            let len = part.data.len() as u64;
            let stream =
                progress_stream(part.data, Arc::clone(&sent), total, progress.clone());
            let mut piece = reqwest::multipart::Part::stream_with_length(
                reqwest::Body::wrap_stream(stream),
                len,
            );
            if let Some(filename) = part.filename {
                piece = piece.file_name(filename);
            }
            if let Some(mime) = part.mime {
                piece = piece
                    .mime_str(&mime)
                    .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            }
            multipart = multipart.part(part.name, piece);
        }

        let builder = self.builder(&request).multipart(multipart);
        Self::finish(builder).await
    }
}

/// Chunked stream over part data that reports cumulative progress as each
/// chunk is pulled onto the wire.
fn progress_stream(
    data: Vec<u8>,
    sent: Arc<AtomicU64>,
    total: u64,
    progress: Option<ProgressCallback>,
) -> impl futures_util::Stream<Item = Result<Vec<u8>, std::io::Error>> {
    let chunks: Vec<Vec<u8>> = data
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|c| c.to_vec())
        .collect();
    futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        let transmitted = sent.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        if let Some(cb) = &progress {
            cb(((transmitted * 100) / total).min(100) as u8);
        }
        Ok(chunk)
    }))
}

/// Map a reqwest error onto the transport taxonomy.
///
/// Exactly one variant per failure. reqwest does not expose DNS failures
/// structurally, so connect errors are told apart by their source-chain
/// text; that heuristic is confined to [`classify_connect_message`].
fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    if err.is_builder() {
        return TransportError::InvalidRequest(err.to_string());
    }
    let message = source_chain(&err);
    if err.is_connect() {
        return classify_connect_message(&message);
    }
    TransportError::Network(message)
}

/// Classify a connect-failure message into DNS / refused / generic.
fn classify_connect_message(message: &str) -> TransportError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("dns") || lower.contains("resolve") || lower.contains("name or service") {
        TransportError::Dns(message.to_string())
    } else if lower.contains("refused") {
        TransportError::ConnectionRefused(message.to_string())
    } else {
        TransportError::Network(message.to_string())
    }
}

/// Flatten an error and its sources into one message.
fn source_chain(err: &dyn std::error::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
