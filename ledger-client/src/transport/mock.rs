//! Mock transport for testing.
//!
//! Allows scripting responses and capturing issued requests for
//! verification. Responses come from a handler closure when one is set
//! (so concurrent tests can answer by URL and headers), otherwise from a
//! FIFO queue.

use super::{
    HttpRequest, HttpResponse, HttpTransport, MultipartForm, ProgressCallback, TransportError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler =
    Arc<dyn Fn(&HttpRequest, Option<&MultipartForm>) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// A request the mock transport received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// The request as issued by the client.
    pub request: HttpRequest,
    /// The multipart form, for upload calls.
    pub form: Option<MultipartForm>,
}

#[derive(Default)]
struct MockTransportInner {
    handler: Option<Handler>,
    queue: VecDeque<Result<HttpResponse, TransportError>>,
    requests: Vec<RecordedRequest>,
    latency: Duration,
}

/// Mock transport for testing.
///
/// Clones share state, so tests can hand the transport to a client and
/// keep a handle for scripting and inspection.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    /// Create a new mock transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request through the given closure.
    ///
    /// Takes precedence over the FIFO queue. The closure sees the full
    /// request (URL, headers, body) and the multipart form for uploads.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&HttpRequest, Option<&MultipartForm>) -> Result<HttpResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        self.inner.lock().unwrap().handler = Some(Arc::new(handler));
    }

    /// Queue a response to be returned by the next unscripted call.
    pub fn queue_response(&self, result: Result<HttpResponse, TransportError>) {
        self.inner.lock().unwrap().queue.push_back(result);
    }

    /// Queue a JSON response with the given status.
    pub fn queue_json(&self, status: u16, body: serde_json::Value) {
        self.queue_response(Ok(HttpResponse::json_body(status, &body)));
    }

    /// Queue a transport-level failure.
    pub fn queue_error(&self, error: TransportError) {
        self.queue_response(Err(error));
    }

    /// Simulate network latency: every call sleeps this long before
    /// resolving. Under tokio's paused test clock this makes concurrent
    /// requests line up deterministically.
    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().unwrap().latency = latency;
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// Number of requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.request.url.contains(fragment))
            .count()
    }

    /// Clear all state (handler, queue, recorded requests).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }

    fn dispatch(
        &self,
        request: HttpRequest,
        form: Option<MultipartForm>,
    ) -> (Result<HttpResponse, TransportError>, Duration) {
        let mut inner = self.inner.lock().unwrap();
        let result = if let Some(handler) = inner.handler.clone() {
            handler(&request, form.as_ref())
        } else {
            inner
                .queue
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        };
        inner.requests.push(RecordedRequest { request, form });
        (result, inner.latency)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (result, latency) = self.dispatch(request, None);
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn execute_multipart(
        &self,
        request: HttpRequest,
        form: MultipartForm,
        progress: Option<ProgressCallback>,
    ) -> Result<HttpResponse, TransportError> {
        let (result, latency) = self.dispatch(request, Some(form));
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }
        if let (Ok(resp), Some(cb)) = (&result, progress) {
            if resp.is_success() {
                cb(100);
            }
        }
        result
    }
}
