//! The API client: credential attachment and the 401-refresh pipeline.
//!
//! Every outbound call walks the same pipeline:
//!
//! ```text
//! ATTACH (bearer + legacy x-user-id) → SEND → DONE
//!                                        │
//!                                        └─ 401, not yet retried, token was attached
//!                                           → single-flight refresh → replay once
//! ```
//!
//! When several concurrent requests observe a 401 from the same expired
//! token, exactly one performs the refresh call ([`RefreshGate`] issues
//! the lead); the rest wait on tickets and share its outcome. A replayed
//! request that receives a second 401 is not re-refreshed - it propagates
//! as an authentication failure.
//!
//! Cancellation is not supported: dropping a returned future abandons the
//! call (fire and forget); the per-request timeout is the only bound on a
//! call's duration.

use crate::config::ClientConfig;
use crate::token::TokenStore;
use crate::transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MultipartForm, ProgressCallback,
};
use ledger_core::{RefreshDecision, RefreshGate};
use ledger_types::{ApiError, ErrorBody, RefreshRequest, RefreshResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{oneshot, Mutex};

/// The refresh outcome shared with waiting requests: the new access
/// token, or `None` when the refresh failed.
type RefreshOutcome = Option<String>;

/// Single-flight refresh coordination: the pure gate plus one channel per
/// waiter ticket. Owned by the client instance, not a process global, so
/// independent clients never share a refresh window.
#[derive(Default)]
struct RefreshCoordinator {
    gate: RefreshGate,
    waiters: HashMap<u64, oneshot::Sender<RefreshOutcome>>,
}

enum Observed {
    Lead,
    Follow(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    fn observe(&mut self) -> Observed {
        match self.gate.observe_unauthorized() {
            RefreshDecision::Lead => Observed::Lead,
            RefreshDecision::Follow(ticket) => {
                let (tx, rx) = oneshot::channel();
                self.waiters.insert(ticket.value(), tx);
                Observed::Follow(rx)
            }
        }
    }

    fn complete(&mut self) -> Vec<oneshot::Sender<RefreshOutcome>> {
        self.gate
            .complete()
            .into_iter()
            .filter_map(|ticket| self.waiters.remove(&ticket.value()))
            .collect()
    }
}

/// The main API client.
///
/// Generic over the transport so tests run against
/// [`MockTransport`](crate::transport::MockTransport) and production runs
/// against [`ReqwestTransport`](crate::transport::ReqwestTransport).
pub struct ApiClient<T: HttpTransport> {
    pub(crate) config: ClientConfig,
    transport: T,
    tokens: TokenStore,
    refresh: Mutex<RefreshCoordinator>,
}

impl<T: HttpTransport> ApiClient<T> {
    /// Create a new client.
    pub fn new(config: ClientConfig, transport: T, tokens: TokenStore) -> Self {
        Self {
            config,
            transport,
            tokens,
            refresh: Mutex::new(RefreshCoordinator::default()),
        }
    }

    /// The resolved configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token store (only the auth pipeline writes tokens through it).
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Get a reference to the underlying transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, ApiError> {
        let mut request = self.request(Method::Get, path);
        request.query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let response = self.send_with_auth(request, None).await?;
        decode(&response)
    }

    /// POST a JSON body to `path` and decode the response.
    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let mut request = self.request(Method::Post, path);
        request.body = Some(encode(body)?);
        let response = self.send_with_auth(request, None).await?;
        decode(&response)
    }

    /// PUT a JSON body to `path` and decode the response.
    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let mut request = self.request(Method::Put, path);
        request.body = Some(encode(body)?);
        let response = self.send_with_auth(request, None).await?;
        decode(&response)
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.request(Method::Delete, path);
        self.send_with_auth(request, None).await?;
        Ok(())
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(
            method,
            format!("{}{}", self.config.base_url, path),
            self.config.request_timeout,
        )
    }

    /// Send one logical request through the auth pipeline.
    ///
    /// Replays at most once after a successful refresh; the `retried`
    /// mark guarantees a second 401 propagates instead of re-refreshing.
    pub(crate) async fn send_with_auth(
        &self,
        request: HttpRequest,
        multipart: Option<(MultipartForm, Option<ProgressCallback>)>,
    ) -> Result<HttpResponse, ApiError> {
        let mut retried = false;
        loop {
            let mut attempt = request.clone();
            let had_token = self.attach_headers(&mut attempt).await;

            tracing::debug!(method = %attempt.method, url = %attempt.url, "sending request");
            let result = match &multipart {
                Some((form, progress)) => {
                    self.transport
                        .execute_multipart(attempt, form.clone(), progress.clone())
                        .await
                }
                None => self.transport.execute(attempt).await,
            };
            let response = result.map_err(ApiError::from)?;

            if response.is_success() {
                return Ok(response);
            }
            if response.status == 401 && !retried && had_token {
                // Single-flight refresh, then replay exactly once
                self.ensure_fresh_token().await?;
                retried = true;
                continue;
            }
            return Err(error_from_response(&response));
        }
    }

    /// Attach bearer and legacy user-id headers. Returns whether an
    /// access token was attached (the 401-refresh path only applies to
    /// calls that were authenticated to begin with).
    async fn attach_headers(&self, request: &mut HttpRequest) -> bool {
        let mut had_token = false;
        if let Some(token) = self.tokens.access_token().await {
            request
                .headers
                .push(("Authorization".into(), format!("Bearer {token}")));
            had_token = true;
        }
        // Older server versions key on this instead of the bearer token
        if let Some(user_id) = self.tokens.user_id().await {
            request.headers.push(("x-user-id".into(), user_id));
        }
        had_token
    }

    /// Obtain a fresh access token, refreshing at most once across all
    /// concurrent callers.
    async fn ensure_fresh_token(&self) -> Result<String, ApiError> {
        let observed = {
            let mut coordinator = self.refresh.lock().await;
            coordinator.observe()
        };
        match observed {
            Observed::Lead => {
                let outcome = self.do_refresh().await;
                let waiters = {
                    let mut coordinator = self.refresh.lock().await;
                    coordinator.complete()
                };
                let shared: RefreshOutcome = outcome.as_ref().ok().cloned();
                for waiter in waiters {
                    let _ = waiter.send(shared.clone());
                }
                outcome
            }
            Observed::Follow(rx) => match rx.await {
                Ok(Some(token)) => Ok(token),
                // Leader reported failure (or vanished): same outcome for all
                _ => Err(ApiError::AuthenticationExpired),
            },
        }
    }

    /// Perform the refresh call. On any failure the credential set is
    /// cleared so the caller can route the user to re-authentication.
    async fn do_refresh(&self) -> Result<String, ApiError> {
        let Some(refresh_token) = self.tokens.refresh_token().await else {
            tracing::warn!("401 received with no refresh token stored");
            let _ = self.tokens.clear().await;
            return Err(ApiError::AuthenticationExpired);
        };

        let mut request = self.request(Method::Post, "/users/refresh-token");
        request.body = Some(encode(&RefreshRequest {
            refresh_token: refresh_token.clone(),
        })?);

        let response = match self.transport.execute(request).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!(status = response.status, "token refresh rejected");
                let _ = self.tokens.clear().await;
                return Err(ApiError::AuthenticationExpired);
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh call failed");
                let _ = self.tokens.clear().await;
                return Err(ApiError::AuthenticationExpired);
            }
        };

        let parsed: RefreshResponse = decode(&response)?;
        let rotated = parsed.refresh_token.unwrap_or(refresh_token);
        if let Err(e) = self
            .tokens
            .set_tokens(&parsed.access_token, &rotated, parsed.access_token_expires_at)
            .await
        {
            // set_tokens already cleared; session is effectively lost
            tracing::error!(error = %e, "failed to persist refreshed tokens");
            return Err(ApiError::AuthenticationExpired);
        }
        tracing::info!("access token refreshed");
        Ok(parsed.access_token)
    }
}

/// Serialize a request body.
pub(crate) fn encode<B: Serialize>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::Configuration(format!("unserializable request body: {e}")))
}

/// Decode a JSON response body.
pub(crate) fn decode<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, ApiError> {
    response.json().map_err(|e| ApiError::Server {
        status: response.status,
        message: format!("invalid response body: {e}"),
    })
}

/// Map a non-2xx response onto the error taxonomy.
fn error_from_response(response: &HttpResponse) -> ApiError {
    let body: ErrorBody = response.json().unwrap_or_default();
    match response.status {
        401 | 403 => classify_auth_failure(response.status, &body),
        status => {
            let message = if body.text().is_empty() {
                format!("HTTP {status}")
            } else {
                body.text().to_string()
            };
            ApiError::Server { status, message }
        }
    }
}

/// Classify a 401/403 with no refresh path into the auth taxonomy.
///
/// A structured `code` from the server is authoritative. The message
/// substring matching below it is a compatibility shim for servers that
/// only send prose; it lives here and nowhere else.
pub(crate) fn classify_auth_failure(status: u16, body: &ErrorBody) -> ApiError {
    let text = if body.text().is_empty() {
        format!("HTTP {status}")
    } else {
        body.text().to_string()
    };

    if let Some(code) = body.code.as_deref() {
        match code {
            "SESSION_EXPIRED" | "TOKEN_EXPIRED" => return ApiError::SessionExpired(text),
            "AUTH_REQUIRED" | "UNAUTHORIZED" | "TOKEN_INVALID" => {
                return ApiError::AuthenticationRequired(text)
            }
            _ => {}
        }
    }

    let lower = text.to_ascii_lowercase();
    if lower.contains("expired") || lower.contains("session") {
        ApiError::SessionExpired(text)
    } else {
        ApiError::AuthenticationRequired(text)
    }
}
