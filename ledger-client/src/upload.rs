//! Multipart upload pipeline with bounded retry.

use crate::client::{decode, ApiClient};
use crate::transport::{HttpTransport, Method, MultipartForm, ProgressCallback};
use ledger_core::upload_backoff;
use ledger_types::ApiError;
use serde::de::DeserializeOwned;

impl<T: HttpTransport> ApiClient<T> {
    /// POST a multipart form to `path`, retrying transient failures.
    ///
    /// The same bearer/user-id headers as ordinary requests are attached,
    /// and the 401-refresh pipeline applies (a refresh replay does not
    /// consume a retry). Fractional progress (0-100) is reported through
    /// `progress` when the transport supports it; on each retry the
    /// reported progress resets to 0.
    ///
    /// Retryable failures are network-level errors, client-side timeouts,
    /// and 5xx responses; other 4xx responses are terminal. Between
    /// attempts the pipeline waits `1s × (attempt + 1)` - 1 s then 2 s at
    /// the default `max_retries` of 2 - and retries are strictly
    /// sequential, never overlapping.
    ///
    /// The pipeline never goes past `max_retries`: deciding whether a
    /// duplicate submission matters on a non-idempotent endpoint is the
    /// caller's concern.
    pub async fn upload_multipart<R: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartForm,
        progress: Option<ProgressCallback>,
        max_retries: u32,
    ) -> Result<R, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            let mut request = self.request(Method::Post, path);
            request.timeout = self.config.upload_timeout;

            let result = self
                .send_with_auth(request, Some((form.clone(), progress.clone())))
                .await;

            match result {
                Ok(response) => return decode(&response),
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    if let Some(cb) = &progress {
                        cb(0);
                    }
                    let delay = upload_backoff(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "upload failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::warn!(attempts = attempt + 1, error = %err, "upload failed");
                    return Err(err);
                }
            }
        }
    }
}
