//! Backoff and debounce policy.

use std::time::Duration;

/// Default maximum retries for a failed multipart upload.
pub const DEFAULT_MAX_UPLOAD_RETRIES: u32 = 2;

/// Debounce delay between connectivity coming back and the sync pass
/// starting, so flaky connections don't thrash the queue.
pub const SYNC_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Delay before retrying a failed upload.
///
/// Linear, not exponential: `1000ms × (attempt + 1)`, so the wait after
/// the first failure is 1s, after the second 2s, and so on. `attempt` is
/// zero-based (the attempt that just failed).
pub fn upload_backoff(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (u64::from(attempt) + 1))
}
