//! Identity types for ledgerlink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for a queued offline mutation.
///
/// UUID v4, generated locally when the mutation is enqueued. The id is
/// stable for the lifetime of the queue entry so retries and removal can
/// address the same record.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(uuid::Uuid);

impl MutationId {
    /// Create a new random MutationId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse a MutationId from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MutationId({})", self.0)
    }
}

/// Current wall-clock time as milliseconds since the Unix epoch.
///
/// Used for `created_at` stamps on queue entries and the cache
/// `last_sync_time`. Server-assigned timestamps always win over these;
/// local clocks are only trusted for local bookkeeping.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
