//! Pending mutations: locally queued writes awaiting delivery.

use crate::ids::{now_millis, MutationId};
use serde::{Deserialize, Serialize};

/// The operation a queued mutation performs when replayed.
///
/// Serialized in kebab-case (`create-transaction`) to match the queue
/// records older app versions persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationKind {
    /// Create a transaction.
    CreateTransaction,
    /// Update an existing transaction.
    UpdateTransaction,
    /// Delete a transaction.
    DeleteTransaction,
    /// Create a category.
    CreateCategory,
    /// Update an existing category.
    UpdateCategory,
    /// Delete a category.
    DeleteCategory,
    /// Create an alert.
    CreateAlert,
    /// Update an existing alert.
    UpdateAlert,
    /// Delete an alert.
    DeleteAlert,
    /// Create a reminder.
    CreateReminder,
    /// Update an existing reminder.
    UpdateReminder,
    /// Delete a reminder.
    DeleteReminder,
}

/// A locally queued write operation awaiting successful delivery.
///
/// Created when a mutating call is attempted while offline or fails with a
/// retryable error. `retry_count` is bumped on each failed replay; the
/// entry is destroyed on success or once the retry ceiling is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    /// Locally generated, stable identifier.
    pub id: MutationId,
    /// What to do when replayed.
    pub kind: MutationKind,
    /// Operation-specific request body.
    pub payload: serde_json::Value,
    /// Failed replay attempts so far.
    pub retry_count: u32,
    /// When the mutation was enqueued (unix millis).
    pub created_at: u64,
}

impl PendingMutation {
    /// Create a fresh queue entry with a new id and zero retries.
    pub fn new(kind: MutationKind, payload: serde_json::Value) -> Self {
        Self {
            id: MutationId::new(),
            kind,
            payload,
            retry_count: 0,
            created_at: now_millis(),
        }
    }
}
