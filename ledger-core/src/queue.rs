//! Pending-mutation queue with retry accounting.
//!
//! This module provides the durable-queue logic for writes made while
//! offline:
//! - FIFO ordering (oldest first) to preserve causal intent - an edit is
//!   never replayed before its create
//! - Per-item retry counters with a fixed ceiling
//! - A configurable exhaustion policy: silently drop, or move to a
//!   dead-letter list kept for inspection
//!
//! The queue itself performs no I/O. `ledger-client` persists its records
//! through the secret store and drives replay during sync passes.

use ledger_types::{MutationId, PendingMutation};
use thiserror::Error;

/// Error type for queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Queue is at capacity.
    #[error("queue full (capacity: {capacity})")]
    Full {
        /// Configured capacity.
        capacity: usize,
    },
}

/// What to do with a mutation that exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnExhaust {
    /// Discard the item. Data loss is accepted past the ceiling.
    Drop,
    /// Move the item to a dead-letter list for manual review/export.
    #[default]
    DeadLetter,
}

/// Retry policy for queued mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// A mutation is retried while `retry_count < max_attempts`.
    pub max_attempts: u32,
    /// Exhaustion behavior.
    pub on_exhaust: OnExhaust,
}

impl RetryPolicy {
    /// Create a policy with the given ceiling and exhaustion behavior.
    pub fn new(max_attempts: u32, on_exhaust: OnExhaust) -> Self {
        Self {
            max_attempts,
            on_exhaust,
        }
    }

    /// Whether the item should stay queued after another failure.
    pub fn should_retry(&self, item: &PendingMutation) -> bool {
        item.retry_count < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            on_exhaust: OnExhaust::default(),
        }
    }
}

/// Outcome of recording a failed replay attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Retry counter bumped; the item stays queued.
    Requeued,
    /// Ceiling reached; the item was discarded.
    Dropped,
    /// Ceiling reached; the item moved to the dead-letter list.
    DeadLettered,
}

/// FIFO queue of pending mutations with retry accounting.
///
/// Ordering is insertion order, oldest first. At most one entry drives a
/// network call at a time per sync pass; the caller iterates with
/// [`front`](Self::front) / [`remove`](Self::remove) /
/// [`record_failure`](Self::record_failure).
#[derive(Debug)]
pub struct MutationQueue {
    items: Vec<PendingMutation>,
    dead_letter: Vec<PendingMutation>,
    policy: RetryPolicy,
    capacity: Option<usize>,
}

impl MutationQueue {
    /// Create an unbounded queue with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            items: Vec::new(),
            dead_letter: Vec::new(),
            policy,
            capacity: None,
        }
    }

    /// Create a queue that rejects enqueues past `capacity` entries.
    pub fn with_capacity(policy: RetryPolicy, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(policy)
        }
    }

    /// The configured retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Append a mutation. Never blocks; fails only when over capacity.
    pub fn enqueue(&mut self, mutation: PendingMutation) -> Result<(), QueueError> {
        if let Some(cap) = self.capacity {
            if self.items.len() >= cap {
                return Err(QueueError::Full { capacity: cap });
            }
        }
        self.items.push(mutation);
        Ok(())
    }

    /// All pending mutations, oldest first.
    pub fn pending(&self) -> &[PendingMutation] {
        &self.items
    }

    /// The oldest pending mutation, if any.
    pub fn front(&self) -> Option<&PendingMutation> {
        self.items.first()
    }

    /// Number of pending mutations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the queue has no pending mutations.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove a mutation by id (successful replay). Returns the record.
    pub fn remove(&mut self, id: MutationId) -> Option<PendingMutation> {
        let idx = self.items.iter().position(|m| m.id == id)?;
        Some(self.items.remove(idx))
    }

    /// Record a failed replay attempt for `id`.
    ///
    /// While the policy allows another retry the counter is bumped and the
    /// item keeps its queue position. Otherwise the item leaves the queue
    /// per the exhaustion policy. Unknown ids return `None`.
    pub fn record_failure(&mut self, id: MutationId) -> Option<FailureOutcome> {
        let idx = self.items.iter().position(|m| m.id == id)?;
        if self.policy.should_retry(&self.items[idx]) {
            self.items[idx].retry_count += 1;
            Some(FailureOutcome::Requeued)
        } else {
            let item = self.items.remove(idx);
            match self.policy.on_exhaust {
                OnExhaust::Drop => Some(FailureOutcome::Dropped),
                OnExhaust::DeadLetter => {
                    self.dead_letter.push(item);
                    Some(FailureOutcome::DeadLettered)
                }
            }
        }
    }

    /// Items that exhausted their retries, in exhaustion order.
    ///
    /// Only populated under [`OnExhaust::DeadLetter`]. Never replayed
    /// automatically; kept for inspection or export.
    pub fn dead_letter(&self) -> &[PendingMutation] {
        &self.dead_letter
    }

    /// Drain and return the dead-letter list (e.g. after export).
    pub fn take_dead_letter(&mut self) -> Vec<PendingMutation> {
        std::mem::take(&mut self.dead_letter)
    }

    /// Replace the queue contents from persisted records, oldest first.
    pub fn restore(&mut self, items: Vec<PendingMutation>) {
        self.items = items;
    }

    /// Remove everything, including the dead-letter list.
    pub fn clear(&mut self) {
        self.items.clear();
        self.dead_letter.clear();
    }
}

impl Default for MutationQueue {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}
