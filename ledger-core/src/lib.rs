//! # ledger-core
//!
//! Pure logic for the ledgerlink API client (no I/O, instant tests).
//!
//! This crate implements the state machines and policies of the client
//! without any network or disk I/O, enabling fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce
//! output without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (network, disk, timers) is performed by `ledger-client`,
//! which interprets the decisions and actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod connectivity;
pub mod queue;
pub mod refresh;

pub use backoff::{upload_backoff, DEFAULT_MAX_UPLOAD_RETRIES, SYNC_DEBOUNCE};
pub use connectivity::{ConnectivityAction, ConnectivityEvent, ConnectivityState, SyncContext};
pub use queue::{FailureOutcome, MutationQueue, OnExhaust, QueueError, RetryPolicy};
pub use refresh::{RefreshDecision, RefreshGate, WaiterId};
