//! # ledger-types
//!
//! Wire format and data types for the ledgerlink bookkeeping API client.
//!
//! This crate provides the foundational types used across all ledgerlink
//! crates:
//! - [`MutationId`] - Identity type for queued offline mutations
//! - [`Transaction`], [`Category`], [`Alert`], [`Reminder`] - Resource records
//! - [`PendingMutation`] - A locally queued write awaiting delivery
//! - [`Credentials`] - The persisted token set
//! - [`ApiError`] - Error taxonomy surfaced to callers

#![warn(missing_docs)]
#![warn(clippy::all)]

mod auth;
mod error;
mod ids;
mod models;
mod mutation;

pub use auth::{
    AuthResponse, Credentials, ErrorBody, LoginRequest, RefreshRequest, RefreshResponse,
    RegisterRequest,
};
pub use error::ApiError;
pub use ids::{now_millis, MutationId};
pub use models::{
    Alert, CacheSnapshot, Category, Reminder, Transaction, TransactionKind,
};
pub use mutation::{MutationKind, PendingMutation};
