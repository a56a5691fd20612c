//! Resource records cached for offline display.
//!
//! These mirror what the bookkeeping backend returns as JSON. Amounts are
//! integer minor units (cents); the client never does float arithmetic on
//! money.

use serde::{Deserialize, Serialize};

/// Whether a transaction adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

/// A single income or expense entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Server-assigned identifier.
    pub id: String,
    /// Income or expense.
    pub kind: TransactionKind,
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    /// Category this entry belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the transaction occurred (unix millis).
    pub occurred_at: u64,
    /// When the record was created on the server (unix millis).
    pub created_at: u64,
}

/// A user-defined spending/income category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Server-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Which transaction kind this category applies to.
    pub kind: TransactionKind,
}

/// A spending alert configured by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Server-assigned identifier.
    pub id: String,
    /// Alert message shown to the user.
    pub message: String,
    /// Threshold in minor units that triggers the alert.
    pub threshold_minor: i64,
    /// Whether the alert is currently enabled.
    pub active: bool,
}

/// A payment or bookkeeping reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Server-assigned identifier.
    pub id: String,
    /// Reminder title.
    pub title: String,
    /// When the reminder is due (unix millis).
    pub due_at: u64,
    /// Whether the reminder has been completed.
    pub done: bool,
}

/// The full offline read-model: one ordered sequence per resource type
/// plus sync bookkeeping timestamps.
///
/// Owned exclusively by the sync component. Overwritten wholesale on each
/// successful full sync; read by UI callers for offline display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Cached transactions, server order.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    /// Cached categories, server order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Cached alerts, server order.
    #[serde(default)]
    pub alerts: Vec<Alert>,
    /// Cached reminders, server order.
    #[serde(default)]
    pub reminders: Vec<Reminder>,
    /// When the last full sync pass completed (unix millis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<u64>,
    /// When the last backup completed (unix millis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_backup_time: Option<u64>,
}
