//! Authentication wire types and the persisted credential set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The persisted token set.
///
/// Written by successful login/registration/refresh; cleared on refresh
/// failure or explicit logout; read on every outbound request. The refresh
/// token is never exposed outside the token store and the refresh call.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Short-lived bearer token, if authenticated.
    pub access_token: Option<String>,
    /// Longer-lived token used only to obtain a new access token.
    pub refresh_token: Option<String>,
    /// Access token expiry (unix millis).
    pub access_token_expires_at: Option<u64>,
    /// Identifier of the authenticated user.
    pub user_id: Option<String>,
}

impl Credentials {
    /// Whether an access token is present at all.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Token values never appear in logs
        f.debug_struct("Credentials")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("access_token_expires_at", &self.access_token_expires_at)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Body of `POST /users/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Body of `POST /users/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Response to a successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Identifier of the authenticated user.
    pub user_id: String,
    /// Bearer token for subsequent calls.
    pub access_token: String,
    /// Token used to refresh the access token.
    pub refresh_token: String,
    /// Access token expiry (unix millis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_expires_at: Option<u64>,
}

/// Body of `POST /users/refresh-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The stored refresh token.
    pub refresh_token: String,
}

/// Response to a successful token refresh.
///
/// The refresh token may or may not rotate; when present it replaces the
/// stored one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The new access token.
    pub access_token: String,
    /// New access token expiry (unix millis).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_expires_at: Option<u64>,
    /// Rotated refresh token, when the server rotates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Error response shape assumed from the server.
///
/// Servers are inconsistent about which field they populate; the client
/// treats all three as optional and best-effort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-oriented error slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-oriented message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Structured error code, when the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Best available message text, preferring `message` over `error`.
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or("")
    }
}
