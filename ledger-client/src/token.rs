//! Persisted credential set.
//!
//! Key names match what older app versions wrote, so an upgrade keeps the
//! user signed in.

use crate::store::{SecretStore, StoreError};
use ledger_types::{now_millis, Credentials};
use std::sync::Arc;

const KEY_ACCESS: &str = "accessToken";
const KEY_REFRESH: &str = "refreshToken";
const KEY_EXPIRES: &str = "accessTokenExpires";
const KEY_USER_ID: &str = "userId";

/// The persisted token set over a pluggable [`SecretStore`].
///
/// Read by every outbound request; written only by the auth pipeline
/// (login, registration, refresh) and cleared at logout or irrecoverable
/// refresh failure.
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn SecretStore>,
}

impl TokenStore {
    /// Create a token store over the given persistence layer.
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// The stored access token, if any.
    ///
    /// Store read failures are treated as "no token" and logged, so a
    /// broken storage layer degrades to unauthenticated rather than
    /// wedging every request.
    pub async fn access_token(&self) -> Option<String> {
        self.read(KEY_ACCESS).await
    }

    /// The stored refresh token, if any.
    pub async fn refresh_token(&self) -> Option<String> {
        self.read(KEY_REFRESH).await
    }

    /// The stored user id, if any.
    pub async fn user_id(&self) -> Option<String> {
        self.read(KEY_USER_ID).await
    }

    /// Persist the user id.
    pub async fn set_user_id(&self, user_id: &str) -> Result<(), StoreError> {
        self.store.set(KEY_USER_ID, user_id).await
    }

    /// Persist a new token pair and optional expiry.
    ///
    /// If any write fails the whole set is cleared before the error is
    /// returned: a half-written credential set must read as
    /// unauthenticated, never as silently half-authenticated.
    pub async fn set_tokens(
        &self,
        access: &str,
        refresh: &str,
        expires_at: Option<u64>,
    ) -> Result<(), StoreError> {
        let result = self.write_tokens(access, refresh, expires_at).await;
        if result.is_err() {
            let _ = self.clear().await;
        }
        result
    }

    async fn write_tokens(
        &self,
        access: &str,
        refresh: &str,
        expires_at: Option<u64>,
    ) -> Result<(), StoreError> {
        self.store.set(KEY_ACCESS, access).await?;
        self.store.set(KEY_REFRESH, refresh).await?;
        match expires_at {
            Some(at) => self.store.set(KEY_EXPIRES, &at.to_string()).await,
            None => self.store.remove(KEY_EXPIRES).await,
        }
    }

    /// Whether the stored access token should be considered expired.
    ///
    /// Fail-closed: true when no expiry is recorded, or when the recorded
    /// expiry is not in the future.
    pub async fn is_token_expired(&self) -> bool {
        match self.read(KEY_EXPIRES).await.and_then(|v| v.parse::<u64>().ok()) {
            Some(expires_at) => now_millis() >= expires_at,
            None => true,
        }
    }

    /// One snapshot of the full credential set, for diagnostics and UI
    /// state. The `Debug` impl of [`Credentials`] redacts token values,
    /// so the snapshot is safe to log.
    pub async fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.access_token().await,
            refresh_token: self.refresh_token().await,
            access_token_expires_at: self
                .read(KEY_EXPIRES)
                .await
                .and_then(|v| v.parse().ok()),
            user_id: self.user_id().await,
        }
    }

    /// Remove all four keys. Used only at logout or irrecoverable refresh
    /// failure.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(KEY_ACCESS).await?;
        self.store.remove(KEY_REFRESH).await?;
        self.store.remove(KEY_EXPIRES).await?;
        self.store.remove(KEY_USER_ID).await
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "credential store read failed");
                None
            }
        }
    }
}
