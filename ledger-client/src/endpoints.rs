//! Typed operations over the bookkeeping REST surface.
//!
//! These are the logical operations UI callers issue. Auth operations
//! additionally maintain the token store; everything else is a thin typed
//! wrapper over the client's request pipeline.

use crate::client::ApiClient;
use crate::transport::{HttpTransport, MultipartForm, ProgressCallback};
use ledger_core::DEFAULT_MAX_UPLOAD_RETRIES;
use ledger_types::{
    Alert, ApiError, AuthResponse, Category, LoginRequest, RegisterRequest, Reminder,
    Transaction, TransactionKind,
};
use serde::{Deserialize, Serialize};

/// Payload for creating a transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Income or expense.
    pub kind: TransactionKind,
    /// Amount in minor units (cents).
    pub amount_minor: i64,
    /// Category, if assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Free-form note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// When the transaction occurred (unix millis).
    pub occurred_at: u64,
}

/// Payload for creating a category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    /// Display name.
    pub name: String,
    /// Which transaction kind the category applies to.
    pub kind: TransactionKind,
}

/// Payload for creating an alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    /// Alert message.
    pub message: String,
    /// Threshold in minor units.
    pub threshold_minor: i64,
    /// Whether the alert starts enabled.
    pub active: bool,
}

/// Payload for creating a reminder.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReminder {
    /// Reminder title.
    pub title: String,
    /// When the reminder is due (unix millis).
    pub due_at: u64,
}

/// Response to a receipt upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    /// Server-assigned receipt id.
    pub id: String,
    /// Where the stored receipt can be fetched.
    pub url: String,
}

impl<T: HttpTransport> ApiClient<T> {
    // ===========================================
    // Auth
    // ===========================================

    /// Sign in and persist the returned credential set.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self
            .post(
                "/users/login",
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.persist_auth(&response).await?;
        Ok(response)
    }

    /// Create an account and persist the returned credential set.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self
            .post(
                "/users/register",
                &RegisterRequest {
                    name: name.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.persist_auth(&response).await?;
        Ok(response)
    }

    /// Sign out: best-effort server notification, then clear credentials.
    ///
    /// The local clear happens even when the server call fails - a device
    /// that can't reach the backend must still be able to sign out.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if let Err(e) = self
            .post::<_, serde_json::Value>("/users/logout", &serde_json::json!({}))
            .await
        {
            tracing::debug!(error = %e, "server logout failed, clearing locally");
        }
        self.tokens()
            .clear()
            .await
            .map_err(|e| ApiError::Configuration(format!("credential clear failed: {e}")))
    }

    async fn persist_auth(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        self.tokens()
            .set_tokens(
                &auth.access_token,
                &auth.refresh_token,
                auth.access_token_expires_at,
            )
            .await
            .map_err(|e| ApiError::Configuration(format!("credential store write failed: {e}")))?;
        self.tokens()
            .set_user_id(&auth.user_id)
            .await
            .map_err(|e| ApiError::Configuration(format!("credential store write failed: {e}")))
    }

    // ===========================================
    // Transactions
    // ===========================================

    /// Fetch all transactions.
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.get("/transactions", &[]).await
    }

    /// Create a transaction.
    pub async fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction, ApiError> {
        self.post("/transactions", new).await
    }

    /// Replace a transaction.
    pub async fn update_transaction(&self, tx: &Transaction) -> Result<Transaction, ApiError> {
        self.put(&format!("/transactions/{}", tx.id), tx).await
    }

    /// Delete a transaction by id.
    pub async fn delete_transaction(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/transactions/{id}")).await
    }

    // ===========================================
    // Categories
    // ===========================================

    /// Fetch all categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get("/categories", &[]).await
    }

    /// Create a category.
    pub async fn create_category(&self, new: &NewCategory) -> Result<Category, ApiError> {
        self.post("/categories", new).await
    }

    /// Replace a category.
    pub async fn update_category(&self, category: &Category) -> Result<Category, ApiError> {
        self.put(&format!("/categories/{}", category.id), category).await
    }

    /// Delete a category by id.
    pub async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/categories/{id}")).await
    }

    // ===========================================
    // Alerts
    // ===========================================

    /// Fetch all alerts.
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        self.get("/alerts", &[]).await
    }

    /// Create an alert.
    pub async fn create_alert(&self, new: &NewAlert) -> Result<Alert, ApiError> {
        self.post("/alerts", new).await
    }

    /// Replace an alert.
    pub async fn update_alert(&self, alert: &Alert) -> Result<Alert, ApiError> {
        self.put(&format!("/alerts/{}", alert.id), alert).await
    }

    /// Delete an alert by id.
    pub async fn delete_alert(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/alerts/{id}")).await
    }

    // ===========================================
    // Reminders
    // ===========================================

    /// Fetch all reminders.
    pub async fn list_reminders(&self) -> Result<Vec<Reminder>, ApiError> {
        self.get("/reminders", &[]).await
    }

    /// Create a reminder.
    pub async fn create_reminder(&self, new: &NewReminder) -> Result<Reminder, ApiError> {
        self.post("/reminders", new).await
    }

    /// Replace a reminder.
    pub async fn update_reminder(&self, reminder: &Reminder) -> Result<Reminder, ApiError> {
        self.put(&format!("/reminders/{}", reminder.id), reminder).await
    }

    /// Delete a reminder by id.
    pub async fn delete_reminder(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/reminders/{id}")).await
    }

    // ===========================================
    // Receipts
    // ===========================================

    /// Upload a receipt image for a transaction.
    ///
    /// Uses the upload pipeline: extended timeout, bounded retry with
    /// backoff, optional progress reporting.
    pub async fn upload_receipt(
        &self,
        transaction_id: &str,
        filename: &str,
        mime: &str,
        data: Vec<u8>,
        progress: Option<ProgressCallback>,
    ) -> Result<ReceiptResponse, ApiError> {
        let form = MultipartForm::new()
            .text("transactionId", transaction_id)
            .file("file", filename, mime, data);
        self.upload_multipart("/receipts", form, progress, DEFAULT_MAX_UPLOAD_RETRIES)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::store::MemoryStore;
    use crate::token::TokenStore;
    use crate::transport::{Method, MockTransport};
    use serde_json::json;
    use std::sync::Arc;

    async fn fresh_client(transport: MockTransport) -> ApiClient<MockTransport> {
        let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
        let config = ClientConfig::with_base_url("http://test.local/api").unwrap();
        ApiClient::new(config, transport, tokens)
    }

    fn auth_body() -> serde_json::Value {
        json!({
            "userId": "user-1",
            "accessToken": "at-1",
            "refreshToken": "rt-1",
            "accessTokenExpiresAt": u64::MAX,
        })
    }

    #[tokio::test]
    async fn login_persists_credentials() {
        let transport = MockTransport::new();
        transport.queue_json(200, auth_body());
        let client = fresh_client(transport.clone()).await;

        let auth = client.login("pat@example.com", "hunter2").await.unwrap();

        assert_eq!(auth.user_id, "user-1");
        assert_eq!(client.tokens().access_token().await, Some("at-1".into()));
        assert_eq!(client.tokens().refresh_token().await, Some("rt-1".into()));
        assert_eq!(client.tokens().user_id().await, Some("user-1".into()));
        assert!(!client.tokens().is_token_expired().await);

        let requests = transport.requests();
        let sent = &requests[0].request;
        assert_eq!(sent.url, "http://test.local/api/users/login");
        assert_eq!(sent.body.as_ref().unwrap()["email"], "pat@example.com");
    }

    #[tokio::test]
    async fn failed_login_leaves_store_untouched() {
        let transport = MockTransport::new();
        transport.queue_json(401, json!({"message": "invalid password"}));
        let client = fresh_client(transport).await;

        let result = client.login("pat@example.com", "wrong").await;

        assert!(matches!(result, Err(ApiError::AuthenticationRequired(_))));
        assert!(client.tokens().access_token().await.is_none());
    }

    #[tokio::test]
    async fn register_persists_credentials() {
        let transport = MockTransport::new();
        transport.queue_json(201, auth_body());
        let client = fresh_client(transport.clone()).await;

        client.register("Pat", "pat@example.com", "hunter2").await.unwrap();

        assert_eq!(client.tokens().user_id().await, Some("user-1".into()));
        let requests = transport.requests();
        let sent = &requests[0].request;
        assert_eq!(sent.url, "http://test.local/api/users/register");
        assert_eq!(sent.body.as_ref().unwrap()["name"], "Pat");
    }

    #[tokio::test]
    async fn logout_clears_tokens_even_when_server_unreachable() {
        let transport = MockTransport::new();
        transport.queue_error(crate::transport::TransportError::Network("offline".into()));
        let client = fresh_client(transport).await;
        client.tokens().set_tokens("at", "rt", Some(u64::MAX)).await.unwrap();

        client.logout().await.unwrap();

        assert!(client.tokens().access_token().await.is_none());
        assert!(client.tokens().refresh_token().await.is_none());
    }

    #[tokio::test]
    async fn create_transaction_posts_camel_case_body() {
        let transport = MockTransport::new();
        transport.queue_json(
            201,
            json!({
                "id": "tx-1",
                "kind": "expense",
                "amountMinor": 1250,
                "occurredAt": 1000,
                "createdAt": 2000,
            }),
        );
        let client = fresh_client(transport.clone()).await;

        let tx = client
            .create_transaction(&NewTransaction {
                kind: TransactionKind::Expense,
                amount_minor: 1250,
                category_id: None,
                note: Some("coffee".into()),
                occurred_at: 1000,
            })
            .await
            .unwrap();

        assert_eq!(tx.id, "tx-1");
        let requests = transport.requests();
        let sent = &requests[0].request;
        assert_eq!(sent.method, Method::Post);
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["amountMinor"], 1250);
        assert_eq!(body["note"], "coffee");
        assert!(body.get("categoryId").is_none());
    }

    #[tokio::test]
    async fn update_and_delete_target_resource_by_id() {
        let transport = MockTransport::new();
        transport.queue_json(
            200,
            json!({"id": "rem-1", "title": "Rent", "dueAt": 5, "done": true}),
        );
        transport.queue_json(204, json!(null));
        let client = fresh_client(transport.clone()).await;

        let reminder = Reminder {
            id: "rem-1".into(),
            title: "Rent".into(),
            due_at: 5,
            done: true,
        };
        client.update_reminder(&reminder).await.unwrap();
        client.delete_reminder("rem-1").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].request.method, Method::Put);
        assert_eq!(requests[0].request.url, "http://test.local/api/reminders/rem-1");
        assert_eq!(requests[1].request.method, Method::Delete);
        assert_eq!(requests[1].request.url, "http://test.local/api/reminders/rem-1");
    }

    #[tokio::test]
    async fn list_endpoints_decode_arrays() {
        let transport = MockTransport::new();
        transport.queue_json(
            200,
            json!([{"id": "cat-1", "name": "Groceries", "kind": "expense"}]),
        );
        let client = fresh_client(transport).await;

        let categories = client.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].name, "Groceries");
    }

    #[tokio::test]
    async fn upload_receipt_builds_multipart_form() {
        let transport = MockTransport::new();
        transport.queue_json(200, json!({"id": "r-1", "url": "/receipts/r-1"}));
        let client = fresh_client(transport.clone()).await;

        let receipt = client
            .upload_receipt("tx-1", "receipt.jpg", "image/jpeg", vec![1, 2, 3], None)
            .await
            .unwrap();

        assert_eq!(receipt.id, "r-1");
        let recorded = transport.requests();
        let form = recorded[0].form.as_ref().unwrap();
        assert_eq!(form.parts.len(), 2);
        assert_eq!(form.parts[0].name, "transactionId");
        assert_eq!(form.parts[0].data, b"tx-1");
        assert_eq!(form.parts[1].filename.as_deref(), Some("receipt.jpg"));
    }
}
