//! Offline sync: durable mutation queue, cache snapshots, event bus.
//!
//! Mutations made while offline are queued through [`SyncService::enqueue`]
//! (never blocks on network) and replayed oldest-first by
//! [`SyncService::run_sync_pass`] once connectivity returns. After the
//! queue drains, fresh snapshots of every cached resource type are
//! fetched and the local cache is overwritten wholesale - the server
//! wins, there is no client-side merge.
//!
//! Replay failures are recovered locally (retried up to the policy
//! ceiling, then dropped or dead-lettered) and never interrupt callers;
//! they are only observable through the event bus returned by
//! [`SyncService::subscribe`].

use crate::client::ApiClient;
use crate::store::SecretStore;
use crate::transport::HttpTransport;
use ledger_core::{
    ConnectivityAction, ConnectivityEvent, ConnectivityState, FailureOutcome, MutationQueue,
    RetryPolicy, SyncContext,
};
use ledger_types::{
    now_millis, ApiError, CacheSnapshot, MutationId, MutationKind, PendingMutation,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const KEY_QUEUE: &str = "pendingMutations";
const KEY_DEAD_LETTER: &str = "deadLetterMutations";
const KEY_CACHE: &str = "cachedSnapshot";

/// Sync behavior knobs.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Schedule a debounced sync pass automatically when connectivity
    /// returns and mutations are pending.
    pub auto_sync: bool,
    /// Retry ceiling and exhaustion policy for queued mutations.
    pub retry_policy: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            auto_sync: true,
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Events published on the sync bus.
///
/// Subscribers get connectivity transitions and sync progress without
/// polling; a lagging subscriber misses old events rather than blocking
/// the sync pass.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Connectivity changed.
    Connectivity {
        /// Whether the device is now online.
        online: bool,
    },
    /// A sync pass started.
    SyncStarted,
    /// A queued mutation was delivered and removed.
    MutationSynced {
        /// Id of the delivered mutation.
        id: MutationId,
    },
    /// A queued mutation failed and stays queued for the next pass.
    MutationRequeued {
        /// Id of the failed mutation.
        id: MutationId,
    },
    /// A mutation exhausted its retries and was discarded.
    MutationDropped {
        /// Id of the discarded mutation.
        id: MutationId,
    },
    /// A mutation exhausted its retries and moved to the dead-letter list.
    MutationDeadLettered {
        /// Id of the dead-lettered mutation.
        id: MutationId,
    },
    /// A full sync pass finished and the cache was overwritten.
    SyncCompleted {
        /// Mutations delivered during this pass.
        synced: usize,
        /// Mutations still queued after this pass.
        remaining: usize,
    },
    /// A sync pass aborted (snapshot fetch failed).
    SyncFailed {
        /// Developer-oriented failure description.
        message: String,
    },
}

/// Summary of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Mutations delivered and removed.
    pub synced: usize,
    /// Mutations that failed and stay queued.
    pub requeued: usize,
    /// Mutations discarded past the retry ceiling.
    pub dropped: usize,
    /// Mutations moved to the dead-letter list.
    pub dead_lettered: usize,
    /// True when another pass was already running and this one did
    /// nothing.
    pub skipped: bool,
}

struct SyncState {
    queue: MutationQueue,
    connectivity: ConnectivityState,
}

/// The sync queue / offline cache component.
///
/// Owns queue and cache state exclusively; other components read the
/// cache through [`snapshot`](Self::snapshot) but never write it.
pub struct SyncService<T: HttpTransport> {
    api: Arc<ApiClient<T>>,
    store: Arc<dyn SecretStore>,
    state: Mutex<SyncState>,
    events: broadcast::Sender<SyncEvent>,
    syncing: AtomicBool,
    auto_sync: bool,
}

impl<T: HttpTransport + 'static> SyncService<T> {
    /// Create the service, restoring any persisted queue state.
    ///
    /// Corrupt persisted state is discarded with a warning rather than
    /// wedging startup.
    pub async fn new(
        api: Arc<ApiClient<T>>,
        store: Arc<dyn SecretStore>,
        options: SyncOptions,
    ) -> Arc<Self> {
        let mut queue = MutationQueue::new(options.retry_policy);
        match store.get(KEY_QUEUE).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PendingMutation>>(&raw) {
                Ok(items) => queue.restore(items),
                Err(e) => tracing::warn!(error = %e, "discarding corrupt pending queue"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read persisted queue"),
        }
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            api,
            store,
            state: Mutex::new(SyncState {
                queue,
                connectivity: ConnectivityState::new(),
            }),
            events,
            syncing: AtomicBool::new(false),
            auto_sync: options.auto_sync,
        })
    }

    /// Subscribe to connectivity and sync-status events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Whether the device is currently considered online.
    pub async fn is_online(&self) -> bool {
        self.state.lock().await.connectivity.is_online()
    }

    /// Number of mutations waiting for delivery.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// The pending mutations, oldest first.
    pub async fn pending(&self) -> Vec<PendingMutation> {
        self.state.lock().await.queue.pending().to_vec()
    }

    /// Mutations that exhausted their retries, when the policy
    /// dead-letters instead of dropping.
    pub async fn dead_letter(&self) -> Vec<PendingMutation> {
        self.state.lock().await.queue.dead_letter().to_vec()
    }

    /// Queue a mutation for later delivery. Returns immediately - the
    /// only I/O is the local queue persist, never the network.
    pub async fn enqueue(
        &self,
        kind: MutationKind,
        payload: serde_json::Value,
    ) -> Result<MutationId, ApiError> {
        let mutation = PendingMutation::new(kind, payload);
        let id = mutation.id;
        {
            let mut state = self.state.lock().await;
            state
                .queue
                .enqueue(mutation)
                .map_err(|e| ApiError::Configuration(e.to_string()))?;
        }
        self.persist_queue().await;
        tracing::debug!(mutation = %id, ?kind, "queued offline mutation");
        Ok(id)
    }

    /// Report a connectivity transition.
    ///
    /// On offline→online with auto-sync enabled and a nonzero pending
    /// count, a sync pass is scheduled after a short debounce so flaky
    /// connections don't thrash. Duplicate reports are ignored.
    pub async fn set_connectivity(self: &Arc<Self>, online: bool) {
        let event = if online {
            ConnectivityEvent::CameOnline
        } else {
            ConnectivityEvent::WentOffline
        };
        let actions = {
            let mut state = self.state.lock().await;
            let ctx = SyncContext {
                auto_sync: self.auto_sync,
                pending_count: state.queue.len(),
            };
            let (next, actions) = state.connectivity.on_event(event, ctx);
            state.connectivity = next;
            actions
        };

        for action in actions {
            match action {
                ConnectivityAction::NotifyListeners { online } => {
                    self.emit(SyncEvent::Connectivity { online });
                }
                ConnectivityAction::ScheduleSyncPass { delay } => {
                    let service = Arc::clone(self);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Err(e) = service.run_sync_pass().await {
                            tracing::warn!(error = %e, "scheduled sync pass failed");
                        }
                    });
                }
            }
        }
    }

    /// Run one full sync pass: replay the queue oldest-first, then fetch
    /// fresh snapshots and overwrite the cache wholesale.
    ///
    /// At most one pass runs at a time; a pass requested while another is
    /// running returns a report with `skipped` set.
    pub async fn run_sync_pass(&self) -> Result<SyncReport, ApiError> {
        if self.syncing.swap(true, Ordering::SeqCst) {
            tracing::debug!("sync pass already running");
            return Ok(SyncReport {
                skipped: true,
                ..SyncReport::default()
            });
        }
        let result = self.sync_pass_inner().await;
        self.syncing.store(false, Ordering::SeqCst);
        result
    }

    async fn sync_pass_inner(&self) -> Result<SyncReport, ApiError> {
        self.emit(SyncEvent::SyncStarted);
        let mut report = SyncReport::default();

        // One replay attempt per item per pass, strictly oldest first
        let ids: Vec<MutationId> = {
            let state = self.state.lock().await;
            state.queue.pending().iter().map(|m| m.id).collect()
        };
        tracing::info!(pending = ids.len(), "sync pass started");

        for id in ids {
            let item = {
                let state = self.state.lock().await;
                state.queue.pending().iter().find(|m| m.id == id).cloned()
            };
            let Some(item) = item else { continue };

            match self.replay(&item).await {
                Ok(()) => {
                    self.state.lock().await.queue.remove(id);
                    report.synced += 1;
                    self.emit(SyncEvent::MutationSynced { id });
                }
                Err(err) => {
                    tracing::warn!(mutation = %id, error = %err, "replay failed");
                    let outcome = self.state.lock().await.queue.record_failure(id);
                    match outcome {
                        Some(FailureOutcome::Requeued) => {
                            report.requeued += 1;
                            self.emit(SyncEvent::MutationRequeued { id });
                        }
                        Some(FailureOutcome::Dropped) => {
                            report.dropped += 1;
                            self.emit(SyncEvent::MutationDropped { id });
                        }
                        Some(FailureOutcome::DeadLettered) => {
                            report.dead_lettered += 1;
                            self.persist_dead_letter().await;
                            self.emit(SyncEvent::MutationDeadLettered { id });
                        }
                        None => {}
                    }
                }
            }
            self.persist_queue().await;
        }

        // Authoritative snapshots, overwritten wholesale: server wins
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.persist_snapshot(&snapshot).await;
                let remaining = self.pending_count().await;
                tracing::info!(synced = report.synced, remaining, "sync pass completed");
                self.emit(SyncEvent::SyncCompleted {
                    synced: report.synced,
                    remaining,
                });
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(error = %err, "snapshot fetch failed");
                self.emit(SyncEvent::SyncFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Replay one queued mutation against the matching endpoint.
    async fn replay(&self, item: &PendingMutation) -> Result<(), ApiError> {
        let collection = collection_path(item.kind);
        match verb(item.kind) {
            Verb::Create => {
                let _: serde_json::Value = self.api.post(collection, &item.payload).await?;
            }
            Verb::Update => {
                let id = required_id(item)?;
                let _: serde_json::Value = self
                    .api
                    .put(&format!("{collection}/{id}"), &item.payload)
                    .await?;
            }
            Verb::Delete => {
                let id = required_id(item)?;
                self.api.delete(&format!("{collection}/{id}")).await?;
            }
        }
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<CacheSnapshot, ApiError> {
        let transactions = self.api.list_transactions().await?;
        let categories = self.api.list_categories().await?;
        let alerts = self.api.list_alerts().await?;
        let reminders = self.api.list_reminders().await?;
        let last_backup_time = self.snapshot().await.last_backup_time;
        Ok(CacheSnapshot {
            transactions,
            categories,
            alerts,
            reminders,
            last_sync_time: Some(now_millis()),
            last_backup_time,
        })
    }

    /// The cached read-model for offline display.
    pub async fn snapshot(&self) -> CacheSnapshot {
        match self.store.get(KEY_CACHE).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "discarding corrupt cache snapshot");
                CacheSnapshot::default()
            }),
            Ok(None) => CacheSnapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read cache snapshot");
                CacheSnapshot::default()
            }
        }
    }

    async fn persist_snapshot(&self, snapshot: &CacheSnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(raw) => {
                if let Err(e) = self.store.set(KEY_CACHE, &raw).await {
                    tracing::warn!(error = %e, "failed to persist cache snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize cache snapshot"),
        }
    }

    async fn persist_queue(&self) {
        let raw = {
            let state = self.state.lock().await;
            serde_json::to_string(state.queue.pending())
        };
        match raw {
            Ok(raw) => {
                if let Err(e) = self.store.set(KEY_QUEUE, &raw).await {
                    tracing::warn!(error = %e, "failed to persist pending queue");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize pending queue"),
        }
    }

    async fn persist_dead_letter(&self) {
        let raw = {
            let state = self.state.lock().await;
            serde_json::to_string(state.queue.dead_letter())
        };
        match raw {
            Ok(raw) => {
                if let Err(e) = self.store.set(KEY_DEAD_LETTER, &raw).await {
                    tracing::warn!(error = %e, "failed to persist dead-letter list");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize dead-letter list"),
        }
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

enum Verb {
    Create,
    Update,
    Delete,
}

fn verb(kind: MutationKind) -> Verb {
    use MutationKind::*;
    match kind {
        CreateTransaction | CreateCategory | CreateAlert | CreateReminder => Verb::Create,
        UpdateTransaction | UpdateCategory | UpdateAlert | UpdateReminder => Verb::Update,
        DeleteTransaction | DeleteCategory | DeleteAlert | DeleteReminder => Verb::Delete,
    }
}

fn collection_path(kind: MutationKind) -> &'static str {
    use MutationKind::*;
    match kind {
        CreateTransaction | UpdateTransaction | DeleteTransaction => "/transactions",
        CreateCategory | UpdateCategory | DeleteCategory => "/categories",
        CreateAlert | UpdateAlert | DeleteAlert => "/alerts",
        CreateReminder | UpdateReminder | DeleteReminder => "/reminders",
    }
}

fn required_id(item: &PendingMutation) -> Result<&str, ApiError> {
    item.payload
        .get("id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| ApiError::Configuration("queued mutation has no target id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::store::MemoryStore;
    use crate::token::TokenStore;
    use crate::transport::{HttpResponse, Method, MockTransport};
    use ledger_core::OnExhaust;
    use serde_json::json;
    use std::time::Duration;

    async fn fixture(
        transport: MockTransport,
        options: SyncOptions,
    ) -> (Arc<SyncService<MockTransport>>, MemoryStore) {
        let backing = MemoryStore::new();
        let tokens = TokenStore::new(Arc::new(backing.clone()));
        tokens.set_tokens("at", "rt", Some(u64::MAX)).await.unwrap();
        let config = ClientConfig::with_base_url("http://test.local/api").unwrap();
        let api = Arc::new(ApiClient::new(config, transport, tokens));
        let service = SyncService::new(api, Arc::new(backing.clone()), options).await;
        (service, backing)
    }

    /// Mutations POST fine, snapshot GETs return fixed content.
    fn happy_handler(transport: &MockTransport) {
        transport.set_handler(|req, _| {
            let response = match (req.method, req.url.as_str()) {
                (Method::Post, "http://test.local/api/transactions") => {
                    HttpResponse::json_body(201, &json!({"ok": true}))
                }
                (Method::Get, "http://test.local/api/transactions") => HttpResponse::json_body(
                    200,
                    &json!([{
                        "id": "tx-server",
                        "kind": "expense",
                        "amountMinor": 500,
                        "occurredAt": 1,
                        "createdAt": 2,
                    }]),
                ),
                (Method::Get, _) => HttpResponse::json_body(200, &json!([])),
                _ => HttpResponse::json_body(404, &json!({"message": "no such route"})),
            };
            Ok(response)
        });
    }

    /// POSTs always fail with a 500; snapshot GETs succeed.
    fn failing_mutation_handler(transport: &MockTransport) {
        transport.set_handler(|req, _| {
            let response = match req.method {
                Method::Post => HttpResponse::json_body(500, &json!({"message": "boom"})),
                _ => HttpResponse::json_body(200, &json!([])),
            };
            Ok(response)
        });
    }

    fn create_tx_payload(amount: i64) -> serde_json::Value {
        json!({"kind": "expense", "amountMinor": amount, "occurredAt": 1})
    }

    // ===========================================
    // Queue Behavior Tests
    // ===========================================

    #[tokio::test]
    async fn enqueue_touches_no_network() {
        let transport = MockTransport::new();
        let (service, _) = fixture(transport.clone(), SyncOptions::default()).await;

        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();

        assert_eq!(service.pending_count().await, 1);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn queue_survives_restart() {
        let transport = MockTransport::new();
        let (service, backing) = fixture(transport.clone(), SyncOptions::default()).await;
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();
        drop(service);

        // A new service over the same store sees the persisted queue
        let tokens = TokenStore::new(Arc::new(backing.clone()));
        let config = ClientConfig::with_base_url("http://test.local/api").unwrap();
        let api = Arc::new(ApiClient::new(config, transport, tokens));
        let revived = SyncService::new(api, Arc::new(backing), SyncOptions::default()).await;

        assert_eq!(revived.pending_count().await, 1);
        assert_eq!(
            revived.pending().await[0].payload["amountMinor"],
            10
        );
    }

    #[tokio::test]
    async fn replay_preserves_queue_order() {
        // Mutations queued A then B replay as A then B
        let transport = MockTransport::new();
        happy_handler(&transport);
        let (service, _) = fixture(transport.clone(), SyncOptions::default()).await;

        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(20))
            .await
            .unwrap();

        let report = service.run_sync_pass().await.unwrap();

        assert_eq!(report.synced, 2);
        assert_eq!(service.pending_count().await, 0);
        let posts: Vec<_> = transport
            .requests()
            .into_iter()
            .filter(|r| r.request.method == Method::Post)
            .collect();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].request.body.as_ref().unwrap()["amountMinor"], 10);
        assert_eq!(posts[1].request.body.as_ref().unwrap()["amountMinor"], 20);
    }

    #[tokio::test]
    async fn update_and_delete_replay_against_item_routes() {
        let transport = MockTransport::new();
        transport.set_handler(|req, _| {
            Ok(match req.method {
                Method::Get => HttpResponse::json_body(200, &json!([])),
                _ => HttpResponse::json_body(200, &json!({"ok": true})),
            })
        });
        let (service, _) = fixture(transport.clone(), SyncOptions::default()).await;

        service
            .enqueue(
                MutationKind::UpdateCategory,
                json!({"id": "cat-1", "name": "Food", "kind": "expense"}),
            )
            .await
            .unwrap();
        service
            .enqueue(MutationKind::DeleteReminder, json!({"id": "rem-9"}))
            .await
            .unwrap();

        service.run_sync_pass().await.unwrap();

        let urls: Vec<(Method, String)> = transport
            .requests()
            .into_iter()
            .filter(|r| r.request.method != Method::Get)
            .map(|r| (r.request.method, r.request.url))
            .collect();
        assert_eq!(
            urls,
            vec![
                (Method::Put, "http://test.local/api/categories/cat-1".to_string()),
                (Method::Delete, "http://test.local/api/reminders/rem-9".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn mutation_without_id_eventually_leaves_the_queue() {
        let transport = MockTransport::new();
        happy_handler(&transport);
        let options = SyncOptions {
            auto_sync: false,
            retry_policy: RetryPolicy::new(1, OnExhaust::Drop),
        };
        let (service, _) = fixture(transport, options).await;

        // An update with no id can never replay
        service
            .enqueue(MutationKind::UpdateTransaction, json!({"amountMinor": 1}))
            .await
            .unwrap();

        service.run_sync_pass().await.unwrap();
        assert_eq!(service.pending_count().await, 1);
        let report = service.run_sync_pass().await.unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(service.pending_count().await, 0);
    }

    // ===========================================
    // Retry Ceiling Tests (P5)
    // ===========================================

    #[tokio::test]
    async fn retry_ceiling_is_exact() {
        let transport = MockTransport::new();
        failing_mutation_handler(&transport);
        let options = SyncOptions {
            auto_sync: false,
            retry_policy: RetryPolicy::new(2, OnExhaust::Drop),
        };
        let (service, _) = fixture(transport.clone(), options).await;
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();

        // Pass 1 and 2: failure, requeued
        for _ in 0..2 {
            let report = service.run_sync_pass().await.unwrap();
            assert_eq!(report.requeued, 1);
            assert_eq!(service.pending_count().await, 1);
        }
        // Pass 3: ceiling reached, dropped
        let report = service.run_sync_pass().await.unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(service.pending_count().await, 0);
        assert_eq!(transport.count_matching("/transactions"), 3 + 3); // 3 POST + 3 snapshot GET

        // Pass 4: no (max+1)-th attempt
        service.run_sync_pass().await.unwrap();
        let posts = transport
            .requests()
            .into_iter()
            .filter(|r| r.request.method == Method::Post)
            .count();
        assert_eq!(posts, 3);
    }

    #[tokio::test]
    async fn exhausted_mutations_can_dead_letter() {
        let transport = MockTransport::new();
        failing_mutation_handler(&transport);
        let options = SyncOptions {
            auto_sync: false,
            retry_policy: RetryPolicy::new(0, OnExhaust::DeadLetter),
        };
        let (service, backing) = fixture(transport, options).await;
        let id = service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();

        let report = service.run_sync_pass().await.unwrap();

        assert_eq!(report.dead_lettered, 1);
        assert_eq!(service.pending_count().await, 0);
        let dead = service.dead_letter().await;
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].id, id);
        // Dead-letter list is persisted for inspection
        let raw = backing.get("deadLetterMutations").await.unwrap().unwrap();
        assert!(raw.contains(&id.to_string()));
    }

    // ===========================================
    // Cache Snapshot Tests (P6)
    // ===========================================

    #[tokio::test]
    async fn sync_pass_overwrites_cache_wholesale() {
        let transport = MockTransport::new();
        happy_handler(&transport);
        let (service, _) = fixture(transport, SyncOptions::default()).await;

        assert!(service.snapshot().await.transactions.is_empty());

        service.run_sync_pass().await.unwrap();

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.transactions.len(), 1);
        assert_eq!(snapshot.transactions[0].id, "tx-server");
        assert!(snapshot.last_sync_time.is_some());
    }

    #[tokio::test]
    async fn consecutive_passes_leave_identical_cache_content() {
        // Two passes with no intervening mutations: no duplication
        let transport = MockTransport::new();
        happy_handler(&transport);
        let (service, _) = fixture(transport, SyncOptions::default()).await;

        service.run_sync_pass().await.unwrap();
        let mut first = service.snapshot().await;
        service.run_sync_pass().await.unwrap();
        let mut second = service.snapshot().await;

        // Timestamps are bookkeeping; the cached content must be identical
        first.last_sync_time = None;
        second.last_sync_time = None;
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn snapshot_failure_reports_sync_failed() {
        let transport = MockTransport::new();
        transport.set_handler(|req, _| {
            Ok(match req.method {
                Method::Get => HttpResponse::json_body(500, &json!({"message": "down"})),
                _ => HttpResponse::json_body(200, &json!({"ok": true})),
            })
        });
        let (service, _) = fixture(transport, SyncOptions::default()).await;
        let mut rx = service.subscribe();

        let result = service.run_sync_pass().await;

        assert!(result.is_err());
        let mut saw_failure = false;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, SyncEvent::SyncFailed { .. }) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
        // Incomplete pass leaves no sync stamp
        assert!(service.snapshot().await.last_sync_time.is_none());
    }

    // ===========================================
    // Concurrency Tests
    // ===========================================

    #[tokio::test(start_paused = true)]
    async fn only_one_pass_runs_at_a_time() {
        let transport = MockTransport::new();
        happy_handler(&transport);
        transport.set_latency(Duration::from_millis(50));
        let (service, _) = fixture(transport, SyncOptions::default()).await;
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();

        let (a, b) = tokio::join!(service.run_sync_pass(), service.run_sync_pass());

        let reports = [a.unwrap(), b.unwrap()];
        assert_eq!(reports.iter().filter(|r| r.skipped).count(), 1);
        assert_eq!(reports.iter().filter(|r| !r.skipped).count(), 1);
    }

    // ===========================================
    // Connectivity and Auto-Sync Tests
    // ===========================================

    #[tokio::test]
    async fn connectivity_transitions_are_published() {
        let transport = MockTransport::new();
        let (service, _) = fixture(transport, SyncOptions::default()).await;
        let mut rx = service.subscribe();

        service.set_connectivity(true).await;
        service.set_connectivity(true).await; // duplicate, no event
        service.set_connectivity(false).await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            SyncEvent::Connectivity { online: true }
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SyncEvent::Connectivity { online: false }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_runs_debounced_pass_and_drains_queue() {
        // The full offline scenario: two expenses queued offline, then
        // connectivity returns and the debounced pass drains the queue.
        let transport = MockTransport::new();
        happy_handler(&transport);
        let (service, _) = fixture(transport.clone(), SyncOptions::default()).await;

        assert!(!service.is_online().await);
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(20))
            .await
            .unwrap();
        assert_eq!(service.pending_count().await, 2);

        let mut rx = service.subscribe();
        let before = now_millis();
        service.set_connectivity(true).await;

        // No pass until the debounce elapses
        assert_eq!(transport.requests().len(), 0);

        loop {
            match rx.recv().await.unwrap() {
                SyncEvent::SyncCompleted { synced, remaining } => {
                    assert_eq!(synced, 2);
                    assert_eq!(remaining, 0);
                    break;
                }
                _ => continue,
            }
        }

        assert_eq!(service.pending_count().await, 0);
        let posts = transport
            .requests()
            .into_iter()
            .filter(|r| r.request.method == Method::Post)
            .count();
        assert_eq!(posts, 2);
        let stamp = service.snapshot().await.last_sync_time.unwrap();
        assert!(stamp >= before);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_with_empty_queue_schedules_nothing() {
        let transport = MockTransport::new();
        let (service, _) = fixture(transport.clone(), SyncOptions::default()).await;

        service.set_connectivity(true).await;
        // Give any (wrongly) scheduled task a chance to run
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn auto_sync_disabled_never_schedules() {
        let transport = MockTransport::new();
        let options = SyncOptions {
            auto_sync: false,
            retry_policy: RetryPolicy::default(),
        };
        let (service, _) = fixture(transport.clone(), options).await;
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();

        service.set_connectivity(true).await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(transport.requests().is_empty());
    }

    // ===========================================
    // Event Bus Tests
    // ===========================================

    #[tokio::test]
    async fn pass_emits_lifecycle_events() {
        let transport = MockTransport::new();
        happy_handler(&transport);
        let (service, _) = fixture(transport, SyncOptions::default()).await;
        service
            .enqueue(MutationKind::CreateTransaction, create_tx_payload(10))
            .await
            .unwrap();
        let mut rx = service.subscribe();

        service.run_sync_pass().await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), SyncEvent::SyncStarted));
        assert!(matches!(rx.try_recv().unwrap(), SyncEvent::MutationSynced { .. }));
        assert!(matches!(
            rx.try_recv().unwrap(),
            SyncEvent::SyncCompleted { synced: 1, remaining: 0 }
        ));
    }
}
