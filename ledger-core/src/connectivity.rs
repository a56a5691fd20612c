//! Connectivity state machine - NO I/O, just state transitions.
//!
//! Takes connectivity events as input and produces a new state plus a
//! list of actions to execute. The actual timer scheduling and listener
//! notification is performed by `ledger-client`, not by this module.
//!
//! The debounce on the offline→online transition exists so a flaky
//! connection that bounces several times a second does not start a sync
//! pass per bounce.

use crate::backoff::SYNC_DEBOUNCE;
use std::time::Duration;

/// Whether the device currently has network connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// No network; mutations are queued locally.
    Offline,
    /// Network available; sync passes may run.
    Online,
}

impl ConnectivityState {
    /// Create a new state machine, assumed offline until told otherwise.
    pub fn new() -> Self {
        Self::Offline
    }

    /// Whether the device is online.
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }

    /// Process a connectivity event and return the new state plus actions.
    ///
    /// This is a pure function - no side effects. The caller executes the
    /// returned actions (notifying listeners, arming the debounce timer).
    pub fn on_event(self, event: ConnectivityEvent, ctx: SyncContext) -> (Self, Vec<ConnectivityAction>) {
        match (self, event) {
            (Self::Offline, ConnectivityEvent::CameOnline) => {
                let mut actions = vec![ConnectivityAction::NotifyListeners { online: true }];
                if ctx.auto_sync && ctx.pending_count > 0 {
                    actions.push(ConnectivityAction::ScheduleSyncPass {
                        delay: SYNC_DEBOUNCE,
                    });
                }
                (Self::Online, actions)
            }
            (Self::Online, ConnectivityEvent::WentOffline) => (
                Self::Offline,
                vec![ConnectivityAction::NotifyListeners { online: false }],
            ),
            // Duplicate reports don't re-notify or re-arm the debounce
            (state, _) => (state, vec![]),
        }
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::new()
    }
}

/// Connectivity transitions reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The device gained network connectivity.
    CameOnline,
    /// The device lost network connectivity.
    WentOffline,
}

/// Context the state machine needs to decide whether to schedule a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncContext {
    /// Whether automatic syncing on reconnect is enabled.
    pub auto_sync: bool,
    /// Number of pending mutations in the queue.
    pub pending_count: usize,
}

/// Actions to be executed by the sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityAction {
    /// Publish the new connectivity status to subscribers.
    NotifyListeners {
        /// The status to publish.
        online: bool,
    },
    /// Arm the debounce timer; run a sync pass when it fires.
    ScheduleSyncPass {
        /// Debounce delay before the pass starts.
        delay: Duration,
    },
}
