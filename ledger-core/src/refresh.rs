//! Single-flight token refresh coordination.
//!
//! This module provides a pure, side-effect-free gate for the token
//! refresh path. When several in-flight requests observe a 401 with the
//! same expired token, exactly one of them performs the refresh call; the
//! rest subscribe and share its outcome.
//!
//! The gate is a plain value owned by the client instance - not a module
//! global - so multiple independent clients can coexist in one process
//! and the logic is testable without async machinery. The actual refresh
//! I/O and waiter wake-ups are performed by `ledger-client`, which maps
//! each [`WaiterId`] ticket to a channel.

/// Ticket identifying one waiting request.
///
/// Issued by [`RefreshGate::observe_unauthorized`] when a refresh is
/// already in flight; redeemed when [`RefreshGate::complete`] drains the
/// waiter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaiterId(u64);

impl WaiterId {
    /// Numeric value of the ticket (for map keys).
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// What a request that observed a 401 must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// No refresh is in flight: this request performs the refresh call
    /// and then calls [`RefreshGate::complete`] with the outcome.
    Lead,
    /// A refresh is already in flight: wait on the issued ticket and
    /// replay (or fail) with the shared outcome.
    Follow(WaiterId),
}

/// Single-slot in-flight refresh holder with a waiter list.
///
/// Invariant: while a refresh is in flight, no second refresh is started;
/// every 401-observer in that window becomes a waiter and all waiters see
/// the same outcome.
#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: bool,
    waiters: Vec<WaiterId>,
    next_ticket: u64,
}

impl RefreshGate {
    /// Create a gate with no refresh in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a request observed a 401.
    ///
    /// The first observer becomes the leader and owns the refresh call;
    /// subsequent observers are issued waiter tickets until the leader
    /// calls [`complete`](Self::complete).
    pub fn observe_unauthorized(&mut self) -> RefreshDecision {
        if !self.in_flight {
            self.in_flight = true;
            RefreshDecision::Lead
        } else {
            let ticket = WaiterId(self.next_ticket);
            self.next_ticket += 1;
            self.waiters.push(ticket);
            RefreshDecision::Follow(ticket)
        }
    }

    /// Close the in-flight slot and drain the waiter list.
    ///
    /// The caller (the leader) delivers the shared outcome - success with
    /// a new token, or failure - to every returned ticket. Calling this
    /// without a refresh in flight returns an empty list.
    pub fn complete(&mut self) -> Vec<WaiterId> {
        self.in_flight = false;
        std::mem::take(&mut self.waiters)
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight
    }

    /// Number of requests currently waiting on the in-flight refresh.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }
}
