//! Concurrency-safe map of monitored clients.
//!
//! Every read-modify-write on a client (ping, deadline evaluation, snapshot)
//! runs under one registry-wide lock. Nothing that can block (alert delivery,
//! sleeping) ever happens while that lock is held: callers get a decision back
//! and act on it after the guard is dropped.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::client::{ClientKey, ClientSnapshot, ClientState};
use crate::scheduler::DeadlineHandle;

/// Extra seconds granted on top of the client-declared interval before its
/// deadline timer fires.
pub const DEADLINE_GRACE_SECONDS: u64 = 1;

/// Delay until the deadline timer for a ping with `interval_seconds` fires.
pub fn deadline_delay(interval_seconds: u64) -> Duration {
    Duration::from_secs(interval_seconds.saturating_add(DEADLINE_GRACE_SECONDS))
}

/// Identifies one armed deadline. Carried by the timer callback instead of any
/// reference to the client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineTicket {
    pub key: ClientKey,
    pub generation: u64,
}

/// Result of [`Registry::record_ping`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingOutcome {
    /// First ping ever seen for this key.
    pub registered: bool,
    /// The client had been marked offline; the caller owes a recovery alert.
    pub was_offline: bool,
    pub last_ping: DateTime<Utc>,
}

/// Result of [`Registry::evaluate_deadline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineVerdict {
    /// Deadline really missed; the client was just marked offline.
    Expired(ClientSnapshot),
    /// A newer ping moved the deadline forward.
    Fresh,
    /// Already offline, nothing to announce twice.
    AlreadyOffline,
    /// Key is not tracked.
    Unknown,
}

#[derive(Debug, Default)]
pub struct Registry {
    clients: Mutex<BTreeMap<ClientKey, ClientState>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a ping for `key` at `now` and re-arm its deadline.
    ///
    /// The previous deadline (if any) is cancelled before `arm` is asked for a
    /// new one, all under the lock, so at most one live timer exists per key.
    /// `arm` runs with the lock held and must not touch the registry.
    pub fn record_ping<F>(
        &self,
        key: &ClientKey,
        interval_seconds: u64,
        now: DateTime<Utc>,
        arm: F,
    ) -> PingOutcome
    where
        F: FnOnce(DeadlineTicket, Duration) -> DeadlineHandle,
    {
        let mut clients = self.clients.lock();

        let registered = !clients.contains_key(key);
        let state = clients.entry(key.clone()).or_insert_with(|| ClientState::new(now));

        if let Some(previous) = state.pending.take() {
            previous.cancel();
        }

        state.last_ping = now;
        state.interval_seconds = interval_seconds;

        let was_offline = !state.online;
        state.online = true;

        state.generation += 1;
        let ticket = DeadlineTicket { key: key.clone(), generation: state.generation };
        state.pending = Some(arm(ticket, deadline_delay(interval_seconds)));

        PingOutcome { registered, was_offline, last_ping: now }
    }

    /// Decide what a fired deadline means, re-reading the state at `now`.
    ///
    /// Only an online client whose `last_ping + interval` is strictly before
    /// `now` goes offline. Firings that raced with a ping see the refreshed
    /// timestamp and come back as [`DeadlineVerdict::Fresh`].
    pub fn evaluate_deadline(&self, ticket: &DeadlineTicket, now: DateTime<Utc>) -> DeadlineVerdict {
        let mut clients = self.clients.lock();

        let Some(state) = clients.get_mut(&ticket.key) else {
            return DeadlineVerdict::Unknown;
        };

        // A superseded ticket must not drop the handle of the live timer.
        if state.generation == ticket.generation {
            state.pending = None;
        }

        if !state.online {
            return DeadlineVerdict::AlreadyOffline;
        }

        if !state.is_overdue(now) {
            return DeadlineVerdict::Fresh;
        }

        state.online = false;
        DeadlineVerdict::Expired(state.snapshot(&ticket.key))
    }

    /// Consistent copy of every tracked client, ordered by key.
    pub fn snapshot(&self) -> Vec<ClientSnapshot> {
        self.clients.lock().iter().map(|(key, state)| state.snapshot(key)).collect()
    }

    pub fn get(&self, key: &ClientKey) -> Option<ClientSnapshot> {
        self.clients.lock().get(key).map(|state| state.snapshot(key))
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }

    /// Cancel every pending deadline and return how many were live.
    /// Client state itself is left alone.
    pub fn cancel_all(&self) -> usize {
        let mut clients = self.clients.lock();
        let mut cancelled = 0;

        for state in clients.values_mut() {
            if let Some(pending) = state.pending.take() {
                if !pending.is_finished() {
                    cancelled += 1;
                }
                pending.cancel();
            }
        }

        cancelled
    }
}
