use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::DeadlineHandle;

/// Identity of one monitored client: where alerts go, and what the client
/// calls itself. Two pings with the same pair always refer to the same entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientKey {
    pub email: String,
    pub client: String,
}

impl ClientKey {
    pub fn new(email: impl Into<String>, client: impl Into<String>) -> Self {
        Self { email: email.into(), client: client.into() }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.email, self.client)
    }
}

/// Mutable record kept by the [`Registry`](crate::Registry) for every key.
///
/// Only reachable through the registry lock.
#[derive(Debug)]
pub(crate) struct ClientState {
    pub(crate) last_ping: DateTime<Utc>,
    pub(crate) interval_seconds: u64,
    pub(crate) online: bool,
    /// Bumped each time a new deadline is armed.
    pub(crate) generation: u64,
    pub(crate) pending: Option<DeadlineHandle>,
}

impl ClientState {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self { last_ping: now, interval_seconds: 0, online: true, generation: 0, pending: None }
    }

    /// Instant after which the client counts as missing, `None` when the
    /// interval is too large to represent.
    pub(crate) fn deadline(&self) -> Option<DateTime<Utc>> {
        let interval = i64::try_from(self.interval_seconds).ok()?;
        self.last_ping.checked_add_signed(TimeDelta::try_seconds(interval)?)
    }

    pub(crate) fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| deadline < now)
    }

    pub(crate) fn snapshot(&self, key: &ClientKey) -> ClientSnapshot {
        ClientSnapshot {
            key: key.clone(),
            interval_seconds: self.interval_seconds,
            last_ping: self.last_ping,
            online: self.online,
            deadline_armed: self.pending.as_ref().is_some_and(|pending| !pending.is_finished()),
        }
    }
}

/// Point-in-time copy of a [`ClientState`], safe to hand out of the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSnapshot {
    pub key: ClientKey,
    pub interval_seconds: u64,
    pub last_ping: DateTime<Utc>,
    pub online: bool,
    /// Whether a deadline timer was still pending when the copy was taken.
    pub deadline_armed: bool,
}
