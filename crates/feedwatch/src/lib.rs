//! feedwatch - dead-man's-switch watchdog core.
//!
//! Remote clients ping to prove they are alive and declare how long until
//! their next ping. Each ping re-arms a per-client deadline timer; when one
//! fires and the client is still overdue it is marked offline and an alert is
//! raised. The next ping brings it back online with a recovery alert.
//!
//! - [`Registry`]: the locked client map with atomic ping/re-arm and
//!   deadline evaluation
//! - [`DeadlineScheduler`]: one-shot cancellable timers ([`TokioScheduler`])
//! - [`Watchdog`]: ties registry, scheduler, clock and [`AlertSink`] together
//! - [`StatsReport`]: the reporting view

pub mod alert;
pub mod client;
pub mod clock;
pub mod error;
mod evaluator;
pub mod registry;
pub mod scheduler;
pub mod stats;
pub mod watchdog;

pub use alert::{Alert, AlertKind, AlertSink, LogSink, MemorySink, SendmailSink};
pub use client::{ClientKey, ClientSnapshot};
pub use clock::{Clock, MonotonicClock, SystemClock};
pub use error::{AlertError, Error};
pub use registry::{
    DEADLINE_GRACE_SECONDS, DeadlineTicket, DeadlineVerdict, PingOutcome, Registry, deadline_delay,
};
pub use scheduler::{DeadlineHandle, DeadlineScheduler, TokioScheduler};
pub use stats::{StatsEntry, StatsReport};
pub use watchdog::Watchdog;
