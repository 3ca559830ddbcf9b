use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::alert::{Alert, AlertSink};
use crate::client::{ClientKey, ClientSnapshot};
use crate::clock::Clock;
use crate::error::Error;
use crate::evaluator::Evaluator;
use crate::registry::{PingOutcome, Registry};
use crate::scheduler::DeadlineScheduler;

/// The dead-man's switch: accepts pings, keeps one deadline per client and
/// raises alerts on offline/online transitions.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Watchdog {
    scheduler: Arc<dyn DeadlineScheduler>,
    evaluator: Arc<Evaluator>,
}

impl Watchdog {
    /// Build a watchdog whose alerts are delivered on the current tokio runtime.
    pub fn new(
        scheduler: Arc<dyn DeadlineScheduler>,
        sink: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, Error> {
        Ok(Self::with_runtime(scheduler, sink, clock, Handle::try_current()?))
    }

    pub fn with_runtime(
        scheduler: Arc<dyn DeadlineScheduler>,
        sink: Arc<dyn AlertSink>,
        clock: Arc<dyn Clock>,
        runtime: Handle,
    ) -> Self {
        let evaluator = Evaluator { registry: Registry::new(), sink, clock, runtime };
        Self { scheduler, evaluator: Arc::new(evaluator) }
    }

    /// Record a liveness ping for `key` and push its deadline out to
    /// `interval_seconds + 1` seconds from now.
    ///
    /// Sends a recovery alert when the client had been offline.
    pub fn ping(&self, key: ClientKey, interval_seconds: u64) -> PingOutcome {
        let now = self.evaluator.clock.now();
        let evaluator: Weak<Evaluator> = Arc::downgrade(&self.evaluator);

        let outcome = self.evaluator.registry.record_ping(&key, interval_seconds, now, |ticket, delay| {
            self.scheduler.arm(
                delay,
                Box::new(move || {
                    if let Some(evaluator) = evaluator.upgrade() {
                        evaluator.on_deadline(&ticket);
                    }
                }),
            )
        });

        if outcome.registered {
            info!("registering new client {key} with interval {interval_seconds}");
        } else {
            debug!("handling ping for client {key} with interval {interval_seconds}");
        }

        if outcome.was_offline {
            info!("client {key} is back online");
            self.evaluator.dispatch(Alert::recovered(key, outcome.last_ping));
        }

        outcome
    }

    /// Copy of every tracked client, for reporting.
    pub fn snapshot(&self) -> Vec<ClientSnapshot> {
        self.evaluator.registry.snapshot()
    }

    pub fn registry(&self) -> &Registry {
        &self.evaluator.registry
    }

    /// Cancel all pending deadlines so nothing fires after the server stops.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.evaluator.registry.cancel_all();
        debug!(cancelled, "cancelled pending deadlines");
        cancelled
    }
}
