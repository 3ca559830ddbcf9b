use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::alert::{self, Alert, AlertSink};
use crate::clock::Clock;
use crate::registry::{DeadlineTicket, DeadlineVerdict, Registry};

/// Body of every fired deadline timer, plus the collaborators it needs.
pub(crate) struct Evaluator {
    pub(crate) registry: Registry,
    pub(crate) sink: Arc<dyn AlertSink>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) runtime: Handle,
}

impl Evaluator {
    /// Re-check the client behind `ticket` and announce it offline if the
    /// deadline is still missed now. The alert leaves on its own task.
    pub(crate) fn on_deadline(&self, ticket: &DeadlineTicket) {
        let now = self.clock.now();

        match self.registry.evaluate_deadline(ticket, now) {
            DeadlineVerdict::Expired(snapshot) => {
                info!("client {} missed check-in!", snapshot.key);
                self.dispatch(Alert::offline(snapshot.key, snapshot.last_ping));
            }
            verdict => {
                debug!(client = %ticket.key, generation = ticket.generation, ?verdict, "spurious wakeup!");
            }
        }
    }

    pub(crate) fn dispatch(&self, alert: Alert) {
        alert::dispatch(&self.runtime, Arc::clone(&self.sink), alert);
    }
}
