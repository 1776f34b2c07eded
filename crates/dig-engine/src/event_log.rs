//! Bus subscriber that writes every delivered event to the log.
//!
//! Each event is flattened with [`Event::to_payload`] and emitted as one
//! structured `tracing` record. Gameplay milestones go out at `info`, the
//! rest at `debug`. Delivered events are also tallied per kind for the
//! end-of-run report.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use dig_events::{Event, EventBus, EventKind, HandlerError, SubscriptionId};
use tracing::{debug, info};

/// Per-kind delivery counts, shared with the bus subscription.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    counts: Rc<RefCell<BTreeMap<EventKind, u64>>>,
    subscription: Option<SubscriptionId>,
}

impl EventLog {
    /// Subscribe to every kind on `bus`.
    pub fn attach(bus: &EventBus) -> Self {
        let counts: Rc<RefCell<BTreeMap<EventKind, u64>>> = Rc::default();
        let tally = Rc::clone(&counts);
        let subscription = bus.subscribe_all(move |event, bus| {
            {
                let mut counts = tally.borrow_mut();
                let entry = counts.entry(event.kind()).or_insert(0);
                *entry = entry.saturating_add(1);
            }
            record(event, bus.turn())
        });
        Self {
            counts,
            subscription: Some(subscription),
        }
    }

    /// How many events of `kind` were delivered.
    pub fn count(&self, kind: EventKind) -> u64 {
        self.counts.borrow().get(&kind).copied().unwrap_or(0)
    }

    /// Total events delivered.
    pub fn total(&self) -> u64 {
        self.counts
            .borrow()
            .values()
            .fold(0_u64, |sum, n| sum.saturating_add(*n))
    }

    /// Snapshot of every non-zero count.
    pub fn counts(&self) -> BTreeMap<EventKind, u64> {
        self.counts.borrow().clone()
    }

    /// Stop logging. Returns whether a subscription was removed.
    pub fn detach(&mut self, bus: &EventBus) -> bool {
        self.subscription
            .take()
            .is_some_and(|id| bus.unsubscribe_all(id) > 0)
    }
}

const fn is_milestone(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::ArtifactFound
            | EventKind::ReconstructComplete
            | EventKind::ArtifactSold
            | EventKind::DaemonSpotted
            | EventKind::DaemonAlert
            | EventKind::DaemonPacified
            | EventKind::ResourceDepleted
            | EventKind::QuitRequested
    )
}

fn record(event: &Event, turn: u64) -> Result<(), HandlerError> {
    let payload = event
        .to_payload()
        .map_err(|e| HandlerError::new(format!("payload export failed: {e}")))?;
    let payload = serde_json::Value::Object(payload);
    let kind = event.kind();
    let source = event.source().unwrap_or("-");
    if is_milestone(kind) {
        info!(turn, ?kind, source, %payload, "event");
    } else {
        debug!(turn, ?kind, source, %payload, "event");
    }
    Ok(())
}
