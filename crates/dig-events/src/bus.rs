//! The event bus.
//!
//! Delivery contract:
//!
//! - [`EventBus::post`] queues immediate events for the next flush and
//!   stages deferred events for the next turn.
//! - [`EventBus::advance_turn`] promotes staged events (FIFO) and posts a
//!   `TurnAdvanced` event carrying the new turn number.
//! - [`EventBus::flush`] dispatches pending events in post order to
//!   subscribers in subscription order. Events posted by handlers during a
//!   flush join the same queue and are delivered by the same call
//!   (breadth-first). A nested flush is a no-op.
//!
//! All methods take `&self` so that handlers, which receive the bus, can
//! post follow-up events while a flush is in progress.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::HandlerError;
use crate::event::{Event, EventKind, EventPayload, Timing};

/// A subscriber callback. Receives the event and the bus it came from.
pub type Handler = Rc<dyn Fn(&Event, &EventBus) -> Result<(), HandlerError>>;

/// Token returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Publish/subscribe bus with immediate and deferred delivery.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<BTreeMap<EventKind, Vec<(SubscriptionId, Handler)>>>,
    pending: RefCell<VecDeque<Event>>,
    deferred: RefCell<Vec<Event>>,
    flushing: Cell<bool>,
    turn: Cell<u64>,
    next_subscription: Cell<u64>,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("turn", &self.turn.get())
            .field("pending", &self.pending_count())
            .field("deferred", &self.deferred_count())
            .field("flushing", &self.flushing.get())
            .finish_non_exhaustive()
    }
}

/// Clears the re-entrancy flag when a flush ends, however it ends.
struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl EventBus {
    /// Create an empty bus at turn 0.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register `handler` for events of `kind`. Handlers for one kind run in
    /// registration order.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Event, &Self) -> Result<(), HandlerError> + 'static,
    {
        let id = self.allocate_subscription();
        let handler: Handler = Rc::new(handler);
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, handler));
        debug!(?kind, subscription = id.0, "subscribed");
        id
    }

    /// Register one handler for every event kind under a single token.
    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&Event, &Self) -> Result<(), HandlerError> + 'static,
    {
        let id = self.allocate_subscription();
        let handler: Handler = Rc::new(handler);
        let mut subscribers = self.subscribers.borrow_mut();
        for kind in EventKind::ALL {
            subscribers
                .entry(kind)
                .or_default()
                .push((id, Rc::clone(&handler)));
        }
        debug!(subscription = id.0, "subscribed to all kinds");
        id
    }

    /// Remove a subscription for one kind. Returns whether anything was
    /// removed.
    pub fn unsubscribe(&self, kind: EventKind, subscription: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let Some(handlers) = subscribers.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != subscription);
        handlers.len() != before
    }

    /// Remove a subscription from every kind it is registered for. Returns
    /// the number of registrations removed.
    pub fn unsubscribe_all(&self, subscription: SubscriptionId) -> usize {
        let mut removed: usize = 0;
        for handlers in self.subscribers.borrow_mut().values_mut() {
            let before = handlers.len();
            handlers.retain(|(id, _)| *id != subscription);
            removed = removed.saturating_add(before.saturating_sub(handlers.len()));
        }
        removed
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.borrow().get(&kind).map_or(0, Vec::len)
    }

    fn allocate_subscription(&self) -> SubscriptionId {
        let id = self.next_subscription.get();
        self.next_subscription.set(id.saturating_add(1));
        SubscriptionId(id)
    }

    // -----------------------------------------------------------------------
    // Posting and delivery
    // -----------------------------------------------------------------------

    /// Queue an event according to its timing.
    pub fn post(&self, event: Event) {
        trace!(kind = ?event.kind(), timing = ?event.timing(), source = event.source(), "posted");
        match event.timing() {
            Timing::Immediate => self.pending.borrow_mut().push_back(event),
            Timing::Deferred => self.deferred.borrow_mut().push(event),
        }
    }

    /// Promote all deferred events into the pending queue, then post a
    /// `TurnAdvanced` event. Returns the new turn number.
    pub fn advance_turn(&self) -> u64 {
        let turn = self.turn.get().saturating_add(1);
        self.turn.set(turn);

        let promoted: Vec<Event> = self.deferred.borrow_mut().drain(..).collect();
        let count = promoted.len();
        self.pending.borrow_mut().extend(promoted);
        self.post(Event::immediate(EventPayload::TurnAdvanced { turn }).with_source("bus"));

        debug!(turn, promoted = count, "turn advanced");
        turn
    }

    /// Deliver every pending event, including those posted by handlers
    /// while delivering. Returns the number of events dispatched; a nested
    /// call returns 0 without doing anything.
    pub fn flush(&self) -> usize {
        if self.flushing.get() {
            trace!("nested flush ignored");
            return 0;
        }
        self.flushing.set(true);
        let _guard = FlushGuard(&self.flushing);

        let mut delivered: usize = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            self.dispatch(&event);
            delivered = delivered.saturating_add(1);
        }
        delivered
    }

    fn dispatch(&self, event: &Event) {
        let kind = event.kind();
        // Snapshot so handlers may (un)subscribe while we iterate.
        let handlers: Vec<Handler> = self
            .subscribers
            .borrow()
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            trace!(?kind, "no subscribers, dropped");
            return;
        }
        for handler in handlers {
            if let Err(err) = handler(event, self) {
                warn!(?kind, error = %err, "subscriber fault; continuing dispatch");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Current turn number (0 before the first `advance_turn`).
    pub fn turn(&self) -> u64 {
        self.turn.get()
    }

    /// Events waiting for the next flush.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Events waiting for the next turn.
    pub fn deferred_count(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Whether a flush is in progress.
    pub fn is_flushing(&self) -> bool {
        self.flushing.get()
    }
}
