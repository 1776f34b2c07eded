//! Event bus for the dig-site simulation.
//!
//! Every subsystem talks to the outside world (and to each other) by posting
//! [`Event`]s onto a shared [`EventBus`]. The bus is constructed explicitly
//! and handed to each component; there is no global instance.
//!
//! # Modules
//!
//! - [`event`] -- The closed set of event kinds and their typed payloads.
//! - [`bus`] -- Immediate and deferred delivery, breadth-first flushing.
//! - [`error`] -- Subscriber fault type.

pub mod bus;
pub mod error;
pub mod event;

pub use bus::{EventBus, Handler, SubscriptionId};
pub use error::HandlerError;
pub use event::{Event, EventKind, EventPayload, Timing};
