//! Event kinds and typed payloads.
//!
//! Payloads are strongly typed per kind. The flat string-keyed map form is
//! only produced at serialization boundaries via [`Event::to_payload`].

use dig_types::{ArtifactId, DaemonId, NodeId, NodeKind, ResourceKind, Visibility};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Closed enumeration of event types. Subscriptions are keyed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// A player command was accepted for execution.
    CommandEntered,
    /// A scan began.
    ScanStarted,
    /// A scan finished (always follows a resolved scan target).
    ScanComplete,
    /// A carve began.
    CarveStarted,
    /// A carve finished, successfully or not.
    CarveComplete,
    /// An artifact reconstruction began.
    ReconstructStarted,
    /// An artifact reconstruction finished, successfully or not.
    ReconstructComplete,
    /// A node's visibility advanced.
    NodeRevealed,
    /// A node's corruption crossed a threshold.
    NodeCorrupted,
    /// A scan fully revealed a file carrying an artifact.
    ArtifactFound,
    /// A daemon became suspicious.
    DaemonSpotted,
    /// A daemon entered the alert state.
    DaemonAlert,
    /// A daemon was permanently pacified.
    DaemonPacified,
    /// A resource gauge changed.
    ResourceChanged,
    /// A resource gauge was spent down to zero.
    ResourceDepleted,
    /// A collected artifact was sold.
    ArtifactSold,
    /// The turn counter advanced.
    TurnAdvanced,
    /// The player asked to end the session.
    QuitRequested,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::CommandEntered,
        Self::ScanStarted,
        Self::ScanComplete,
        Self::CarveStarted,
        Self::CarveComplete,
        Self::ReconstructStarted,
        Self::ReconstructComplete,
        Self::NodeRevealed,
        Self::NodeCorrupted,
        Self::ArtifactFound,
        Self::DaemonSpotted,
        Self::DaemonAlert,
        Self::DaemonPacified,
        Self::ResourceChanged,
        Self::ResourceDepleted,
        Self::ArtifactSold,
        Self::TurnAdvanced,
        Self::QuitRequested,
    ];
}

/// When an event becomes eligible for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// Dispatched by the next `flush`.
    #[default]
    Immediate,
    /// Held until the next `advance_turn`.
    Deferred,
}

/// Typed payload, one variant per [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// See [`EventKind::CommandEntered`].
    CommandEntered {
        /// Command text as entered.
        command: String,
    },
    /// See [`EventKind::ScanStarted`].
    ScanStarted {
        /// Target name, or `*` for a sweep of the current directory.
        target: String,
    },
    /// See [`EventKind::ScanComplete`].
    ScanComplete {
        /// The scanned node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Visibility after the scan.
        visibility: Visibility,
        /// Whether visibility advanced.
        changed: bool,
    },
    /// See [`EventKind::CarveStarted`].
    CarveStarted {
        /// Target name.
        target: String,
    },
    /// See [`EventKind::CarveComplete`].
    CarveComplete {
        /// The carved node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Whether the debris became a file.
        success: bool,
        /// Node corruption at the time of the attempt.
        corruption: f64,
    },
    /// See [`EventKind::ReconstructStarted`].
    ReconstructStarted {
        /// Artifact being reconstructed.
        artifact: ArtifactId,
    },
    /// See [`EventKind::ReconstructComplete`].
    ReconstructComplete {
        /// Artifact being reconstructed.
        artifact: ArtifactId,
        /// Whether the artifact was collected.
        success: bool,
        /// Failure reason, absent on success.
        reason: Option<String>,
        /// Frozen condition on success.
        condition: Option<f64>,
    },
    /// See [`EventKind::NodeRevealed`].
    NodeRevealed {
        /// The node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Its kind.
        kind: NodeKind,
        /// Visibility after the step.
        visibility: Visibility,
    },
    /// See [`EventKind::NodeCorrupted`].
    NodeCorrupted {
        /// The node.
        node: NodeId,
        /// Its display name.
        name: String,
        /// Corruption after the tick.
        corruption: f64,
        /// The boundary that was crossed.
        threshold: f64,
    },
    /// See [`EventKind::ArtifactFound`].
    ArtifactFound {
        /// The file holding the artifact.
        node: NodeId,
        /// Its display name.
        name: String,
        /// The artifact surfaced.
        artifact: ArtifactId,
    },
    /// See [`EventKind::DaemonSpotted`].
    DaemonSpotted {
        /// The daemon.
        daemon: DaemonId,
        /// Its display name.
        name: String,
        /// Where it is.
        node: NodeId,
        /// Alert level after perception.
        alert_level: f64,
    },
    /// See [`EventKind::DaemonAlert`].
    DaemonAlert {
        /// The daemon.
        daemon: DaemonId,
        /// Its display name.
        name: String,
        /// Where it is.
        node: NodeId,
        /// Alert level after perception.
        alert_level: f64,
    },
    /// See [`EventKind::DaemonPacified`].
    DaemonPacified {
        /// The daemon.
        daemon: DaemonId,
        /// Its display name.
        name: String,
    },
    /// See [`EventKind::ResourceChanged`].
    ResourceChanged {
        /// Which gauge.
        resource: ResourceKind,
        /// Signed change applied to `current`.
        delta: f64,
        /// Value after the change.
        current: f64,
        /// Gauge maximum after the change.
        maximum: f64,
        /// `current / maximum`.
        ratio: f64,
        /// Who caused the change.
        source: String,
    },
    /// See [`EventKind::ResourceDepleted`].
    ResourceDepleted {
        /// Which gauge hit zero.
        resource: ResourceKind,
        /// Who spent the last of it.
        source: String,
    },
    /// See [`EventKind::ArtifactSold`].
    ArtifactSold {
        /// The artifact.
        artifact: ArtifactId,
        /// Value credited.
        value: Decimal,
        /// Currency total after the sale.
        currency: Decimal,
    },
    /// See [`EventKind::TurnAdvanced`].
    TurnAdvanced {
        /// The new turn number.
        turn: u64,
    },
    /// See [`EventKind::QuitRequested`].
    QuitRequested,
}

impl EventPayload {
    /// The subscription key for this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::CommandEntered { .. } => EventKind::CommandEntered,
            Self::ScanStarted { .. } => EventKind::ScanStarted,
            Self::ScanComplete { .. } => EventKind::ScanComplete,
            Self::CarveStarted { .. } => EventKind::CarveStarted,
            Self::CarveComplete { .. } => EventKind::CarveComplete,
            Self::ReconstructStarted { .. } => EventKind::ReconstructStarted,
            Self::ReconstructComplete { .. } => EventKind::ReconstructComplete,
            Self::NodeRevealed { .. } => EventKind::NodeRevealed,
            Self::NodeCorrupted { .. } => EventKind::NodeCorrupted,
            Self::ArtifactFound { .. } => EventKind::ArtifactFound,
            Self::DaemonSpotted { .. } => EventKind::DaemonSpotted,
            Self::DaemonAlert { .. } => EventKind::DaemonAlert,
            Self::DaemonPacified { .. } => EventKind::DaemonPacified,
            Self::ResourceChanged { .. } => EventKind::ResourceChanged,
            Self::ResourceDepleted { .. } => EventKind::ResourceDepleted,
            Self::ArtifactSold { .. } => EventKind::ArtifactSold,
            Self::TurnAdvanced { .. } => EventKind::TurnAdvanced,
            Self::QuitRequested => EventKind::QuitRequested,
        }
    }
}

/// An immutable message on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    payload: EventPayload,
    timing: Timing,
    source: Option<String>,
}

impl Event {
    /// An event for the next flush.
    pub const fn immediate(payload: EventPayload) -> Self {
        Self {
            payload,
            timing: Timing::Immediate,
            source: None,
        }
    }

    /// An event held until the next turn boundary.
    pub const fn deferred(payload: EventPayload) -> Self {
        Self {
            payload,
            timing: Timing::Deferred,
            source: None,
        }
    }

    /// Tag the event with the subsystem that produced it.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The event's kind.
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// The typed payload.
    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Delivery timing.
    pub const fn timing(&self) -> Timing {
        self.timing
    }

    /// Diagnostic source tag, if any.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Flatten the payload into a string-keyed map. The `type` key holds the
    /// event kind.
    pub fn to_payload(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(&self.payload)? {
            Value::Object(map) => Ok(map),
            other => {
                let mut map = Map::new();
                map.insert(String::from("value"), other);
                Ok(map)
            }
        }
    }
}
