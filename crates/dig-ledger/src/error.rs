//! Error types for the `dig-ledger` crate.
//!
//! [`LedgerError`] is a usage fault: the caller passed an amount that can
//! never be valid. [`CollectFailure`] is an expected gameplay outcome of
//! trying to reconstruct an artifact.

use dig_types::{ArtifactId, ArtifactState, ResourceKind};

/// Invalid arguments to a ledger or registry operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    /// Amounts must be finite and non-negative.
    #[error("invalid {resource} amount: {amount}")]
    InvalidAmount {
        /// The gauge addressed.
        resource: ResourceKind,
        /// The rejected amount.
        amount: f64,
    },

    /// A gauge maximum must be finite and positive.
    #[error("invalid {resource} maximum: {maximum}")]
    InvalidMaximum {
        /// The gauge addressed.
        resource: ResourceKind,
        /// The rejected maximum.
        maximum: f64,
    },

    /// An economy or drain setting is out of range.
    #[error("invalid setting {name}: {value}")]
    InvalidSetting {
        /// Setting name.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Why an artifact could not be collected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CollectFailure {
    /// No artifact with this id is registered.
    #[error("unknown artifact {0}")]
    UnknownArtifact(ArtifactId),

    /// Only `FOUND` artifacts can be collected.
    #[error("artifact {artifact} is {state:?}, expected FOUND")]
    WrongState {
        /// The artifact.
        artifact: ArtifactId,
        /// Its current state.
        state: ArtifactState,
    },

    /// The memory gauge cannot hold another artifact.
    #[error("insufficient memory for {artifact}: need {required}, have {available}")]
    InsufficientMemory {
        /// The artifact.
        artifact: ArtifactId,
        /// Memory required.
        required: f64,
        /// Memory available.
        available: f64,
    },

    /// The memory charge itself was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl CollectFailure {
    /// Short machine-readable reason, used in event payloads.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::UnknownArtifact(_) => "unknown_artifact",
            Self::WrongState { .. } => "wrong_state",
            Self::InsufficientMemory { .. } => "insufficient_memory",
            Self::Ledger(_) => "ledger_fault",
        }
    }
}
