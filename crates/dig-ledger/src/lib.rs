//! Resource and artifact economy for the dig-site simulation.
//!
//! Every player action is paid for out of three capped gauges (power,
//! memory, energy) held by the [`ResourceLedger`]. Spending is
//! all-or-nothing: a consume either succeeds in full or leaves the gauge
//! untouched. The [`ArtifactRegistry`] tracks each artifact through
//! `UNDISCOVERED -> FOUND -> COLLECTED -> SOLD`, reserving memory while an
//! artifact is held and crediting currency when it is sold.
//!
//! # Modules
//!
//! - [`resources`] -- The three gauges, spend/restore, passive drain.
//! - [`artifact`] -- Artifact records, lifecycle transitions, valuation.
//! - [`error`] -- Usage faults and collection failures.
//!
//! Currency uses [`rust_decimal::Decimal`] so repeated sales never
//! accumulate floating-point drift.

pub mod artifact;
pub mod error;
pub mod resources;

// Re-export primary types at crate root.
pub use artifact::{
    Artifact, ArtifactEconomy, ArtifactRegistry, CollectReceipt, DEFAULT_BASE_VALUE,
    DEFAULT_MEMORY_COST,
};
pub use error::{CollectFailure, LedgerError};
pub use resources::{ResourceGauge, ResourceLedger, ResourceLimits};
