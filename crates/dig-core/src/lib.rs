//! Configuration, action dispatch, and the turn pipeline for the dig-site
//! simulation.
//!
//! A [`DigSession`] wires the subsystems of the lower crates around one
//! shared event bus. A turn consists of one player [`Action`] followed by
//! [`DigSession::end_turn`], which advances the bus, decays the site,
//! drains energy, runs the daemons, and flushes every queued event.
//!
//! # Modules
//!
//! - [`config`] -- [`SimulationConfig`] loaded from `dig-config.yaml`.
//! - [`action`] -- Player [`Action`]s, their resource [`ActionCosts`], and
//!   the [`ActionOutcome`] a UI renders.
//! - [`session`] -- [`DigSession`]: construction and the turn pipeline.
//! - [`error`] -- [`SessionError`], wrapping the lower crates' faults.

pub mod action;
pub mod config;
pub mod error;
pub mod session;

// Re-export primary types at crate root.
pub use action::{Action, ActionCost, ActionCosts, ActionEffect, ActionOutcome, ActionParseError};
pub use config::{ConfigError, SimulationConfig};
pub use error::SessionError;
pub use session::{DigSession, TurnSummary};
