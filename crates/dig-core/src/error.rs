//! Error types for the dig-core crate.
//!
//! Player-facing failures (missing targets, unaffordable actions, failed
//! carves) are not errors: they come back as an unsuccessful
//! [`ActionOutcome`](crate::ActionOutcome). [`SessionError`] covers the
//! faults that stop a session from being built or indicate a usage bug.

use dig_agents::AgentError;
use dig_ledger::LedgerError;
use dig_world::WorldError;

use crate::config::ConfigError;

/// Faults raised while building or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The configuration could not be resolved.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The site tree could not be generated.
    #[error("site generation failed: {0}")]
    World(#[from] WorldError),

    /// A ledger rejected a setting or amount.
    #[error("ledger fault: {0}")]
    Ledger(#[from] LedgerError),

    /// Daemon placement failed.
    #[error("daemon fault: {0}")]
    Agent(#[from] AgentError),
}
