//! Daemon AI for the dig-site simulation.
//!
//! Daemons are hostile agents that live on the node tree. Each tick every
//! active daemon perceives the player by hop distance, escalates or calms
//! its alert level, moves (pursuit when alerted, patrol otherwise), drains
//! power on contact, and corrupts the node it stands on.
//!
//! # Modules
//!
//! - [`config`] -- [`DaemonConfig`]: the spawn roster and every tuning
//!   constant of the perception/movement/contact loop.
//! - [`graph`] -- Breadth-first hop distance and one-step pursuit over
//!   the tree.
//! - [`daemon`] -- The [`Daemon`] record and its spawn description.
//! - [`sentinel`] -- [`SentinelAi`]: owns the daemons and runs the tick.
//! - [`spawn`] -- Seeded placement of a roster on a generated site.
//! - [`error`] -- Unknown nodes and daemons.

pub mod config;
pub mod daemon;
pub mod error;
pub mod graph;
pub mod sentinel;
pub mod spawn;

// Re-export primary types at crate root.
pub use config::{DaemonConfig, RosterEntry};
pub use daemon::{Daemon, DaemonSpec};
pub use error::AgentError;
pub use graph::{UNREACHABLE, hop_distance, step_toward};
pub use sentinel::{SentinelAi, TickReport};
pub use spawn::spawn_roster;
