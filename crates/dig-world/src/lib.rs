//! The excavation world: a tree of directories, files, and debris.
//!
//! # Modules
//!
//! - [`node`] -- [`Node`] and the [`NodeTree`] arena that owns every node
//!   of one site.
//! - [`profile`] -- [`SiteProfile`]: the declarative shape of a site, with
//!   the corporate, personal, and research presets.
//! - [`generator`] -- Three-pass seeded site generation (skeleton,
//!   population, artifact seeding).
//! - [`excavation`] -- [`Excavation`]: the live view the player digs
//!   through (navigation, scanning, carving, per-turn decay).
//! - [`error`] -- Tree construction faults and excavation failures.

pub mod error;
pub mod excavation;
pub mod generator;
pub mod node;
pub mod profile;

// Re-export primary types at crate root.
pub use error::{ExcavationError, WorldError};
pub use excavation::{
    CORRUPTION_THRESHOLDS, CarveOutcome, DEFAULT_CARVE_FAIL_THRESHOLD, DEFAULT_CORRUPTION_TICK,
    Excavation, RevealOutcome,
};
pub use generator::{SiteGenerator, generate};
pub use node::{Node, NodeTree};
pub use profile::SiteProfile;
