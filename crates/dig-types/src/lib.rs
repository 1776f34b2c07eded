//! Shared type definitions for the dig-site simulation.
//!
//! This crate is the single source of truth for the identifiers and closed
//! enumerations used across the workspace. It carries no behavior beyond
//! small pure helpers on the enums themselves.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed identifiers for nodes, artifacts, and daemons
//! - [`enums`] -- Node kinds, visibility, resources, rarity, lifecycle and
//!   alert states, daemon personalities

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{AlertState, ArtifactState, NodeKind, Personality, Rarity, ResourceKind, Visibility};
pub use ids::{ArtifactId, DaemonId, NodeId};
