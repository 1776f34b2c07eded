//! Type-safe identifier wrappers.
//!
//! Nodes and daemons are addressed by dense arena indices so that a seeded
//! run always hands out the same ids in the same order. Artifact ids are
//! derived from the site theme and are therefore textual.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `u32` index with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Return the inner index value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }

            /// Return the index as a `usize` for arena lookups.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of a node in the excavation tree (its arena slot).
    NodeId, "node#"
}

define_id! {
    /// Identifier of a daemon, unique within one daemon system.
    DaemonId, "daemon#"
}

/// Identifier of an artifact, e.g. `arc_corporate_0003`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier for the `ordinal`-th file of a site themed
    /// `theme`.
    pub fn for_theme(theme: &str, ordinal: usize) -> Self {
        Self(format!("arc_{theme}_{ordinal:04}"))
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}
