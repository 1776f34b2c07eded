//! Error types for the `dig-world` crate.
//!
//! [`WorldError`] covers faults while building a tree (programmer errors in
//! generation or test setup). [`ExcavationError`] is the domain-failure
//! category for player operations on a live site: the caller is expected
//! to show it to the player and carry on.

use dig_types::NodeId;

/// Errors raised while constructing or mutating a [`NodeTree`].
///
/// [`NodeTree`]: crate::NodeTree
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The referenced node is not in the tree.
    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    /// Children can only be attached to directories.
    #[error("{0} is not a directory")]
    NotADirectory(NodeId),

    /// Artifacts can only be attached to files.
    #[error("{0} is not a file")]
    NotAFile(NodeId),

    /// The arena has run out of `u32` indices.
    #[error("node tree is full")]
    TreeFull,
}

/// Failures of player-facing excavation operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExcavationError {
    /// Nothing with this name exists in the current directory.
    #[error("no such target: {name:?}")]
    NoSuchTarget {
        /// The name that was looked up.
        name: String,
    },

    /// The target exists but has not been detected yet.
    #[error("{name:?} is not visible; scan first")]
    NotVisible {
        /// The hidden target.
        name: String,
    },

    /// The target cannot be entered.
    #[error("{name:?} is not a directory")]
    NotADirectory {
        /// The non-directory target.
        name: String,
    },

    /// Only debris can be carved.
    #[error("{name:?} is not debris")]
    NotDebris {
        /// The non-debris target.
        name: String,
    },

    /// `..` from the root.
    #[error("already at root")]
    AtRoot,

    /// A node id from outside this site.
    #[error("node not found: {0}")]
    UnknownNode(NodeId),
}
