//! Error types for the dig-agents crate.

use dig_types::{DaemonId, NodeId};

/// Errors raised by daemon management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// A daemon was placed on a node that is not part of the site.
    #[error("cannot place daemon on unknown node {0}")]
    UnknownNode(NodeId),

    /// The referenced daemon does not exist.
    #[error("unknown daemon {0}")]
    UnknownDaemon(DaemonId),
}
