//! Hop distance over the node tree.
//!
//! The graph is the tree itself: every node is adjacent to its children and
//! its parent. Distances are breadth-first hop counts. Ids outside the tree
//! are treated as unreachable.

use std::collections::{BTreeSet, VecDeque};

use dig_types::NodeId;
use dig_world::NodeTree;

/// Distance reported for pairs with no path. Larger than any detection
/// radius a daemon would use.
pub const UNREACHABLE: u32 = 999;

/// Breadth-first hop count from `from` to `to`.
///
/// Returns 0 for a node and itself and [`UNREACHABLE`] when either id is
/// unknown or no path exists.
pub fn hop_distance(tree: &NodeTree, from: NodeId, to: NodeId) -> u32 {
    if !tree.contains(from) || !tree.contains(to) {
        return UNREACHABLE;
    }
    if from == to {
        return 0;
    }

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(from);
    queue.push_back((from, 0_u32));

    while let Some((current, hops)) = queue.pop_front() {
        let next_hops = hops.saturating_add(1);
        for neighbor in tree.neighbors(current) {
            if neighbor == to {
                return next_hops;
            }
            if visited.insert(neighbor) {
                queue.push_back((neighbor, next_hops));
            }
        }
    }

    UNREACHABLE
}

/// The neighbor of `from` closest to `target`.
///
/// Neighbors are considered children first, then the parent; ties keep the
/// earliest. Returns `None` when `from` has no neighbors.
pub fn step_toward(tree: &NodeTree, from: NodeId, target: NodeId) -> Option<NodeId> {
    let mut best: Option<(NodeId, u32)> = None;
    for neighbor in tree.neighbors(from) {
        let distance = hop_distance(tree, neighbor, target);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((neighbor, distance)),
        }
    }
    best.map(|(id, _)| id)
}
