//! Action sources for headless runs.
//!
//! A [`Pilot`] chooses the next [`Action`] from what the session shows it
//! and is told how each action turned out. [`Autopilot`] is the built-in
//! deterministic player: it sweeps every directory, carves debris,
//! reconstructs and sells artifacts, and explores depth-first.

use std::collections::{BTreeMap, BTreeSet};

use dig_core::{Action, ActionOutcome, DigSession};
use dig_types::{ArtifactState, NodeId, Visibility};
use dig_world::Node;
use tracing::debug;

/// Two sweeps take every child from hidden to revealed.
const SWEEPS_PER_DIRECTORY: u32 = 2;

/// Source of player actions.
pub trait Pilot {
    /// Choose the next action. `None` ends the run.
    fn next_action(&mut self, session: &DigSession) -> Option<Action>;

    /// Learn the result of the action just played.
    fn observe(&mut self, _action: &Action, _outcome: &ActionOutcome, _session: &DigSession) {}
}

/// Deterministic depth-first excavator.
#[derive(Debug, Default)]
pub struct Autopilot {
    /// Successful sweeps per directory.
    sweeps: BTreeMap<NodeId, u32>,
    /// Debris already attempted, successful or not.
    carved: BTreeSet<NodeId>,
    /// Artifact files whose reconstruction failed.
    abandoned: BTreeSet<NodeId>,
    /// Directories entered at least once.
    entered: BTreeSet<NodeId>,
}

impl Autopilot {
    /// A fresh autopilot with no history.
    pub fn new() -> Self {
        Self::default()
    }

    fn sweeps_at(&self, dir: NodeId) -> u32 {
        self.sweeps.get(&dir).copied().unwrap_or(0)
    }
}

impl Pilot for Autopilot {
    fn next_action(&mut self, session: &DigSession) -> Option<Action> {
        let excavation = session.excavation();
        let cwd = excavation.cwd();
        self.entered.insert(cwd);

        // Cash in first so memory is free for the next reconstruction.
        if let Some(artifact) = session
            .artifacts()
            .in_state(ArtifactState::Collected)
            .first()
        {
            return Some(Action::Sell(artifact.id().clone()));
        }

        let children: Vec<&Node> = excavation.list_children(false);
        if self.sweeps_at(cwd) < SWEEPS_PER_DIRECTORY {
            return Some(Action::ScanAll);
        }

        let wanted = |node: &Node| {
            node.visibility() == Visibility::Revealed
                && !self.abandoned.contains(&node.id())
                && node.artifact().is_some_and(|id| {
                    session
                        .artifacts()
                        .get(id)
                        .is_some_and(|a| a.state() < ArtifactState::Collected)
                })
        };
        if let Some(file) = children.iter().copied().find(|n| wanted(n)) {
            return Some(Action::Reconstruct(file.name().to_owned()));
        }

        if let Some(debris) = children
            .iter()
            .find(|n| n.is_debris() && !self.carved.contains(&n.id()))
        {
            return Some(Action::Carve(debris.name().to_owned()));
        }

        if let Some(dir) = children
            .iter()
            .find(|n| n.is_directory() && !self.entered.contains(&n.id()))
        {
            return Some(Action::ChangeDirectory(dir.name().to_owned()));
        }

        if excavation.current_node().is_some_and(Node::is_root) {
            Some(Action::Quit)
        } else {
            Some(Action::ChangeDirectory(String::from("..")))
        }
    }

    fn observe(&mut self, action: &Action, outcome: &ActionOutcome, session: &DigSession) {
        let excavation = session.excavation();
        let cwd = excavation.cwd();
        match action {
            Action::ScanAll if outcome.success => {
                let sweeps = self.sweeps.entry(cwd).or_insert(0);
                *sweeps = sweeps.saturating_add(1);
            }
            // An empty directory has nothing to sweep; don't retry it.
            Action::ScanAll => {
                self.sweeps.insert(cwd, SWEEPS_PER_DIRECTORY);
            }
            Action::Carve(name) => {
                if let Some(node) = excavation.find_child(name) {
                    self.carved.insert(node.id());
                }
            }
            Action::Reconstruct(name) if !outcome.success => {
                if let Some(node) = excavation.find_child(name) {
                    debug!(node = %node.id(), reason = ?outcome.reason, "giving up on artifact");
                    self.abandoned.insert(node.id());
                }
            }
            Action::ChangeDirectory(name) if !outcome.success => {
                if let Some(node) = excavation.find_child(name) {
                    self.entered.insert(node.id());
                }
            }
            _ => {}
        }
    }
}
