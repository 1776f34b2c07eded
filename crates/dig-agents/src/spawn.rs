//! Seeded placement of the configured roster.
//!
//! Each roster entry lands on a uniformly chosen non-root directory. The
//! placement RNG is seeded with `seed + 1` so it never shares a stream with
//! the patrol RNG, which uses `seed` itself.

use dig_types::{DaemonId, NodeId};
use dig_world::{Node, NodeTree};
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::RosterEntry;
use crate::daemon::DaemonSpec;
use crate::error::AgentError;
use crate::sentinel::SentinelAi;

/// Spawn every entry of `roster` onto `tree`.
///
/// Sites with no directory below the root get no daemons.
///
/// # Errors
///
/// Propagates [`AgentError`] from [`SentinelAi::add_daemon`].
pub fn spawn_roster(
    ai: &mut SentinelAi,
    roster: &[RosterEntry],
    tree: &NodeTree,
    seed: u64,
) -> Result<Vec<DaemonId>, AgentError> {
    let candidates: Vec<NodeId> = tree
        .iter()
        .filter(|node| node.is_directory() && !node.is_root())
        .map(Node::id)
        .collect();
    if candidates.is_empty() {
        debug!("no directories to host daemons");
        return Ok(Vec::new());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let mut spawned = Vec::with_capacity(roster.len());
    for entry in roster {
        let Some(&node) = candidates.choose(&mut rng) else {
            break;
        };
        let spec = DaemonSpec::new(entry.name.clone(), entry.personality, node);
        spawned.push(ai.add_daemon(spec, tree)?);
    }
    Ok(spawned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use dig_events::EventBus;
    use dig_types::Personality;
    use dig_world::SiteProfile;

    use crate::config::DaemonConfig;

    fn placements(seed: u64) -> Vec<(String, NodeId, u32)> {
        let tree = dig_world::generate(&SiteProfile::corporate(), seed).unwrap();
        let config = DaemonConfig::default();
        let roster = config.roster.clone();
        let mut ai = SentinelAi::new(config, seed, Rc::new(EventBus::new()));
        spawn_roster(&mut ai, &roster, &tree, seed).unwrap();
        ai.all_daemons()
            .map(|d| (d.name().to_owned(), d.node(), d.detection_radius()))
            .collect()
    }

    #[test]
    fn roster_lands_on_non_root_directories() {
        let tree = dig_world::generate(&SiteProfile::corporate(), 11).unwrap();
        let config = DaemonConfig::default();
        let roster = config.roster.clone();
        let mut ai = SentinelAi::new(config, 11, Rc::new(EventBus::new()));
        let ids = spawn_roster(&mut ai, &roster, &tree, 11).unwrap();
        if tree.count_kind(dig_types::NodeKind::Directory) <= 1 {
            assert!(ids.is_empty());
            return;
        }
        assert_eq!(ids.len(), 3);
        for daemon in ai.all_daemons() {
            let node = tree.get(daemon.node()).unwrap();
            assert!(node.is_directory());
            assert!(!node.is_root());
        }
    }

    #[test]
    fn placement_is_reproducible_and_personality_shaped() {
        let first = placements(5);
        assert_eq!(first, placements(5));
        if let Some((_, _, radius)) = first.iter().find(|(name, _, _)| name == "GHOST-2") {
            assert_eq!(*radius, 3);
        }
    }

    #[test]
    fn bare_root_gets_no_daemons() {
        let tree = NodeTree::with_root("root");
        let mut ai = SentinelAi::new(DaemonConfig::default(), 1, Rc::new(EventBus::new()));
        let roster = vec![RosterEntry::new("ALONE", Personality::Sleepy)];
        let ids = spawn_roster(&mut ai, &roster, &tree, 1).unwrap();
        assert!(ids.is_empty());
        assert!(ai.is_empty());
    }
}
