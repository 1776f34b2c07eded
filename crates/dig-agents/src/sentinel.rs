//! The daemon system.
//!
//! [`SentinelAi`] owns every daemon of a session and runs their loop once
//! per turn. Daemons are processed in spawn order; for each active daemon
//! the tick applies, in order:
//!
//! 1. **Perception** -- hop distance to the player decides between the near
//!    gain, the noise gain (last action node within radius + 1), or decay.
//! 2. **Movement** -- once the cooldown elapses, alerted pursuers step
//!    toward the player; everyone else patrols to a random neighbor.
//! 3. **Contact** -- sharing the player's node drains power.
//! 4. **Corruption** -- the occupied node decays a little.

use std::collections::BTreeMap;
use std::rc::Rc;

use dig_events::{Event, EventBus, EventPayload};
use dig_ledger::ResourceLedger;
use dig_types::{AlertState, DaemonId, NodeId, ResourceKind};
use dig_world::{Excavation, NodeTree};
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::DaemonConfig;
use crate::daemon::{Daemon, DaemonSpec};
use crate::error::AgentError;
use crate::graph::{hop_distance, step_toward};

const SOURCE: &str = "sentinel";

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Daemons that perceived this tick (active ones).
    pub active: usize,
    /// Spotted and alert events posted.
    pub transitions: usize,
    /// Daemons that changed node.
    pub moves: usize,
    /// Daemons that shared the player's node.
    pub contacts: usize,
}

/// Owner of all daemons in a session.
#[derive(Debug)]
pub struct SentinelAi {
    config: DaemonConfig,
    daemons: BTreeMap<DaemonId, Daemon>,
    next_id: u32,
    rng: ChaCha8Rng,
    bus: Rc<EventBus>,
}

impl SentinelAi {
    /// Create an empty daemon system whose patrol RNG is seeded with `seed`.
    pub fn new(config: DaemonConfig, seed: u64, bus: Rc<EventBus>) -> Self {
        Self {
            config,
            daemons: BTreeMap::new(),
            next_id: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            bus,
        }
    }

    /// Tuning in effect.
    pub const fn config(&self) -> &DaemonConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Roster management
    // -----------------------------------------------------------------------

    /// Spawn a daemon described by `spec` onto a node of `tree`.
    ///
    /// Radius and cooldown come from the personality unless the [`DaemonSpec`]
    /// overrides them.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownNode`] if the starting node is not in `tree`.
    pub fn add_daemon(
        &mut self,
        spec: DaemonSpec,
        tree: &NodeTree,
    ) -> Result<DaemonId, AgentError> {
        if !tree.contains(spec.node) {
            return Err(AgentError::UnknownNode(spec.node));
        }
        let id = DaemonId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let daemon = Daemon {
            id,
            detection_radius: spec
                .detection_radius
                .unwrap_or_else(|| self.config.detection_radius(spec.personality)),
            move_cooldown: spec
                .move_cooldown
                .unwrap_or_else(|| self.config.move_cooldown(spec.personality)),
            name: spec.name,
            personality: spec.personality,
            node: spec.node,
            alert_state: AlertState::Idle,
            alert_level: 0.0,
            turns_since_move: 0,
            pacified: false,
        };
        info!(
            daemon = %id,
            name = %daemon.name,
            personality = %daemon.personality,
            node = %daemon.node,
            "daemon spawned"
        );
        self.daemons.insert(id, daemon);
        Ok(id)
    }

    /// Remove a daemon entirely, returning it.
    pub fn remove_daemon(&mut self, id: DaemonId) -> Option<Daemon> {
        let removed = self.daemons.remove(&id);
        if removed.is_some() {
            debug!(daemon = %id, "daemon removed");
        }
        removed
    }

    /// Permanently neutralize a daemon: pacified, idle, alert level zero.
    ///
    /// Returns `Ok(true)` and posts `DaemonPacified` the first time;
    /// later calls return `Ok(false)` and post nothing.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownDaemon`] if `id` is not in the system.
    pub fn pacify(&mut self, id: DaemonId) -> Result<bool, AgentError> {
        let daemon = self
            .daemons
            .get_mut(&id)
            .ok_or(AgentError::UnknownDaemon(id))?;
        if daemon.pacified {
            return Ok(false);
        }
        daemon.pacified = true;
        daemon.alert_state = AlertState::Idle;
        daemon.alert_level = 0.0;
        info!(daemon = %id, name = %daemon.name, "daemon pacified");
        let payload = EventPayload::DaemonPacified {
            daemon: id,
            name: daemon.name.clone(),
        };
        self.bus.post(Event::immediate(payload).with_source(SOURCE));
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up a daemon.
    pub fn get(&self, id: DaemonId) -> Option<&Daemon> {
        self.daemons.get(&id)
    }

    /// Active daemons standing on `node`.
    pub fn daemons_at(&self, node: NodeId) -> Vec<&Daemon> {
        self.daemons
            .values()
            .filter(|d| d.is_active() && d.node == node)
            .collect()
    }

    /// Every daemon in spawn order, pacified ones included.
    pub fn all_daemons(&self) -> impl Iterator<Item = &Daemon> {
        self.daemons.values()
    }

    /// Number of daemons, pacified ones included.
    pub fn len(&self) -> usize {
        self.daemons.len()
    }

    /// Whether no daemons exist.
    pub fn is_empty(&self) -> bool {
        self.daemons.is_empty()
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one turn of the daemon loop against the player at `player`,
    /// whose last action happened at `noise` (if any).
    pub fn tick(
        &mut self,
        excavation: &mut Excavation,
        resources: &mut ResourceLedger,
        player: NodeId,
        noise: Option<NodeId>,
    ) -> TickReport {
        let Self {
            config,
            daemons,
            rng,
            bus,
            ..
        } = self;
        let mut report = TickReport::default();

        for daemon in daemons.values_mut() {
            if daemon.pacified {
                continue;
            }
            report.active = report.active.saturating_add(1);

            let tree = excavation.tree();

            // Perception
            let distance = hop_distance(tree, daemon.node, player);
            let delta = if distance <= daemon.detection_radius {
                config.near_gain(daemon.personality)
            } else if noise.is_some_and(|n| {
                hop_distance(tree, daemon.node, n) <= daemon.detection_radius.saturating_add(1)
            }) {
                config.alert_gain_noise
            } else {
                -config.decay(daemon.personality)
            };
            let previous =
                daemon.shift_alert(delta, config.suspicious_threshold, config.alert_threshold);
            if let Some(payload) = transition_event(daemon, previous) {
                debug!(
                    daemon = %daemon.id,
                    from = ?previous,
                    to = ?daemon.alert_state,
                    level = daemon.alert_level,
                    "alert state changed"
                );
                report.transitions = report.transitions.saturating_add(1);
                bus.post(Event::immediate(payload).with_source(SOURCE));
            }

            // Movement
            if daemon.ready_to_move() {
                let pursuing =
                    daemon.alert_state == AlertState::Alert && daemon.personality.pursues();
                let target = if pursuing {
                    step_toward(tree, daemon.node, player)
                } else {
                    tree.neighbors(daemon.node).choose(&mut *rng).copied()
                };
                if let Some(next) = target {
                    debug!(daemon = %daemon.id, from = %daemon.node, to = %next, pursuing, "daemon moved");
                    daemon.node = next;
                    report.moves = report.moves.saturating_add(1);
                }
            }

            // Contact
            if daemon.node == player {
                report.contacts = report.contacts.saturating_add(1);
                match resources.consume(ResourceKind::Power, config.contact_drain, &daemon.name) {
                    Ok(true) => debug!(daemon = %daemon.id, drain = config.contact_drain, "contact drain"),
                    Ok(false) => debug!(daemon = %daemon.id, "contact drain exceeds remaining power"),
                    Err(err) => warn!(daemon = %daemon.id, error = %err, "contact drain rejected"),
                }
            }

            // Corruption
            if let Err(err) = excavation.apply_corruption(daemon.node, config.daemon_corruption) {
                warn!(daemon = %daemon.id, error = %err, "daemon corruption failed");
            }
        }

        report
    }
}

/// Event for a state change: spotted on `IDLE -> SUSPICIOUS`, alert on any
/// entry into `ALERT`. Calming down posts nothing.
fn transition_event(daemon: &Daemon, previous: AlertState) -> Option<EventPayload> {
    let current = daemon.alert_state;
    if current == previous {
        return None;
    }
    match (previous, current) {
        (AlertState::Idle, AlertState::Suspicious) => Some(EventPayload::DaemonSpotted {
            daemon: daemon.id,
            name: daemon.name.clone(),
            node: daemon.node,
            alert_level: daemon.alert_level,
        }),
        (_, AlertState::Alert) => Some(EventPayload::DaemonAlert {
            daemon: daemon.id,
            name: daemon.name.clone(),
            node: daemon.node,
            alert_level: daemon.alert_level,
        }),
        _ => None,
    }
}
