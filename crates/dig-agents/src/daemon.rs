//! The daemon record.

use dig_types::{AlertState, DaemonId, NodeId, Personality};
use serde::{Deserialize, Serialize};

/// What to spawn: name, personality, and starting node, with optional
/// overrides of the personality-derived radius and cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonSpec {
    pub(crate) name: String,
    pub(crate) personality: Personality,
    pub(crate) node: NodeId,
    pub(crate) detection_radius: Option<u32>,
    pub(crate) move_cooldown: Option<u32>,
}

impl DaemonSpec {
    /// Describe a daemon placed on `node`.
    pub fn new(name: impl Into<String>, personality: Personality, node: NodeId) -> Self {
        Self {
            name: name.into(),
            personality,
            node,
            detection_radius: None,
            move_cooldown: None,
        }
    }

    /// Override the detection radius.
    #[must_use]
    pub const fn with_detection_radius(mut self, radius: u32) -> Self {
        self.detection_radius = Some(radius);
        self
    }

    /// Override the move cooldown.
    #[must_use]
    pub const fn with_move_cooldown(mut self, cooldown: u32) -> Self {
        self.move_cooldown = Some(cooldown);
        self
    }
}

/// A hostile agent living on the node tree.
///
/// `alert_state` is always the threshold image of `alert_level`. Once
/// `pacified` is set the daemon never perceives, moves, or drains again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Daemon {
    pub(crate) id: DaemonId,
    pub(crate) name: String,
    pub(crate) personality: Personality,
    pub(crate) node: NodeId,
    pub(crate) detection_radius: u32,
    pub(crate) alert_state: AlertState,
    pub(crate) alert_level: f64,
    pub(crate) move_cooldown: u32,
    pub(crate) turns_since_move: u32,
    pub(crate) pacified: bool,
}

impl Daemon {
    /// Unique id within its daemon system.
    pub const fn id(&self) -> DaemonId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Behavioral tag.
    pub const fn personality(&self) -> Personality {
        self.personality
    }

    /// Node currently occupied.
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Hops within which the player is noticed.
    pub const fn detection_radius(&self) -> u32 {
        self.detection_radius
    }

    /// Discretized alert.
    pub const fn alert_state(&self) -> AlertState {
        self.alert_state
    }

    /// Continuous alert in `[0, 1]`.
    pub const fn alert_level(&self) -> f64 {
        self.alert_level
    }

    /// Ticks between moves.
    pub const fn move_cooldown(&self) -> u32 {
        self.move_cooldown
    }

    /// Ticks counted toward the next move.
    pub const fn turns_since_move(&self) -> u32 {
        self.turns_since_move
    }

    /// Whether the daemon has been permanently neutralized.
    pub const fn is_pacified(&self) -> bool {
        self.pacified
    }

    /// Whether the daemon still takes part in ticks.
    pub const fn is_active(&self) -> bool {
        !self.pacified
    }

    /// Add `delta` to the alert level, clamp to `[0, 1]`, and recompute
    /// the state. Returns the previous state.
    pub(crate) fn shift_alert(&mut self, delta: f64, suspicious: f64, alert: f64) -> AlertState {
        let previous = self.alert_state;
        let level = self.alert_level + delta;
        self.alert_level = if level.is_nan() { 0.0 } else { level.clamp(0.0, 1.0) };
        self.alert_state = AlertState::from_level(self.alert_level, suspicious, alert);
        previous
    }

    /// Count one tick toward the next move. Returns whether the cooldown
    /// has elapsed, resetting the counter when it has.
    pub(crate) const fn ready_to_move(&mut self) -> bool {
        self.turns_since_move = self.turns_since_move.saturating_add(1);
        if self.turns_since_move < self.move_cooldown {
            return false;
        }
        self.turns_since_move = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daemon(move_cooldown: u32) -> Daemon {
        Daemon {
            id: DaemonId(0),
            name: String::from("WATCHDOG-1"),
            personality: Personality::Aggressive,
            node: NodeId(0),
            detection_radius: 2,
            alert_state: AlertState::Idle,
            alert_level: 0.0,
            move_cooldown,
            turns_since_move: 0,
            pacified: false,
        }
    }

    #[test]
    fn alert_level_is_clamped_and_state_follows() {
        let mut d = daemon(1);
        let before = d.shift_alert(0.5, 0.4, 0.75);
        assert_eq!(before, AlertState::Idle);
        assert_eq!(d.alert_state(), AlertState::Suspicious);

        d.shift_alert(2.0, 0.4, 0.75);
        assert!((d.alert_level() - 1.0).abs() < f64::EPSILON);
        assert_eq!(d.alert_state(), AlertState::Alert);

        d.shift_alert(-5.0, 0.4, 0.75);
        assert!(d.alert_level().abs() < f64::EPSILON);
        assert_eq!(d.alert_state(), AlertState::Idle);
    }

    #[test]
    fn cooldown_gates_moves() {
        let mut every_tick = daemon(1);
        assert!(every_tick.ready_to_move());
        assert!(every_tick.ready_to_move());

        let mut sleepy = daemon(3);
        let pattern: Vec<bool> = (0..6).map(|_| sleepy.ready_to_move()).collect();
        assert_eq!(pattern, vec![false, false, true, false, false, true]);
    }
}
