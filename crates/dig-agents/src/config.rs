//! Daemon roster and tuning, loaded from the `daemons` section of
//! `dig-config.yaml`.
//!
//! Every field has a serde default, so an empty section yields the stock
//! three-daemon roster and the standard alert/movement constants.

use dig_types::Personality;
use serde::{Deserialize, Serialize};

/// One daemon to spawn at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Display name, also used as the source of its contact drain.
    pub name: String,
    /// Behavioral tag.
    pub personality: Personality,
}

impl RosterEntry {
    /// Build an entry.
    pub fn new(name: impl Into<String>, personality: Personality) -> Self {
        Self {
            name: name.into(),
            personality,
        }
    }
}

/// Spawn roster and tuning for the daemon system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Daemons spawned when a session starts.
    #[serde(default = "default_roster")]
    pub roster: Vec<RosterEntry>,

    /// Alert gained per tick with the player inside the detection radius
    /// (default: 0.2).
    #[serde(default = "default_alert_gain_near")]
    pub alert_gain_near: f64,

    /// Multiplier on the near gain for paranoid daemons (default: 1.5).
    #[serde(default = "default_paranoid_gain_multiplier")]
    pub paranoid_gain_multiplier: f64,

    /// Alert gained per tick when only the player's last action is within
    /// radius + 1 (default: 0.1).
    #[serde(default = "default_alert_gain_noise")]
    pub alert_gain_noise: f64,

    /// Alert lost per tick with nothing perceived (default: 0.05).
    #[serde(default = "default_alert_decay")]
    pub alert_decay: f64,

    /// Multiplier on decay for sleepy daemons (default: 2.0).
    #[serde(default = "default_sleepy_decay_multiplier")]
    pub sleepy_decay_multiplier: f64,

    /// Power drained per tick of co-location with the player (default: 10).
    #[serde(default = "default_contact_drain")]
    pub contact_drain: f64,

    /// Corruption added to the occupied node every tick (default: 0.05).
    #[serde(default = "default_daemon_corruption")]
    pub daemon_corruption: f64,

    /// Alert level at which a daemon becomes suspicious (default: 0.4).
    #[serde(default = "default_suspicious_threshold")]
    pub suspicious_threshold: f64,

    /// Alert level at which a daemon becomes alerted (default: 0.75).
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,

    /// Detection radius in hops (default: 2).
    #[serde(default = "default_base_detection_radius")]
    pub base_detection_radius: u32,

    /// Extra hops of detection for paranoid daemons (default: 1).
    #[serde(default = "default_paranoid_radius_bonus")]
    pub paranoid_radius_bonus: u32,

    /// Ticks between moves (default: 1, i.e. every tick).
    #[serde(default = "default_base_move_cooldown")]
    pub base_move_cooldown: u32,

    /// Ticks between moves for sleepy daemons (default: 3).
    #[serde(default = "default_sleepy_move_cooldown")]
    pub sleepy_move_cooldown: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            alert_gain_near: default_alert_gain_near(),
            paranoid_gain_multiplier: default_paranoid_gain_multiplier(),
            alert_gain_noise: default_alert_gain_noise(),
            alert_decay: default_alert_decay(),
            sleepy_decay_multiplier: default_sleepy_decay_multiplier(),
            contact_drain: default_contact_drain(),
            daemon_corruption: default_daemon_corruption(),
            suspicious_threshold: default_suspicious_threshold(),
            alert_threshold: default_alert_threshold(),
            base_detection_radius: default_base_detection_radius(),
            paranoid_radius_bonus: default_paranoid_radius_bonus(),
            base_move_cooldown: default_base_move_cooldown(),
            sleepy_move_cooldown: default_sleepy_move_cooldown(),
        }
    }
}

impl DaemonConfig {
    /// Detection radius for a personality.
    pub const fn detection_radius(&self, personality: Personality) -> u32 {
        match personality {
            Personality::Paranoid => self
                .base_detection_radius
                .saturating_add(self.paranoid_radius_bonus),
            Personality::Aggressive | Personality::Sleepy => self.base_detection_radius,
        }
    }

    /// Move cooldown for a personality.
    pub const fn move_cooldown(&self, personality: Personality) -> u32 {
        match personality {
            Personality::Sleepy => self.sleepy_move_cooldown,
            Personality::Aggressive | Personality::Paranoid => self.base_move_cooldown,
        }
    }

    /// Alert gained per tick with the player in range.
    pub const fn near_gain(&self, personality: Personality) -> f64 {
        match personality {
            Personality::Paranoid => self.alert_gain_near * self.paranoid_gain_multiplier,
            Personality::Aggressive | Personality::Sleepy => self.alert_gain_near,
        }
    }

    /// Alert lost per tick with nothing perceived.
    pub const fn decay(&self, personality: Personality) -> f64 {
        match personality {
            Personality::Sleepy => self.alert_decay * self.sleepy_decay_multiplier,
            Personality::Aggressive | Personality::Paranoid => self.alert_decay,
        }
    }
}

fn default_roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("WATCHDOG-1", Personality::Aggressive),
        RosterEntry::new("GHOST-2", Personality::Paranoid),
        RosterEntry::new("SENTINEL-3", Personality::Sleepy),
    ]
}

const fn default_alert_gain_near() -> f64 {
    0.2
}

const fn default_paranoid_gain_multiplier() -> f64 {
    1.5
}

const fn default_alert_gain_noise() -> f64 {
    0.1
}

const fn default_alert_decay() -> f64 {
    0.05
}

const fn default_sleepy_decay_multiplier() -> f64 {
    2.0
}

const fn default_contact_drain() -> f64 {
    10.0
}

const fn default_daemon_corruption() -> f64 {
    0.05
}

const fn default_suspicious_threshold() -> f64 {
    0.4
}

const fn default_alert_threshold() -> f64 {
    0.75
}

const fn default_base_detection_radius() -> u32 {
    2
}

const fn default_paranoid_radius_bonus() -> u32 {
    1
}

const fn default_base_move_cooldown() -> u32 {
    1
}

const fn default_sleepy_move_cooldown() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personalities_adjust_radius_cooldown_and_rates() {
        let config = DaemonConfig::default();
        assert_eq!(config.detection_radius(Personality::Aggressive), 2);
        assert_eq!(config.detection_radius(Personality::Paranoid), 3);
        assert_eq!(config.move_cooldown(Personality::Sleepy), 3);
        assert_eq!(config.move_cooldown(Personality::Paranoid), 1);
        assert!((config.near_gain(Personality::Paranoid) - 0.3).abs() < 1e-12);
        assert!((config.decay(Personality::Sleepy) - 0.1).abs() < 1e-12);
        assert!((config.decay(Personality::Aggressive) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn empty_section_yields_defaults() {
        let parsed: Result<DaemonConfig, _> = serde_yml::from_str("{}");
        assert!(parsed.is_ok());
        let config = parsed.unwrap_or_else(|_| DaemonConfig {
            roster: Vec::new(),
            ..DaemonConfig::default()
        });
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.roster.len(), 3);
    }

    #[test]
    fn roster_parses_snake_case_personalities() {
        let yaml = "roster:\n  - name: HOUND\n    personality: paranoid\nalert_threshold: 0.9\n";
        let parsed: Result<DaemonConfig, _> = serde_yml::from_str(yaml);
        assert!(parsed.is_ok());
        let config = parsed.unwrap_or_default();
        assert_eq!(
            config.roster,
            vec![RosterEntry::new("HOUND", Personality::Paranoid)]
        );
        assert!((config.alert_threshold - 0.9).abs() < 1e-12);
        assert_eq!(config.sleepy_move_cooldown, 3);
    }
}
