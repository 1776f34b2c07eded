//! Enumeration types for the dig-site simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// What a node in the excavation tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// A container; the only kind that may have children.
    Directory,
    /// An intact file, possibly carrying an artifact.
    File,
    /// Decayed data that can be carved back into a file.
    Debris,
}

impl NodeKind {
    /// Whether nodes of this kind may own children.
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// How much of a node the player currently knows.
///
/// Ordered: `Hidden < Detected < Revealed`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Not known to exist.
    #[default]
    Hidden,
    /// Known to exist, contents unknown.
    Detected,
    /// Fully inspected.
    Revealed,
}

impl Visibility {
    /// The next visibility step, or `None` when already fully revealed.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Hidden => Some(Self::Detected),
            Self::Detected => Some(Self::Revealed),
            Self::Revealed => None,
        }
    }

    /// Whether the player can see the node at all.
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// The three capped gauges the player spends to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Spent by every command; drained by daemon contact.
    Power,
    /// Occupied by collected artifacts until they are sold.
    Memory,
    /// Drained passively every turn and by carving.
    Energy,
}

impl ResourceKind {
    /// All resource kinds in canonical order.
    pub const ALL: [Self; 3] = [Self::Power, Self::Memory, Self::Energy];

    /// Lowercase display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Memory => "memory",
            Self::Energy => "energy",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Artifact rarity tier. Each tier carries a fixed value multiplier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Multiplier 1.0.
    #[default]
    Common,
    /// Multiplier 2.5.
    Uncommon,
    /// Multiplier 6.0.
    Rare,
    /// Multiplier 15.0.
    Legendary,
}

impl Rarity {
    /// Sell-value multiplier for this tier.
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 2.5,
            Self::Rare => 6.0,
            Self::Legendary => 15.0,
        }
    }

    /// Pick a tier from the corruption of the node an artifact was found in.
    /// Cleaner nodes hold rarer artifacts.
    pub const fn from_corruption(corruption: f64) -> Self {
        if corruption < 0.1 {
            Self::Legendary
        } else if corruption < 0.3 {
            Self::Rare
        } else if corruption < 0.6 {
            Self::Uncommon
        } else {
            Self::Common
        }
    }
}

/// Artifact lifecycle. Only ever advances in declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactState {
    /// Present in the site but not yet surfaced.
    #[default]
    Undiscovered,
    /// Surfaced by a scan.
    Found,
    /// Reconstructed into memory.
    Collected,
    /// Exchanged for currency.
    Sold,
}

// ---------------------------------------------------------------------------
// Daemons
// ---------------------------------------------------------------------------

/// Discretized daemon alert level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    /// Patrolling.
    #[default]
    Idle,
    /// Something was noticed.
    Suspicious,
    /// Hunting the player.
    Alert,
}

impl AlertState {
    /// Derive the state from a continuous alert level and the two
    /// thresholds.
    pub const fn from_level(level: f64, suspicious: f64, alert: f64) -> Self {
        if level >= alert {
            Self::Alert
        } else if level >= suspicious {
            Self::Suspicious
        } else {
            Self::Idle
        }
    }
}

/// Behavioral tag fixed at daemon spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Pursues the player once alerted.
    Aggressive,
    /// Sees further and alarms faster; also pursues.
    Paranoid,
    /// Moves rarely and calms down twice as fast.
    Sleepy,
}

impl Personality {
    /// Whether an alerted daemon of this personality chases the player
    /// instead of patrolling.
    pub const fn pursues(self) -> bool {
        matches!(self, Self::Aggressive | Self::Paranoid)
    }
}

impl core::fmt::Display for Personality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Aggressive => "aggressive",
            Self::Paranoid => "paranoid",
            Self::Sleepy => "sleepy",
        };
        f.write_str(name)
    }
}
