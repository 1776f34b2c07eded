//! Configuration loading and typed config structures for the dig-site
//! simulation.
//!
//! The canonical configuration lives in `dig-config.yaml`. Every section and
//! field has a default, so an empty document describes a complete game: a
//! corporate site seeded with 42, full gauges, and the stock daemon roster.

use std::path::Path;

use dig_agents::DaemonConfig;
use dig_ledger::{ArtifactEconomy, DEFAULT_BASE_VALUE, DEFAULT_MEMORY_COST, ResourceLimits};
use dig_types::ResourceKind;
use dig_world::{DEFAULT_CARVE_FAIL_THRESHOLD, DEFAULT_CORRUPTION_TICK, SiteProfile};
use serde::Deserialize;

use crate::action::ActionCosts;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An action price is negative or not a number.
    #[error("invalid {resource} cost {amount} for {action}")]
    InvalidCost {
        /// Verb of the priced action.
        action: &'static str,
        /// The offending component.
        resource: ResourceKind,
        /// The rejected amount.
        amount: f64,
    },

    /// `site.profile` names no built-in preset.
    #[error("unknown site profile {name:?} (expected one of: corporate, personal, research)")]
    UnknownProfile {
        /// The name that was given.
        name: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `dig-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run-level settings (name, seed, turn limit).
    #[serde(default)]
    pub world: WorldConfig,

    /// Site preset and overrides.
    #[serde(default)]
    pub site: SiteConfig,

    /// Gauge capacities and passive drain.
    #[serde(default)]
    pub resources: ResourcesConfig,

    /// Decay and carving tuning.
    #[serde(default)]
    pub excavation: ExcavationConfig,

    /// Artifact economy.
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Daemon roster and behavior tuning.
    #[serde(default)]
    pub daemons: DaemonConfig,

    /// Resource price of each player action.
    #[serde(default)]
    pub costs: ActionCosts,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// any error from [`SimulationConfig::validate`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot: every action price must be a
    /// finite, non-negative amount.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCost`] for the first bad price.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (action, cost) in self.costs.entries() {
            if let Some((resource, amount)) = cost.invalid_component() {
                return Err(ConfigError::InvalidCost {
                    action,
                    resource,
                    amount,
                });
            }
        }
        Ok(())
    }
}

/// Run-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable run name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for site generation, daemon placement, and patrols.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Turn limit for headless runs.
    #[serde(default = "default_max_turns")]
    pub max_turns: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            max_turns: default_max_turns(),
        }
    }
}

/// Site preset plus optional per-field overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SiteConfig {
    /// Preset name: `corporate`, `personal`, or `research`.
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Override of the site name.
    #[serde(default)]
    pub name: Option<String>,

    /// Override of the theme tag.
    #[serde(default)]
    pub theme: Option<String>,

    /// Override of the maximum directory depth.
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Override of the mean branching factor.
    #[serde(default)]
    pub branch_factor: Option<f64>,

    /// Override of the branching standard deviation.
    #[serde(default)]
    pub branch_spread: Option<f64>,

    /// Override of the mean leaf population.
    #[serde(default)]
    pub files_per_dir: Option<f64>,

    /// Override of the leaf population standard deviation.
    #[serde(default)]
    pub file_spread: Option<f64>,

    /// Override of the debris probability.
    #[serde(default)]
    pub debris_ratio: Option<f64>,

    /// Override of the artifact probability.
    #[serde(default)]
    pub artifact_density: Option<f64>,

    /// Override of the starting corruption.
    #[serde(default)]
    pub base_corruption: Option<f64>,

    /// Override of the starting corruption noise.
    #[serde(default)]
    pub corruption_jitter: Option<f64>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            name: None,
            theme: None,
            max_depth: None,
            branch_factor: None,
            branch_spread: None,
            files_per_dir: None,
            file_spread: None,
            debris_ratio: None,
            artifact_density: None,
            base_corruption: None,
            corruption_jitter: None,
        }
    }
}

impl SiteConfig {
    /// The preset named by `profile` with every override applied.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownProfile`] if the preset does not exist.
    pub fn resolve(&self) -> Result<SiteProfile, ConfigError> {
        let mut profile =
            SiteProfile::preset(&self.profile).ok_or_else(|| ConfigError::UnknownProfile {
                name: self.profile.clone(),
            })?;
        if let Some(name) = &self.name {
            profile.name.clone_from(name);
        }
        if let Some(theme) = &self.theme {
            profile.theme.clone_from(theme);
        }
        override_with(&mut profile.max_depth, self.max_depth);
        override_with(&mut profile.branch_factor, self.branch_factor);
        override_with(&mut profile.branch_spread, self.branch_spread);
        override_with(&mut profile.files_per_dir, self.files_per_dir);
        override_with(&mut profile.file_spread, self.file_spread);
        override_with(&mut profile.debris_ratio, self.debris_ratio);
        override_with(&mut profile.artifact_density, self.artifact_density);
        override_with(&mut profile.base_corruption, self.base_corruption);
        override_with(&mut profile.corruption_jitter, self.corruption_jitter);
        Ok(profile)
    }
}

fn override_with<T: Copy>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

/// Gauge capacities. Gauges start full.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ResourcesConfig {
    /// Maximum processing power.
    #[serde(default = "default_power")]
    pub power: f64,

    /// Maximum memory.
    #[serde(default = "default_memory")]
    pub memory: f64,

    /// Maximum energy.
    #[serde(default = "default_energy")]
    pub energy: f64,

    /// Energy drained at the end of every turn.
    #[serde(default = "default_energy_drain")]
    pub energy_drain: f64,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            power: default_power(),
            memory: default_memory(),
            energy: default_energy(),
            energy_drain: default_energy_drain(),
        }
    }
}

impl ResourcesConfig {
    /// Ledger limits for this section.
    pub const fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            power: self.power,
            memory: self.memory,
            energy: self.energy,
            energy_drain: self.energy_drain,
        }
    }
}

/// Decay and carving tuning.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExcavationConfig {
    /// Corruption added to visible nodes every turn.
    #[serde(default = "default_corruption_per_turn")]
    pub corruption_per_turn: f64,

    /// Debris at or above this corruption cannot be carved.
    #[serde(default = "default_carve_fail_threshold")]
    pub carve_fail_threshold: f64,
}

impl Default for ExcavationConfig {
    fn default() -> Self {
        Self {
            corruption_per_turn: default_corruption_per_turn(),
            carve_fail_threshold: default_carve_fail_threshold(),
        }
    }
}

/// Artifact economy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ArtifactsConfig {
    /// Memory held by each collected artifact.
    #[serde(default = "default_memory_cost")]
    pub memory_cost: f64,

    /// Sale value of a pristine common artifact.
    #[serde(default = "default_base_value")]
    pub base_value: f64,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            memory_cost: default_memory_cost(),
            base_value: default_base_value(),
        }
    }
}

impl ArtifactsConfig {
    /// Registry tuning for this section.
    pub const fn economy(&self) -> ArtifactEconomy {
        ArtifactEconomy {
            memory_cost: self.memory_cost,
            base_value: self.base_value,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_world_name() -> String {
    String::from("Dig Site")
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_turns() -> u64 {
    200
}

fn default_profile() -> String {
    String::from("corporate")
}

const fn default_power() -> f64 {
    100.0
}

const fn default_memory() -> f64 {
    50.0
}

const fn default_energy() -> f64 {
    80.0
}

const fn default_energy_drain() -> f64 {
    1.0
}

const fn default_corruption_per_turn() -> f64 {
    DEFAULT_CORRUPTION_TICK
}

const fn default_carve_fail_threshold() -> f64 {
    DEFAULT_CARVE_FAIL_THRESHOLD
}

const fn default_memory_cost() -> f64 {
    DEFAULT_MEMORY_COST
}

const fn default_base_value() -> f64 {
    DEFAULT_BASE_VALUE
}

fn default_log_level() -> String {
    String::from("info")
}
