//! Declarative description of a dig site.
//!
//! A [`SiteProfile`] is plain data: it can be built in code, taken from one
//! of the presets, or deserialized from configuration. The generator
//! sanitizes every numeric field before use, so out-of-range values are
//! tolerated rather than rejected.

use serde::{Deserialize, Serialize};

/// Directory names used when a profile does not supply its own.
pub const DEFAULT_DIR_NAMES: [&str; 15] = [
    "invoices", "archive", "logs", "backup", "system", "personal", "reports", "cache", "temp",
    "projects", "assets", "config", "network", "users", "research",
];

/// File names used when a profile does not supply its own.
pub const DEFAULT_FILE_NAMES: [&str; 12] = [
    "readme.txt",
    "memo.doc",
    "export.csv",
    "notes.txt",
    "report.pdf",
    "manifest.log",
    "index.dat",
    "summary.txt",
    "contacts.db",
    "schedule.txt",
    "budget.xls",
    "draft.doc",
];

/// Debris names used when a profile does not supply its own.
pub const DEFAULT_DEBRIS_NAMES: [&str; 8] = [
    "fragment_A",
    "corrupt_B",
    "debris_01",
    "shard_02",
    "remnant_C",
    "chunk_03",
    "erased_D",
    "lost_04",
];

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| (*n).to_owned()).collect()
}

fn default_name() -> String {
    String::from("Unnamed Dig Site")
}

fn default_theme() -> String {
    String::from("corporate")
}

const fn default_max_depth() -> u32 {
    3
}

const fn default_branch_factor() -> f64 {
    2.5
}

const fn default_branch_spread() -> f64 {
    0.8
}

const fn default_files_per_dir() -> f64 {
    3.0
}

const fn default_file_spread() -> f64 {
    1.0
}

const fn default_debris_ratio() -> f64 {
    0.3
}

const fn default_artifact_density() -> f64 {
    0.2
}

const fn default_base_corruption() -> f64 {
    0.1
}

const fn default_corruption_jitter() -> f64 {
    0.03
}

fn default_dir_names() -> Vec<String> {
    owned(&DEFAULT_DIR_NAMES)
}

fn default_file_names() -> Vec<String> {
    owned(&DEFAULT_FILE_NAMES)
}

fn default_debris_names() -> Vec<String> {
    owned(&DEFAULT_DEBRIS_NAMES)
}

/// Parameters shaping a generated site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Human-readable site name, stored in node metadata.
    #[serde(default = "default_name")]
    pub name: String,
    /// Flavor tag; also used to derive artifact ids.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Maximum directory nesting (root is depth 0).
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Mean number of subdirectories per directory.
    #[serde(default = "default_branch_factor")]
    pub branch_factor: f64,
    /// Standard deviation of the subdirectory count.
    #[serde(default = "default_branch_spread")]
    pub branch_spread: f64,
    /// Mean number of files and debris per leaf directory.
    #[serde(default = "default_files_per_dir")]
    pub files_per_dir: f64,
    /// Standard deviation of the per-leaf file count.
    #[serde(default = "default_file_spread")]
    pub file_spread: f64,
    /// Probability that a leaf slot becomes debris instead of a file.
    #[serde(default = "default_debris_ratio")]
    pub debris_ratio: f64,
    /// Probability that a file carries an artifact.
    #[serde(default = "default_artifact_density")]
    pub artifact_density: f64,
    /// Starting corruption of every node.
    #[serde(default = "default_base_corruption")]
    pub base_corruption: f64,
    /// Half-width of the uniform noise added to `base_corruption`.
    #[serde(default = "default_corruption_jitter")]
    pub corruption_jitter: f64,
    /// Directory name pool.
    #[serde(default = "default_dir_names")]
    pub dir_names: Vec<String>,
    /// File name pool.
    #[serde(default = "default_file_names")]
    pub file_names: Vec<String>,
    /// Debris name pool.
    #[serde(default = "default_debris_names")]
    pub debris_names: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            name: default_name(),
            theme: default_theme(),
            max_depth: default_max_depth(),
            branch_factor: default_branch_factor(),
            branch_spread: default_branch_spread(),
            files_per_dir: default_files_per_dir(),
            file_spread: default_file_spread(),
            debris_ratio: default_debris_ratio(),
            artifact_density: default_artifact_density(),
            base_corruption: default_base_corruption(),
            corruption_jitter: default_corruption_jitter(),
            dir_names: default_dir_names(),
            file_names: default_file_names(),
            debris_names: default_debris_names(),
        }
    }
}

impl SiteProfile {
    /// Shallow, sparse, lightly decayed.
    pub fn corporate() -> Self {
        Self {
            name: String::from("Abandoned Corporate Server"),
            theme: String::from("corporate"),
            max_depth: 2,
            branch_factor: 2.0,
            files_per_dir: 3.0,
            debris_ratio: 0.25,
            artifact_density: 0.15,
            base_corruption: 0.08,
            ..Self::default()
        }
    }

    /// Few folders, many files, heavily decayed.
    pub fn personal() -> Self {
        Self {
            name: String::from("Personal Databank"),
            theme: String::from("personal"),
            max_depth: 2,
            branch_factor: 1.5,
            files_per_dir: 5.0,
            debris_ratio: 0.4,
            artifact_density: 0.3,
            base_corruption: 0.2,
            ..Self::default()
        }
    }

    /// Deep and well preserved.
    pub fn research() -> Self {
        Self {
            name: String::from("Research Terminal"),
            theme: String::from("research"),
            max_depth: 3,
            branch_factor: 2.0,
            files_per_dir: 6.0,
            debris_ratio: 0.2,
            artifact_density: 0.25,
            base_corruption: 0.05,
            ..Self::default()
        }
    }

    /// Look up a preset by (case-insensitive) name.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "corporate" => Some(Self::corporate()),
            "personal" => Some(Self::personal()),
            "research" => Some(Self::research()),
            _ => None,
        }
    }

    /// Names of the built-in presets.
    pub const PRESETS: [&'static str; 3] = ["corporate", "personal", "research"];
}
