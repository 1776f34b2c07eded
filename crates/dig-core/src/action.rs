//! Player actions, their prices, and their outcomes.
//!
//! An [`Action`] is one player command. Before it runs, the session charges
//! its [`ActionCost`] all-or-nothing; the result comes back as an
//! [`ActionOutcome`] carrying a success flag, a machine-readable failure
//! reason, and the typed [`ActionEffect`].

use std::fmt;
use std::str::FromStr;

use dig_ledger::CollectReceipt;
use dig_types::{ArtifactId, NodeId, ResourceKind};
use dig_world::{CarveOutcome, RevealOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------
// Actions
// -----------------------------------------------------------------------

/// One player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Advance the visibility of one child of the current directory.
    Scan(String),
    /// Scan every child of the current directory once.
    ScanAll,
    /// Carve visible debris into a file.
    Carve(String),
    /// Reconstruct the artifact held by a revealed file.
    Reconstruct(String),
    /// Sell a collected artifact.
    Sell(ArtifactId),
    /// Enter a child directory, or `..` for the parent.
    ChangeDirectory(String),
    /// End the session.
    Quit,
}

impl Action {
    /// Upper-case command verb.
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Scan(_) | Self::ScanAll => "SCAN",
            Self::Carve(_) => "CARVE",
            Self::Reconstruct(_) => "RECON",
            Self::Sell(_) => "SELL",
            Self::ChangeDirectory(_) => "CD",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scan(target)
            | Self::Carve(target)
            | Self::Reconstruct(target)
            | Self::ChangeDirectory(target) => write!(f, "{} {target}", self.verb()),
            Self::ScanAll => write!(f, "{} *", self.verb()),
            Self::Sell(artifact) => write!(f, "{} {artifact}", self.verb()),
            Self::Quit => f.write_str(self.verb()),
        }
    }
}

/// Why a command line could not be turned into an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    /// Blank input.
    #[error("no command entered")]
    Empty,

    /// The verb is not a known command.
    #[error("unknown command {0:?}")]
    UnknownVerb(String),

    /// The verb needs a target and none was given.
    #[error("{verb} needs a target")]
    MissingTarget {
        /// The verb that was given.
        verb: &'static str,
    },
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// Parse `VERB [target]`, case-insensitive on the verb. Extra words are
    /// ignored.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut words = input.split_whitespace();
        let verb = words.next().ok_or(ActionParseError::Empty)?;
        let target = words.next().map(str::to_owned);
        let needs = |verb: &'static str| {
            target
                .clone()
                .ok_or(ActionParseError::MissingTarget { verb })
        };

        match verb.to_ascii_uppercase().as_str() {
            "SCAN" => {
                let target = needs("SCAN")?;
                Ok(if target == "*" {
                    Self::ScanAll
                } else {
                    Self::Scan(target)
                })
            }
            "CARVE" => needs("CARVE").map(Self::Carve),
            "RECON" => needs("RECON").map(Self::Reconstruct),
            "SELL" => needs("SELL").map(|id| Self::Sell(ArtifactId::new(id))),
            "CD" => needs("CD").map(Self::ChangeDirectory),
            "QUIT" => Ok(Self::Quit),
            _ => Err(ActionParseError::UnknownVerb(verb.to_owned())),
        }
    }
}

// -----------------------------------------------------------------------
// Costs
// -----------------------------------------------------------------------

/// Resources charged for one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionCost {
    /// Power spent.
    #[serde(default)]
    pub power: f64,
    /// Memory spent.
    #[serde(default)]
    pub memory: f64,
    /// Energy spent.
    #[serde(default)]
    pub energy: f64,
}

impl ActionCost {
    /// A power-only price.
    pub const fn power(power: f64) -> Self {
        Self {
            power,
            memory: 0.0,
            energy: 0.0,
        }
    }

    /// The components in gauge order.
    const fn components(&self) -> [(ResourceKind, f64); 3] {
        [
            (ResourceKind::Power, self.power),
            (ResourceKind::Memory, self.memory),
            (ResourceKind::Energy, self.energy),
        ]
    }

    /// The non-zero components, in gauge order. Negative and non-finite
    /// amounts are kept so the ledger rejects them.
    pub fn bundle(&self) -> Vec<(ResourceKind, f64)> {
        self.components()
            .into_iter()
            .filter(|&(_, amount)| amount != 0.0)
            .collect()
    }

    /// First component that is negative or non-finite, if any.
    pub fn invalid_component(&self) -> Option<(ResourceKind, f64)> {
        self.components()
            .into_iter()
            .find(|&(_, amount)| !(amount.is_finite() && amount >= 0.0))
    }
}

/// Price list for the paid actions. Selling, moving, and quitting are
/// free.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionCosts {
    /// Charged once per scan, including a sweep of the whole directory.
    #[serde(default = "default_scan_cost")]
    pub scan: ActionCost,
    /// Charged per carve attempt.
    #[serde(default = "default_carve_cost")]
    pub carve: ActionCost,
    /// Charged per reconstruction attempt, on top of the artifact's memory.
    #[serde(default = "default_reconstruct_cost")]
    pub reconstruct: ActionCost,
}

impl Default for ActionCosts {
    fn default() -> Self {
        Self {
            scan: default_scan_cost(),
            carve: default_carve_cost(),
            reconstruct: default_reconstruct_cost(),
        }
    }
}

impl ActionCosts {
    /// Every priced entry, labelled with its verb.
    pub const fn entries(&self) -> [(&'static str, ActionCost); 3] {
        [
            ("SCAN", self.scan),
            ("CARVE", self.carve),
            ("RECON", self.reconstruct),
        ]
    }

    /// What `action` costs.
    pub fn for_action(&self, action: &Action) -> Vec<(ResourceKind, f64)> {
        match action {
            Action::Scan(_) | Action::ScanAll => self.scan.bundle(),
            Action::Carve(_) => self.carve.bundle(),
            Action::Reconstruct(_) => self.reconstruct.bundle(),
            Action::Sell(_) | Action::ChangeDirectory(_) | Action::Quit => Vec::new(),
        }
    }
}

const fn default_scan_cost() -> ActionCost {
    ActionCost::power(5.0)
}

const fn default_carve_cost() -> ActionCost {
    ActionCost {
        power: 8.0,
        memory: 0.0,
        energy: 4.0,
    }
}

const fn default_reconstruct_cost() -> ActionCost {
    ActionCost::power(12.0)
}

// -----------------------------------------------------------------------
// Outcomes
// -----------------------------------------------------------------------

/// What an action changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionEffect {
    /// Nothing (failures and refused actions).
    None,
    /// Scan steps, one per scanned node.
    Scanned(Vec<RevealOutcome>),
    /// A carve attempt on valid debris.
    Carved(CarveOutcome),
    /// A successful reconstruction.
    Collected {
        /// The artifact.
        artifact: ArtifactId,
        /// Frozen condition and price.
        receipt: CollectReceipt,
    },
    /// A sale.
    Sold {
        /// The artifact.
        artifact: ArtifactId,
        /// Currency earned.
        earned: Decimal,
    },
    /// A directory change.
    Moved {
        /// The new current directory.
        node: NodeId,
    },
    /// Quit was requested.
    QuitRequested,
}

/// Display-ready result of one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Verb of the action.
    pub verb: &'static str,
    /// Whether the action did what was asked.
    pub success: bool,
    /// Machine-readable failure reason.
    pub reason: Option<String>,
    /// Typed effect.
    pub effect: ActionEffect,
}

impl ActionOutcome {
    /// A successful outcome.
    pub const fn ok(verb: &'static str, effect: ActionEffect) -> Self {
        Self {
            verb,
            success: true,
            reason: None,
            effect,
        }
    }

    /// A failed outcome with no effect.
    pub fn failed(verb: &'static str, reason: impl Into<String>) -> Self {
        Self {
            verb,
            success: false,
            reason: Some(reason.into()),
            effect: ActionEffect::None,
        }
    }

    /// A failed outcome that still changed something (e.g. a carve that
    /// the debris resisted).
    pub fn failed_with(verb: &'static str, reason: impl Into<String>, effect: ActionEffect) -> Self {
        Self {
            verb,
            success: false,
            reason: Some(reason.into()),
            effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_case_insensitively() {
        assert_eq!("scan memo.doc".parse::<Action>(), Ok(Action::Scan(String::from("memo.doc"))));
        assert_eq!("SCAN *".parse::<Action>(), Ok(Action::ScanAll));
        assert_eq!("Carve chunk_03".parse::<Action>(), Ok(Action::Carve(String::from("chunk_03"))));
        assert_eq!("cd ..".parse::<Action>(), Ok(Action::ChangeDirectory(String::from(".."))));
        assert_eq!(
            "sell arc_corporate_0002".parse::<Action>(),
            Ok(Action::Sell(ArtifactId::new("arc_corporate_0002")))
        );
        assert_eq!("quit now".parse::<Action>(), Ok(Action::Quit));
    }

    #[test]
    fn bad_commands_are_rejected() {
        assert_eq!("   ".parse::<Action>(), Err(ActionParseError::Empty));
        assert_eq!(
            "dance".parse::<Action>(),
            Err(ActionParseError::UnknownVerb(String::from("dance")))
        );
        assert_eq!(
            "recon".parse::<Action>(),
            Err(ActionParseError::MissingTarget { verb: "RECON" })
        );
    }

    #[test]
    fn display_reproduces_the_command_line() {
        assert_eq!(Action::ScanAll.to_string(), "SCAN *");
        assert_eq!(Action::Reconstruct(String::from("a.txt")).to_string(), "RECON a.txt");
        assert_eq!(Action::Quit.to_string(), "QUIT");
    }

    #[test]
    fn default_prices_match_the_command_table() {
        let costs = ActionCosts::default();
        assert_eq!(
            costs.for_action(&Action::Carve(String::from("x"))),
            vec![(ResourceKind::Power, 8.0), (ResourceKind::Energy, 4.0)]
        );
        assert_eq!(costs.for_action(&Action::ScanAll), vec![(ResourceKind::Power, 5.0)]);
        assert!(costs.for_action(&Action::Quit).is_empty());
        assert!(costs.for_action(&Action::Sell(ArtifactId::new("a"))).is_empty());
    }

    #[test]
    fn negative_and_nan_prices_reach_the_ledger() {
        let cost = ActionCost {
            power: -5.0,
            memory: 0.0,
            energy: f64::NAN,
        };
        let bundle = cost.bundle();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.first().map(|&(kind, _)| kind), Some(ResourceKind::Power));
        assert_eq!(cost.invalid_component().map(|(kind, _)| kind), Some(ResourceKind::Power));
        assert!(ActionCost::power(5.0).invalid_component().is_none());
        assert!(ActionCosts::default()
            .entries()
            .iter()
            .all(|(_, cost)| cost.invalid_component().is_none()));
    }
}
