//! Headless game loop.
//!
//! [`run`] asks a [`Pilot`] for one action per turn, plays it through the
//! session's turn pipeline, and stops on the first end condition:
//!
//! - **Quit**: a `QuitRequested` event was delivered
//! - **Turn limit**: the configured `max_turns` was reached
//! - **Power depleted**: the power gauge hit zero
//! - **Stalled**: the pilot's action was refused for lack of resources
//! - **Pilot finished**: the pilot had nothing left to do

use dig_core::{DigSession, SessionError, TurnSummary};
use dig_types::{ArtifactState, ResourceKind};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::pilot::Pilot;

const REFUSED: &str = "insufficient_resources";

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The player quit.
    Quit,
    /// `max_turns` turns were played.
    MaxTurnsReached,
    /// Power ran out.
    PowerDepleted,
    /// An action could not be paid for.
    Stalled,
    /// The pilot returned no action.
    PilotFinished,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Turns played by this run.
    pub turns_played: u64,
    /// Summary of the last turn, if any was played.
    pub final_summary: Option<TurnSummary>,
    /// Currency at the end.
    pub currency: Decimal,
    /// Artifacts sold.
    pub artifacts_sold: usize,
}

/// Play until an end condition is met.
///
/// # Errors
///
/// Returns [`SessionError`] if an action hits a usage fault.
pub fn run(session: &mut DigSession, pilot: &mut dyn Pilot) -> Result<RunResult, SessionError> {
    let mut turns_played: u64 = 0;
    let mut final_summary = None;

    info!(
        max_turns = session.max_turns(),
        daemons = session.sentinel().len(),
        artifacts = session.artifacts().len(),
        "run starting"
    );

    let end_reason = loop {
        if let Some(reason) = end_condition(session) {
            break reason;
        }
        let Some(action) = pilot.next_action(session) else {
            break EndReason::PilotFinished;
        };
        let (outcome, summary) = session.play(action.clone())?;
        pilot.observe(&action, &outcome, session);
        turns_played = turns_played.saturating_add(1);
        final_summary = Some(summary);

        debug!(
            turn = summary.turn,
            command = %action,
            success = outcome.success,
            reason = ?outcome.reason,
            "turn played"
        );
        if outcome.reason.as_deref() == Some(REFUSED) {
            warn!(command = %action, "action refused for lack of resources");
            break EndReason::Stalled;
        }
    };

    Ok(RunResult {
        end_reason,
        turns_played,
        final_summary,
        currency: session.artifacts().currency(),
        artifacts_sold: session.artifacts().in_state(ArtifactState::Sold).len(),
    })
}

fn end_condition(session: &DigSession) -> Option<EndReason> {
    if session.quit_requested() {
        Some(EndReason::Quit)
    } else if session.turn() >= session.max_turns() {
        Some(EndReason::MaxTurnsReached)
    } else if session.resources().is_depleted(ResourceKind::Power) {
        Some(EndReason::PowerDepleted)
    } else {
        None
    }
}

/// Log the end-of-run report.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        turns_played = result.turns_played,
        final_turn = result.final_summary.as_ref().map(|s| s.turn),
        currency = %result.currency,
        artifacts_sold = result.artifacts_sold,
        "run ended"
    );
    if result.final_summary.is_none() {
        warn!("run ended with no turns played");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dig_core::{Action, SimulationConfig};
    use dig_types::{ArtifactId, NodeKind};
    use dig_world::NodeTree;

    use crate::pilot::Autopilot;

    fn site() -> NodeTree {
        let mut tree = NodeTree::with_root("root");
        let root = tree.root();
        let memo = tree.add_node(root, "memo.doc", NodeKind::File).unwrap();
        tree.add_node(root, "vault", NodeKind::Directory).unwrap();
        tree.attach_artifact(memo, ArtifactId::new("arc_test_0000")).unwrap();
        tree
    }

    fn quiet() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.daemons.roster.clear();
        config
    }

    /// Plays the same action forever.
    struct Repeat(Action);

    impl Pilot for Repeat {
        fn next_action(&mut self, _session: &DigSession) -> Option<Action> {
            Some(self.0.clone())
        }
    }

    /// Never acts.
    struct Idle;

    impl Pilot for Idle {
        fn next_action(&mut self, _session: &DigSession) -> Option<Action> {
            None
        }
    }

    #[test]
    fn autopilot_run_ends_on_quit_with_profit() {
        let mut session = DigSession::from_tree(&quiet(), site()).unwrap();
        let result = run(&mut session, &mut Autopilot::new()).unwrap();
        assert_eq!(result.end_reason, EndReason::Quit);
        assert_eq!(result.artifacts_sold, 1);
        assert!(result.currency > Decimal::ZERO);
        assert_eq!(result.final_summary.map(|s| s.turn), Some(result.turns_played));
    }

    #[test]
    fn turn_limit_stops_the_run() {
        let mut config = quiet();
        config.world.max_turns = 4;
        let mut session = DigSession::from_tree(&config, site()).unwrap();
        let mut pilot = Repeat(Action::ChangeDirectory(String::from("..")));
        let result = run(&mut session, &mut pilot).unwrap();
        assert_eq!(result.end_reason, EndReason::MaxTurnsReached);
        assert_eq!(result.turns_played, 4);
    }

    #[test]
    fn unaffordable_action_stalls_the_run() {
        let mut config = quiet();
        config.resources.power = 12.0;
        let mut session = DigSession::from_tree(&config, site()).unwrap();
        let result = run(&mut session, &mut Repeat(Action::ScanAll)).unwrap();
        // 12 power pays for two scans; the third is refused.
        assert_eq!(result.end_reason, EndReason::Stalled);
        assert_eq!(result.turns_played, 3);
    }

    #[test]
    fn exhausted_power_ends_the_run() {
        let mut config = quiet();
        config.resources.power = 10.0;
        let mut session = DigSession::from_tree(&config, site()).unwrap();
        let result = run(&mut session, &mut Repeat(Action::ScanAll)).unwrap();
        assert_eq!(result.end_reason, EndReason::PowerDepleted);
        assert_eq!(result.turns_played, 2);
    }

    #[test]
    fn idle_pilot_finishes_immediately() {
        let mut session = DigSession::from_tree(&quiet(), site()).unwrap();
        let result = run(&mut session, &mut Idle).unwrap();
        assert_eq!(result.end_reason, EndReason::PilotFinished);
        assert_eq!(result.turns_played, 0);
        assert!(result.final_summary.is_none());
        log_run_end(&result);
    }
}
