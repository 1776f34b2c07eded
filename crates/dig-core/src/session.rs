//! One game session: the subsystems, the shared bus, and the turn pipeline.
//!
//! Each turn runs in a fixed order:
//!
//! 1. **Action** -- [`DigSession::perform`] charges the action's cost, runs
//!    it against the excavation or the artifact registry, and records the
//!    player's location as the last action node.
//! 2. **Advance** -- the bus turn counter moves on and deferred events are
//!    promoted.
//! 3. **Decay** -- every visible node gains its per-turn corruption.
//! 4. **Drain** -- passive energy drain.
//! 5. **Daemons** -- perception, movement, contact, and node corruption,
//!    using the player's current directory and last action node.
//! 6. **Flush** -- every queued event reaches its subscribers.
//!
//! Decay runs before the daemons so that perception and contact in the same
//! turn see this turn's corruption.

use std::cell::Cell;
use std::rc::Rc;

use dig_agents::{SentinelAi, TickReport, spawn_roster};
use dig_events::{Event, EventBus, EventKind, EventPayload};
use dig_ledger::{Artifact, ArtifactRegistry, CollectFailure, ResourceLedger};
use dig_types::{ArtifactId, ArtifactState, DaemonId, NodeId, Rarity, ResourceKind, Visibility};
use dig_world::{Excavation, NodeTree, RevealOutcome, SiteGenerator};
use tracing::{debug, info};

use crate::action::{Action, ActionCosts, ActionEffect, ActionOutcome};
use crate::config::SimulationConfig;
use crate::error::SessionError;

const SOURCE: &str = "session";

/// Description attached to every generated artifact.
const ARTIFACT_DESCRIPTION: &str = "A recovered piece of the lost digital civilization.";

/// What one call to [`DigSession::end_turn`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    /// The turn that was entered.
    pub turn: u64,
    /// Events delivered by the closing flush.
    pub events_delivered: usize,
    /// Corruption thresholds crossed by decay.
    pub threshold_crossings: usize,
    /// Whether the passive energy drain could be paid.
    pub energy_paid: bool,
    /// Daemon activity.
    pub daemons: TickReport,
}

/// A running game.
#[derive(Debug)]
pub struct DigSession {
    bus: Rc<EventBus>,
    excavation: Excavation,
    resources: ResourceLedger,
    artifacts: ArtifactRegistry,
    sentinel: SentinelAi,
    costs: ActionCosts,
    last_action: Option<NodeId>,
    max_turns: u64,
    quit: Rc<Cell<bool>>,
}

impl DigSession {
    /// Generate the configured site and build a session around it.
    ///
    /// # Errors
    ///
    /// [`SessionError::Config`] for an unknown site profile, otherwise any
    /// fault from [`DigSession::from_tree`].
    pub fn new(config: &SimulationConfig) -> Result<Self, SessionError> {
        let profile = config.site.resolve()?;
        let tree = SiteGenerator::new(profile).generate(config.world.seed)?;
        Self::from_tree(config, tree)
    }

    /// Build a session around an existing tree.
    ///
    /// Registers one artifact per artifact-bearing file (rarity from the
    /// file's corruption) and spawns the configured daemon roster.
    ///
    /// # Errors
    ///
    /// [`SessionError::Config`] for an invalid action price,
    /// [`SessionError::Ledger`] for invalid gauge or economy settings,
    /// [`SessionError::Agent`] if a daemon cannot be placed.
    pub fn from_tree(config: &SimulationConfig, tree: NodeTree) -> Result<Self, SessionError> {
        config.validate()?;
        let seed = config.world.seed;
        let bus = Rc::new(EventBus::new());

        let resources = ResourceLedger::new(config.resources.limits(), Rc::clone(&bus))?;
        let mut artifacts = ArtifactRegistry::new(config.artifacts.economy(), Rc::clone(&bus))?;
        for node in tree.artifact_nodes() {
            let Some(id) = node.artifact() else {
                continue;
            };
            let name = format!("Data Fragment: {}", node.name());
            let mut artifact = Artifact::new(id.clone(), name, node.id())
                .with_rarity(Rarity::from_corruption(node.corruption()))
                .with_description(ARTIFACT_DESCRIPTION);
            if let Some(theme) = node.metadata().get("theme") {
                artifact = artifact.with_metadata("theme", theme.clone());
            }
            artifacts.register(artifact);
        }

        let mut sentinel = SentinelAi::new(config.daemons.clone(), seed, Rc::clone(&bus));
        spawn_roster(&mut sentinel, &config.daemons.roster, &tree, seed)?;

        let excavation = Excavation::new(tree, Rc::clone(&bus)).with_tuning(
            config.excavation.corruption_per_turn,
            config.excavation.carve_fail_threshold,
        );

        let quit = Rc::new(Cell::new(false));
        let flag = Rc::clone(&quit);
        bus.subscribe(EventKind::QuitRequested, move |_, _| {
            flag.set(true);
            Ok(())
        });

        info!(
            seed,
            nodes = excavation.tree().len(),
            artifacts = artifacts.len(),
            daemons = sentinel.len(),
            "session started"
        );

        Ok(Self {
            bus,
            excavation,
            resources,
            artifacts,
            sentinel,
            costs: config.costs,
            last_action: None,
            max_turns: config.world.max_turns,
            quit,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The shared event bus; subscribe here to observe the game.
    pub const fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// The site being dug.
    pub const fn excavation(&self) -> &Excavation {
        &self.excavation
    }

    /// Power, memory, and energy.
    pub const fn resources(&self) -> &ResourceLedger {
        &self.resources
    }

    /// Every artifact of the site.
    pub const fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    /// The daemon system.
    pub const fn sentinel(&self) -> &SentinelAi {
        &self.sentinel
    }

    /// Node of the player's most recent action, if any.
    pub const fn last_action(&self) -> Option<NodeId> {
        self.last_action
    }

    /// Current turn number.
    pub fn turn(&self) -> u64 {
        self.bus.turn()
    }

    /// Turn limit from the configuration.
    pub const fn max_turns(&self) -> u64 {
        self.max_turns
    }

    /// Whether a delivered `QuitRequested` has ended the session.
    pub fn quit_requested(&self) -> bool {
        self.quit.get()
    }

    /// Whether the session should stop: quit was delivered or the turn
    /// limit is reached.
    pub fn is_over(&self) -> bool {
        self.quit_requested() || self.turn() >= self.max_turns
    }

    /// Permanently neutralize a daemon.
    ///
    /// # Errors
    ///
    /// [`SessionError::Agent`] for an unknown daemon.
    pub fn pacify(&mut self, daemon: DaemonId) -> Result<bool, SessionError> {
        Ok(self.sentinel.pacify(daemon)?)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Run one player action.
    ///
    /// Posts `CommandEntered`, charges the action's cost all-or-nothing,
    /// then runs it. An unaffordable action fails with reason
    /// `insufficient_resources` and runs nothing. Every action that runs,
    /// successful or not, records the resulting current directory as the
    /// last action node.
    ///
    /// # Errors
    ///
    /// [`SessionError::Ledger`] only for ledger usage faults (invalid cost
    /// amounts).
    pub fn perform(&mut self, action: Action) -> Result<ActionOutcome, SessionError> {
        let verb = action.verb();
        debug!(command = %action, "action received");
        self.post(EventPayload::CommandEntered {
            command: action.to_string(),
        });

        let costs = self.costs.for_action(&action);
        if !costs.is_empty() && !self.resources.consume_all(&costs, verb)? {
            debug!(command = %action, "action refused: cannot afford");
            return Ok(ActionOutcome::failed(verb, "insufficient_resources"));
        }

        let outcome = match action {
            Action::Scan(target) => self.scan(&target),
            Action::ScanAll => self.scan_all(),
            Action::Carve(target) => self.carve(&target),
            Action::Reconstruct(target) => self.reconstruct(&target)?,
            Action::Sell(artifact) => self.sell(artifact),
            Action::ChangeDirectory(target) => self.change_directory(&target),
            Action::Quit => {
                info!("quit requested");
                self.post(EventPayload::QuitRequested);
                ActionOutcome::ok(verb, ActionEffect::QuitRequested)
            }
        };

        self.last_action = Some(self.excavation.cwd());
        Ok(outcome)
    }

    /// Parse and run a command line such as `SCAN memo.doc`.
    ///
    /// Unparseable input fails with reason `parse_error` and costs nothing.
    ///
    /// # Errors
    ///
    /// See [`DigSession::perform`].
    pub fn execute(&mut self, line: &str) -> Result<ActionOutcome, SessionError> {
        match line.parse::<Action>() {
            Ok(action) => self.perform(action),
            Err(err) => {
                debug!(input = line, error = %err, "command rejected");
                Ok(ActionOutcome::failed("", format!("parse_error: {err}")))
            }
        }
    }

    fn scan(&mut self, target: &str) -> ActionOutcome {
        self.post(EventPayload::ScanStarted {
            target: target.to_owned(),
        });
        match self.excavation.reveal(target) {
            Ok(step) => {
                self.note_found(&step);
                ActionOutcome::ok("SCAN", ActionEffect::Scanned(vec![step]))
            }
            Err(err) => ActionOutcome::failed("SCAN", err.to_string()),
        }
    }

    fn scan_all(&mut self) -> ActionOutcome {
        self.post(EventPayload::ScanStarted {
            target: String::from("*"),
        });
        let steps = self.excavation.reveal_all();
        if steps.is_empty() {
            return ActionOutcome::failed("SCAN", "nothing_to_scan");
        }
        for step in &steps {
            self.note_found(step);
        }
        ActionOutcome::ok("SCAN", ActionEffect::Scanned(steps))
    }

    fn note_found(&mut self, step: &RevealOutcome) {
        if let Some(artifact) = &step.artifact {
            self.artifacts.mark_found(artifact);
        }
    }

    fn carve(&mut self, target: &str) -> ActionOutcome {
        self.post(EventPayload::CarveStarted {
            target: target.to_owned(),
        });
        match self.excavation.convert(target) {
            Ok(carve) if carve.success => ActionOutcome::ok("CARVE", ActionEffect::Carved(carve)),
            Ok(carve) => ActionOutcome::failed_with(
                "CARVE",
                "corruption_too_high",
                ActionEffect::Carved(carve),
            ),
            Err(err) => ActionOutcome::failed("CARVE", err.to_string()),
        }
    }

    fn reconstruct(&mut self, target: &str) -> Result<ActionOutcome, SessionError> {
        let Some(node) = self
            .excavation
            .find_child(target)
            .filter(|n| n.visibility() == Visibility::Revealed)
        else {
            let reason = format!("no revealed node named {target:?}");
            return Ok(ActionOutcome::failed("RECON", reason));
        };
        let Some(artifact) = node.artifact().cloned() else {
            return Ok(ActionOutcome::failed("RECON", "no_artifact"));
        };
        let corruption = node.corruption();

        self.post(EventPayload::ReconstructStarted {
            artifact: artifact.clone(),
        });
        self.artifacts.mark_found(&artifact);
        match self
            .artifacts
            .collect(&artifact, corruption, &mut self.resources)
        {
            Ok(receipt) => Ok(ActionOutcome::ok(
                "RECON",
                ActionEffect::Collected { artifact, receipt },
            )),
            Err(CollectFailure::Ledger(err)) => Err(err.into()),
            Err(failure) => Ok(ActionOutcome::failed("RECON", failure.reason())),
        }
    }

    fn sell(&mut self, artifact: ArtifactId) -> ActionOutcome {
        let state = self.artifacts.get(&artifact).map(Artifact::state);
        if state != Some(ArtifactState::Collected) {
            return ActionOutcome::failed("SELL", "not_collected");
        }
        let earned = self.artifacts.sell(&artifact, &mut self.resources);
        ActionOutcome::ok("SELL", ActionEffect::Sold { artifact, earned })
    }

    fn change_directory(&mut self, target: &str) -> ActionOutcome {
        match self.excavation.change_directory(target) {
            Ok(node) => ActionOutcome::ok("CD", ActionEffect::Moved { node }),
            Err(err) => ActionOutcome::failed("CD", err.to_string()),
        }
    }

    // -----------------------------------------------------------------------
    // Turn pipeline
    // -----------------------------------------------------------------------

    /// Close the turn: advance, decay, drain, run daemons, flush.
    pub fn end_turn(&mut self) -> TurnSummary {
        let turn = self.bus.advance_turn();
        let threshold_crossings = self.excavation.tick();
        let energy_paid = self.resources.tick();
        let player = self.excavation.cwd();
        let daemons = self.sentinel.tick(
            &mut self.excavation,
            &mut self.resources,
            player,
            self.last_action,
        );
        let events_delivered = self.bus.flush();

        debug!(
            turn,
            events_delivered,
            threshold_crossings,
            contacts = daemons.contacts,
            power = self.resources.current(ResourceKind::Power),
            "turn closed"
        );
        TurnSummary {
            turn,
            events_delivered,
            threshold_crossings,
            energy_paid,
            daemons,
        }
    }

    /// Perform `action` and close the turn.
    ///
    /// # Errors
    ///
    /// See [`DigSession::perform`]. The turn is not closed on error.
    pub fn play(&mut self, action: Action) -> Result<(ActionOutcome, TurnSummary), SessionError> {
        let outcome = self.perform(action)?;
        let summary = self.end_turn();
        Ok((outcome, summary))
    }

    fn post(&self, payload: EventPayload) {
        self.bus.post(Event::immediate(payload).with_source(SOURCE));
    }
}
