//! Artifact records and the registry that moves them through their
//! lifecycle.
//!
//! ```text
//! UNDISCOVERED -> FOUND -> COLLECTED -> SOLD
//!                              |
//!                     (holds memory until sold)
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use dig_events::{Event, EventBus, EventPayload};
use dig_types::{ArtifactId, ArtifactState, NodeId, Rarity, ResourceKind};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{CollectFailure, LedgerError};
use crate::resources::ResourceLedger;

/// Memory reserved by each collected artifact.
pub const DEFAULT_MEMORY_COST: f64 = 10.0;

/// Sell value of a pristine common artifact.
pub const DEFAULT_BASE_VALUE: f64 = 50.0;

/// Condition never drops below this, however decayed the node.
const MIN_CONDITION: f64 = 0.01;

const SOURCE: &str = "artifacts";

/// A recoverable relic attached to a file node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    id: ArtifactId,
    name: String,
    description: String,
    node: NodeId,
    rarity: Rarity,
    state: ArtifactState,
    condition: f64,
    sell_value: Decimal,
    metadata: BTreeMap<String, String>,
}

impl Artifact {
    /// An undiscovered common artifact on `node`.
    pub fn new(id: ArtifactId, name: impl Into<String>, node: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            node,
            rarity: Rarity::Common,
            state: ArtifactState::Undiscovered,
            condition: 1.0,
            sell_value: Decimal::ZERO,
            metadata: BTreeMap::new(),
        }
    }

    /// Set the rarity tier.
    #[must_use]
    pub const fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Set the lore text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Identifier.
    pub const fn id(&self) -> &ArtifactId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lore text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The file node holding this artifact.
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Rarity tier.
    pub const fn rarity(&self) -> Rarity {
        self.rarity
    }

    /// Lifecycle state.
    pub const fn state(&self) -> ArtifactState {
        self.state
    }

    /// Intactness in `[0.01, 1]`, frozen at collection.
    pub const fn condition(&self) -> f64 {
        self.condition
    }

    /// Sale price; zero unless collected.
    pub const fn sell_value(&self) -> Decimal {
        self.sell_value
    }

    /// Free-form metadata.
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Registry tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEconomy {
    /// Memory held by each collected artifact.
    pub memory_cost: f64,
    /// Value of a pristine common artifact.
    pub base_value: f64,
}

impl Default for ArtifactEconomy {
    fn default() -> Self {
        Self {
            memory_cost: DEFAULT_MEMORY_COST,
            base_value: DEFAULT_BASE_VALUE,
        }
    }
}

/// What a successful collection produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectReceipt {
    /// Frozen condition.
    pub condition: f64,
    /// Computed sale price.
    pub sell_value: Decimal,
}

/// Every artifact of a session, keyed by id.
#[derive(Debug)]
pub struct ArtifactRegistry {
    artifacts: BTreeMap<ArtifactId, Artifact>,
    currency: Decimal,
    economy: ArtifactEconomy,
    bus: Rc<EventBus>,
}

impl ArtifactRegistry {
    /// An empty registry with zero currency.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidSetting`] for a negative or non-finite memory
    /// cost or base value.
    pub fn new(economy: ArtifactEconomy, bus: Rc<EventBus>) -> Result<Self, LedgerError> {
        for (name, value) in [
            ("memory_cost", economy.memory_cost),
            ("base_value", economy.base_value),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(LedgerError::InvalidSetting { name, value });
            }
        }
        Ok(Self {
            artifacts: BTreeMap::new(),
            currency: Decimal::ZERO,
            economy,
            bus,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Look up an artifact.
    pub fn get(&self, id: &ArtifactId) -> Option<&Artifact> {
        self.artifacts.get(id)
    }

    /// All artifacts, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.artifacts.values()
    }

    /// Artifacts currently in `state`.
    pub fn in_state(&self, state: ArtifactState) -> Vec<&Artifact> {
        self.artifacts.values().filter(|a| a.state == state).collect()
    }

    /// Number of registered artifacts.
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Currency earned from sales so far.
    pub const fn currency(&self) -> Decimal {
        self.currency
    }

    /// Active tuning.
    pub const fn economy(&self) -> ArtifactEconomy {
        self.economy
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Add an artifact. Returns `false` (and keeps the existing record) if
    /// the id is already registered.
    pub fn register(&mut self, artifact: Artifact) -> bool {
        if self.artifacts.contains_key(&artifact.id) {
            warn!(artifact = %artifact.id, "artifact already registered, skipping");
            return false;
        }
        debug!(artifact = %artifact.id, rarity = ?artifact.rarity, "artifact registered");
        self.artifacts.insert(artifact.id.clone(), artifact);
        true
    }

    /// Advance `UNDISCOVERED -> FOUND`. Later states are left alone.
    /// Returns the artifact's state afterwards, or `None` if unknown.
    pub fn mark_found(&mut self, id: &ArtifactId) -> Option<ArtifactState> {
        let Some(artifact) = self.artifacts.get_mut(id) else {
            warn!(artifact = %id, "mark_found on unknown artifact");
            return None;
        };
        if artifact.state == ArtifactState::Undiscovered {
            artifact.state = ArtifactState::Found;
            debug!(artifact = %id, "artifact found");
        }
        Some(artifact.state)
    }

    /// Reconstruct a `FOUND` artifact into memory.
    ///
    /// Charges the memory cost from `resources`, freezes
    /// `condition = max(0.01, 1 - node_corruption)` and prices the artifact
    /// at `base_value * rarity multiplier * condition`, rounded to one
    /// decimal. Posts `ReconstructComplete` on success and on the
    /// insufficient-memory path.
    ///
    /// # Errors
    ///
    /// A [`CollectFailure`]; nothing is mutated in any failure case.
    pub fn collect(
        &mut self,
        id: &ArtifactId,
        node_corruption: f64,
        resources: &mut ResourceLedger,
    ) -> Result<CollectReceipt, CollectFailure> {
        let artifact = self
            .artifacts
            .get(id)
            .ok_or_else(|| CollectFailure::UnknownArtifact(id.clone()))?;
        if artifact.state != ArtifactState::Found {
            debug!(artifact = %id, state = ?artifact.state, "collect rejected: wrong state");
            return Err(CollectFailure::WrongState {
                artifact: id.clone(),
                state: artifact.state,
            });
        }
        let rarity = artifact.rarity;

        let cost = self.economy.memory_cost;
        if !resources.consume(ResourceKind::Memory, cost, SOURCE)? {
            let failure = CollectFailure::InsufficientMemory {
                artifact: id.clone(),
                required: cost,
                available: resources.current(ResourceKind::Memory),
            };
            debug!(artifact = %id, "collect rejected: insufficient memory");
            self.post(EventPayload::ReconstructComplete {
                artifact: id.clone(),
                success: false,
                reason: Some(failure.reason().to_owned()),
                condition: None,
            });
            return Err(failure);
        }

        let condition = (1.0 - node_corruption).clamp(MIN_CONDITION, 1.0);
        let sell_value = self.price(rarity, condition);
        if let Some(artifact) = self.artifacts.get_mut(id) {
            artifact.condition = condition;
            artifact.sell_value = sell_value;
            artifact.state = ArtifactState::Collected;
        }
        info!(artifact = %id, condition, value = %sell_value, "artifact collected");
        self.post(EventPayload::ReconstructComplete {
            artifact: id.clone(),
            success: true,
            reason: None,
            condition: Some(condition),
        });
        Ok(CollectReceipt {
            condition,
            sell_value,
        })
    }

    /// Sell a `COLLECTED` artifact: free its memory, credit its value, and
    /// post `ArtifactSold`. Any other state earns zero and changes nothing.
    pub fn sell(&mut self, id: &ArtifactId, resources: &mut ResourceLedger) -> Decimal {
        let Some(artifact) = self.artifacts.get_mut(id) else {
            debug!(artifact = %id, "sell rejected: unknown artifact");
            return Decimal::ZERO;
        };
        if artifact.state != ArtifactState::Collected {
            debug!(artifact = %id, state = ?artifact.state, "sell rejected: not collected");
            return Decimal::ZERO;
        }
        let earned = artifact.sell_value;
        artifact.state = ArtifactState::Sold;
        artifact.sell_value = Decimal::ZERO;
        self.currency = self.currency.saturating_add(earned);

        if let Err(err) = resources.restore(ResourceKind::Memory, self.economy.memory_cost, SOURCE) {
            error!(artifact = %id, error = %err, "failed to free artifact memory");
        }
        info!(artifact = %id, earned = %earned, currency = %self.currency, "artifact sold");
        self.post(EventPayload::ArtifactSold {
            artifact: id.clone(),
            value: earned,
            currency: self.currency,
        });
        earned
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn price(&self, rarity: Rarity, condition: f64) -> Decimal {
        let raw = self.economy.base_value * rarity.multiplier() * condition;
        Decimal::from_f64(raw).unwrap_or_default().round_dp(1)
    }

    fn post(&self, payload: EventPayload) {
        self.bus.post(Event::immediate(payload).with_source(SOURCE));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use dig_events::EventKind;
    use rust_decimal::prelude::ToPrimitive;

    use crate::resources::ResourceLimits;

    struct Fixture {
        bus: Rc<EventBus>,
        registry: ArtifactRegistry,
        resources: ResourceLedger,
        seen: Rc<RefCell<Vec<EventPayload>>>,
    }

    fn fixture() -> Fixture {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe_all(move |event, _| {
            sink.borrow_mut().push(event.payload().clone());
            Ok(())
        });
        let mut registry = ArtifactRegistry::new(ArtifactEconomy::default(), Rc::clone(&bus)).unwrap();
        registry.register(Artifact::new(id("arc_a"), "Memo", NodeId(1)).with_rarity(Rarity::Rare));
        registry.register(Artifact::new(id("arc_b"), "Ledger", NodeId(2)));
        let resources = ResourceLedger::new(ResourceLimits::default(), Rc::clone(&bus)).unwrap();
        Fixture {
            bus,
            registry,
            resources,
            seen,
        }
    }

    fn id(text: &str) -> ArtifactId {
        ArtifactId::new(text)
    }

    impl Fixture {
        fn drain(&self) -> Vec<EventPayload> {
            self.bus.flush();
            self.seen.borrow_mut().drain(..).collect()
        }

        fn memory(&self) -> f64 {
            self.resources.current(ResourceKind::Memory)
        }
    }

    #[test]
    fn register_is_idempotent() {
        let mut fx = fixture();
        assert_eq!(fx.registry.len(), 2);
        let duplicate = Artifact::new(id("arc_a"), "Impostor", NodeId(9));
        assert!(!fx.registry.register(duplicate));
        assert_eq!(fx.registry.get(&id("arc_a")).map(Artifact::name), Some("Memo"));
    }

    #[test]
    fn mark_found_only_advances_from_undiscovered() {
        let mut fx = fixture();
        assert_eq!(fx.registry.mark_found(&id("arc_a")), Some(ArtifactState::Found));
        assert!(fx.registry.collect(&id("arc_a"), 0.0, &mut fx.resources).is_ok());
        assert_eq!(fx.registry.mark_found(&id("arc_a")), Some(ArtifactState::Collected));
        assert_eq!(fx.registry.mark_found(&id("missing")), None);
    }

    #[test]
    fn collect_prices_by_rarity_and_condition() {
        let mut fx = fixture();
        fx.registry.mark_found(&id("arc_a"));
        let receipt = fx.registry.collect(&id("arc_a"), 0.25, &mut fx.resources).unwrap();
        assert!((receipt.condition - 0.75).abs() < f64::EPSILON);
        // 50 * 6.0 * 0.75
        assert_eq!(receipt.sell_value, Decimal::new(2250, 1));
        assert!((fx.memory() - 40.0).abs() < f64::EPSILON);

        let artifact = fx.registry.get(&id("arc_a")).unwrap();
        assert_eq!(artifact.state(), ArtifactState::Collected);
        assert_eq!(artifact.sell_value(), Decimal::new(225, 0));

        let events = fx.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            EventPayload::ReconstructComplete { success: true, .. }
        )));
    }

    #[test]
    fn condition_has_a_floor() {
        let mut fx = fixture();
        fx.registry.mark_found(&id("arc_b"));
        let receipt = fx.registry.collect(&id("arc_b"), 1.0, &mut fx.resources).unwrap();
        assert!((receipt.condition - 0.01).abs() < f64::EPSILON);
        // 50 * 1.0 * 0.01 = 0.5
        assert_eq!(receipt.sell_value.to_f64(), Some(0.5));
    }

    #[test]
    fn collect_requires_found_and_leaves_memory_alone() {
        let mut fx = fixture();
        let result = fx.registry.collect(&id("arc_a"), 0.0, &mut fx.resources);
        assert!(matches!(
            result,
            Err(CollectFailure::WrongState {
                state: ArtifactState::Undiscovered,
                ..
            })
        ));
        assert!((fx.memory() - 50.0).abs() < f64::EPSILON);
        let result = fx.registry.collect(&id("ghost"), 0.0, &mut fx.resources);
        assert!(matches!(result, Err(CollectFailure::UnknownArtifact(_))));
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn collect_without_memory_fails_and_sell_stays_blocked() {
        let mut fx = fixture();
        let _ = fx.resources.consume(ResourceKind::Memory, 50.0, "test");
        fx.drain();
        fx.registry.mark_found(&id("arc_a"));

        let result = fx.registry.collect(&id("arc_a"), 0.0, &mut fx.resources);
        assert!(matches!(result, Err(CollectFailure::InsufficientMemory { .. })));
        assert_eq!(
            fx.registry.get(&id("arc_a")).map(Artifact::state),
            Some(ArtifactState::Found)
        );
        let events = fx.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events.first(),
            Some(EventPayload::ReconstructComplete { success: false, reason: Some(r), .. })
                if r == "insufficient_memory"
        ));

        assert_eq!(fx.registry.sell(&id("arc_a"), &mut fx.resources), Decimal::ZERO);
        assert_eq!(fx.registry.currency(), Decimal::ZERO);
    }

    #[test]
    fn sell_credits_currency_and_frees_memory() {
        let mut fx = fixture();
        fx.registry.mark_found(&id("arc_b"));
        fx.registry.collect(&id("arc_b"), 0.1, &mut fx.resources).unwrap();
        fx.drain();

        let earned = fx.registry.sell(&id("arc_b"), &mut fx.resources);
        assert_eq!(earned, Decimal::new(450, 1));
        assert_eq!(fx.registry.currency(), Decimal::new(450, 1));
        assert!((fx.memory() - 50.0).abs() < f64::EPSILON);
        let artifact = fx.registry.get(&id("arc_b")).unwrap();
        assert_eq!(artifact.state(), ArtifactState::Sold);
        assert_eq!(artifact.sell_value(), Decimal::ZERO);

        let kinds: Vec<EventKind> = fx.drain().iter().map(EventPayload::kind).collect();
        assert_eq!(kinds, vec![EventKind::ResourceChanged, EventKind::ArtifactSold]);

        // Selling twice earns nothing.
        assert_eq!(fx.registry.sell(&id("arc_b"), &mut fx.resources), Decimal::ZERO);
        assert_eq!(fx.registry.currency(), Decimal::new(450, 1));
    }

    #[test]
    fn queries_by_state() {
        let mut fx = fixture();
        fx.registry.mark_found(&id("arc_b"));
        assert_eq!(fx.registry.in_state(ArtifactState::Undiscovered).len(), 1);
        assert_eq!(fx.registry.in_state(ArtifactState::Found).len(), 1);
        assert!(fx.registry.in_state(ArtifactState::Sold).is_empty());
    }

    #[test]
    fn rejects_negative_economy() {
        let bus = Rc::new(EventBus::new());
        let economy = ArtifactEconomy {
            memory_cost: -1.0,
            ..ArtifactEconomy::default()
        };
        assert!(ArtifactRegistry::new(economy, bus).is_err());
    }
}
