//! The player's three resource gauges.
//!
//! All spending goes through [`ResourceLedger::consume`], which is
//! all-or-nothing and reports insufficiency as `Ok(false)`. Negative or
//! non-finite amounts are usage faults and return [`LedgerError`].

use std::rc::Rc;

use dig_events::{Event, EventBus, EventPayload};
use dig_types::ResourceKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::LedgerError;

const SOURCE: &str = "resources";

/// Current and maximum value of one resource. `0 <= current <= maximum`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceGauge {
    current: f64,
    maximum: f64,
}

impl ResourceGauge {
    const fn full(maximum: f64) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Amount available.
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Hard cap.
    pub const fn maximum(&self) -> f64 {
        self.maximum
    }

    /// `current / maximum` in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.maximum <= 0.0 {
            0.0
        } else {
            (self.current / self.maximum).clamp(0.0, 1.0)
        }
    }

    /// Whether the gauge is empty.
    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }
}

/// Starting (and maximum) gauge values plus the passive energy drain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Processing power.
    pub power: f64,
    /// Memory capacity.
    pub memory: f64,
    /// Energy.
    pub energy: f64,
    /// Energy consumed by every `tick`.
    pub energy_drain: f64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            power: 100.0,
            memory: 50.0,
            energy: 80.0,
            energy_drain: 1.0,
        }
    }
}

/// Owner of the power, memory, and energy gauges.
#[derive(Debug)]
pub struct ResourceLedger {
    power: ResourceGauge,
    memory: ResourceGauge,
    energy: ResourceGauge,
    energy_drain: f64,
    bus: Rc<EventBus>,
}

const fn valid_amount(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

impl ResourceLedger {
    /// Create full gauges from `limits`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidMaximum`] for a non-positive maximum,
    /// [`LedgerError::InvalidSetting`] for a negative drain.
    pub fn new(limits: ResourceLimits, bus: Rc<EventBus>) -> Result<Self, LedgerError> {
        for (resource, maximum) in [
            (ResourceKind::Power, limits.power),
            (ResourceKind::Memory, limits.memory),
            (ResourceKind::Energy, limits.energy),
        ] {
            if !(maximum.is_finite() && maximum > 0.0) {
                return Err(LedgerError::InvalidMaximum { resource, maximum });
            }
        }
        if !valid_amount(limits.energy_drain) {
            return Err(LedgerError::InvalidSetting {
                name: "energy_drain",
                value: limits.energy_drain,
            });
        }
        Ok(Self {
            power: ResourceGauge::full(limits.power),
            memory: ResourceGauge::full(limits.memory),
            energy: ResourceGauge::full(limits.energy),
            energy_drain: limits.energy_drain,
            bus,
        })
    }

    /// Snapshot of one gauge.
    pub const fn gauge(&self, resource: ResourceKind) -> ResourceGauge {
        match resource {
            ResourceKind::Power => self.power,
            ResourceKind::Memory => self.memory,
            ResourceKind::Energy => self.energy,
        }
    }

    const fn gauge_mut(&mut self, resource: ResourceKind) -> &mut ResourceGauge {
        match resource {
            ResourceKind::Power => &mut self.power,
            ResourceKind::Memory => &mut self.memory,
            ResourceKind::Energy => &mut self.energy,
        }
    }

    /// Amount available.
    pub const fn current(&self, resource: ResourceKind) -> f64 {
        self.gauge(resource).current
    }

    /// Gauge cap.
    pub const fn maximum(&self, resource: ResourceKind) -> f64 {
        self.gauge(resource).maximum
    }

    /// `current / maximum`.
    pub fn ratio(&self, resource: ResourceKind) -> f64 {
        self.gauge(resource).ratio()
    }

    /// Whether the gauge is empty.
    pub fn is_depleted(&self, resource: ResourceKind) -> bool {
        self.gauge(resource).is_depleted()
    }

    /// Energy consumed per `tick`.
    pub const fn energy_drain(&self) -> f64 {
        self.energy_drain
    }

    /// Whether `amount` could be consumed right now. Invalid amounts are
    /// never affordable.
    pub fn can_afford(&self, resource: ResourceKind, amount: f64) -> bool {
        valid_amount(amount) && self.current(resource) >= amount
    }

    /// Whether every `(resource, amount)` pair is affordable at once.
    pub fn can_afford_all(&self, costs: &[(ResourceKind, f64)]) -> bool {
        costs.iter().all(|&(resource, amount)| self.can_afford(resource, amount))
    }

    /// Spend `amount` of `resource`.
    ///
    /// Returns `Ok(true)` and posts `ResourceChanged` on success (plus
    /// `ResourceDepleted` when a positive spend empties the gauge).
    /// Returns `Ok(false)` without touching anything when the gauge is
    /// short.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] for negative or non-finite amounts.
    pub fn consume(
        &mut self,
        resource: ResourceKind,
        amount: f64,
        source: &str,
    ) -> Result<bool, LedgerError> {
        Self::check_amount(resource, amount)?;
        let gauge = self.gauge_mut(resource);
        if gauge.current < amount {
            debug!(%resource, amount, available = gauge.current, source, "cannot afford");
            return Ok(false);
        }
        gauge.current = (gauge.current - amount).max(0.0);
        let depleted = amount > 0.0 && gauge.is_depleted();

        self.post_changed(resource, -amount, source);
        if depleted {
            warn!(%resource, source, "resource depleted");
            self.bus.post(
                Event::immediate(EventPayload::ResourceDepleted {
                    resource,
                    source: source.to_owned(),
                })
                .with_source(SOURCE),
            );
        }
        Ok(true)
    }

    /// Spend several resources atomically: either every cost is paid or
    /// none is.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] if any amount is invalid; nothing is
    /// spent in that case.
    pub fn consume_all(
        &mut self,
        costs: &[(ResourceKind, f64)],
        source: &str,
    ) -> Result<bool, LedgerError> {
        for &(resource, amount) in costs {
            Self::check_amount(resource, amount)?;
        }
        if !self.can_afford_all(costs) {
            debug!(source, "cannot afford bundle");
            return Ok(false);
        }
        for &(resource, amount) in costs {
            self.consume(resource, amount, source)?;
        }
        Ok(true)
    }

    /// Add up to `amount`, capped at the maximum. Returns the actual gain
    /// and posts `ResourceChanged` with it, even when a full gauge makes
    /// the gain zero.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidAmount`] for negative or non-finite amounts.
    pub fn restore(
        &mut self,
        resource: ResourceKind,
        amount: f64,
        source: &str,
    ) -> Result<f64, LedgerError> {
        Self::check_amount(resource, amount)?;
        let gauge = self.gauge_mut(resource);
        let gain = amount.min(gauge.maximum - gauge.current).max(0.0);
        gauge.current += gain;
        self.post_changed(resource, gain, source);
        Ok(gain)
    }

    /// Change a gauge's cap, pulling `current` down if it now exceeds it.
    /// Always posts `ResourceChanged`, with `delta` equal to the change in
    /// `current` (often zero).
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidMaximum`] unless `maximum` is finite and
    /// positive.
    pub fn set_maximum(&mut self, resource: ResourceKind, maximum: f64) -> Result<(), LedgerError> {
        if !(maximum.is_finite() && maximum > 0.0) {
            error!(%resource, maximum, "rejected non-positive maximum");
            return Err(LedgerError::InvalidMaximum { resource, maximum });
        }
        let gauge = self.gauge_mut(resource);
        let before = gauge.current;
        gauge.maximum = maximum;
        gauge.current = gauge.current.min(maximum);
        let delta = gauge.current - before;
        self.post_changed(resource, delta, "upgrade");
        Ok(())
    }

    /// Apply one turn of passive energy drain. Returns whether the drain
    /// could be paid.
    pub fn tick(&mut self) -> bool {
        let drain = self.energy_drain;
        matches!(self.consume(ResourceKind::Energy, drain, "passive_drain"), Ok(true))
    }

    fn check_amount(resource: ResourceKind, amount: f64) -> Result<(), LedgerError> {
        if valid_amount(amount) {
            Ok(())
        } else {
            error!(%resource, amount, "rejected invalid amount");
            Err(LedgerError::InvalidAmount { resource, amount })
        }
    }

    fn post_changed(&self, resource: ResourceKind, delta: f64, source: &str) {
        let gauge = self.gauge(resource);
        self.bus.post(
            Event::immediate(EventPayload::ResourceChanged {
                resource,
                delta,
                current: gauge.current,
                maximum: gauge.maximum,
                ratio: gauge.ratio(),
                source: source.to_owned(),
            })
            .with_source(SOURCE),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use dig_events::EventKind;

    fn ledger() -> (ResourceLedger, Rc<EventBus>, Rc<RefCell<Vec<EventPayload>>>) {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe_all(move |event, _| {
            sink.borrow_mut().push(event.payload().clone());
            Ok(())
        });
        let ledger = ResourceLedger::new(ResourceLimits::default(), Rc::clone(&bus)).unwrap();
        (ledger, bus, seen)
    }

    fn kinds(bus: &EventBus, seen: &RefCell<Vec<EventPayload>>) -> Vec<EventKind> {
        bus.flush();
        seen.borrow_mut().drain(..).map(|p| p.kind()).collect()
    }

    #[test]
    fn starts_full() {
        let (ledger, _, _) = ledger();
        assert!((ledger.current(ResourceKind::Power) - 100.0).abs() < f64::EPSILON);
        assert!((ledger.maximum(ResourceKind::Memory) - 50.0).abs() < f64::EPSILON);
        assert!((ledger.ratio(ResourceKind::Energy) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_limits() {
        let bus = Rc::new(EventBus::new());
        let limits = ResourceLimits {
            memory: 0.0,
            ..ResourceLimits::default()
        };
        assert!(matches!(
            ResourceLedger::new(limits, Rc::clone(&bus)),
            Err(LedgerError::InvalidMaximum { resource: ResourceKind::Memory, .. })
        ));
        let limits = ResourceLimits {
            energy_drain: -1.0,
            ..ResourceLimits::default()
        };
        assert!(matches!(
            ResourceLedger::new(limits, bus),
            Err(LedgerError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn consume_success_posts_change() {
        let (mut ledger, bus, seen) = ledger();
        assert_eq!(ledger.consume(ResourceKind::Power, 30.0, "test"), Ok(true));
        assert!((ledger.current(ResourceKind::Power) - 70.0).abs() < f64::EPSILON);
        assert_eq!(kinds(&bus, &seen), vec![EventKind::ResourceChanged]);
    }

    #[test]
    fn insufficient_consume_changes_nothing() {
        let (mut ledger, bus, seen) = ledger();
        assert_eq!(ledger.consume(ResourceKind::Memory, 50.5, "test"), Ok(false));
        assert!((ledger.current(ResourceKind::Memory) - 50.0).abs() < f64::EPSILON);
        assert!(kinds(&bus, &seen).is_empty());
    }

    #[test]
    fn negative_amount_is_a_usage_fault() {
        let (mut ledger, bus, seen) = ledger();
        assert!(matches!(
            ledger.consume(ResourceKind::Power, -1.0, "test"),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(ledger.restore(ResourceKind::Power, f64::NAN, "test").is_err());
        assert!(!ledger.can_afford(ResourceKind::Power, -1.0));
        assert!(kinds(&bus, &seen).is_empty());
    }

    #[test]
    fn draining_to_zero_posts_depletion() {
        let (mut ledger, bus, seen) = ledger();
        assert_eq!(ledger.consume(ResourceKind::Energy, 80.0, "test"), Ok(true));
        assert!(ledger.is_depleted(ResourceKind::Energy));
        assert_eq!(
            kinds(&bus, &seen),
            vec![EventKind::ResourceChanged, EventKind::ResourceDepleted]
        );
        // Zero-cost spends on an empty gauge are not a fresh depletion.
        assert_eq!(ledger.consume(ResourceKind::Energy, 0.0, "test"), Ok(true));
        assert_eq!(kinds(&bus, &seen), vec![EventKind::ResourceChanged]);
    }

    #[test]
    fn restore_caps_at_maximum() {
        let (mut ledger, bus, seen) = ledger();
        let _ = ledger.consume(ResourceKind::Power, 10.0, "test");
        kinds(&bus, &seen);
        let gained = ledger.restore(ResourceKind::Power, 25.0, "test");
        assert!(gained.is_ok_and(|g| (g - 10.0).abs() < f64::EPSILON));
        assert_eq!(kinds(&bus, &seen), vec![EventKind::ResourceChanged]);
        let gained = ledger.restore(ResourceKind::Power, 5.0, "test");
        assert!(gained.is_ok_and(|g| g.abs() < f64::EPSILON));
        assert_eq!(kinds(&bus, &seen), vec![EventKind::ResourceChanged]);
    }

    #[test]
    fn restore_on_a_full_gauge_reports_a_zero_delta() {
        let (mut ledger, bus, seen) = ledger();
        assert!(ledger.restore(ResourceKind::Memory, 10.0, "sell").is_ok());
        bus.flush();
        let changes: Vec<(f64, f64, String)> = seen
            .borrow()
            .iter()
            .filter_map(|p| match p {
                EventPayload::ResourceChanged {
                    delta,
                    current,
                    source,
                    ..
                } => Some((*delta, *current, source.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(changes.len(), 1);
        let (delta, current, source) = changes.first().unwrap();
        assert!(delta.abs() < f64::EPSILON);
        assert!((current - 50.0).abs() < f64::EPSILON);
        assert_eq!(source, "sell");
    }

    #[test]
    fn set_maximum_clamps_current_and_always_reports() {
        let (mut ledger, bus, seen) = ledger();
        assert!(ledger.set_maximum(ResourceKind::Power, 60.0).is_ok());
        assert!((ledger.current(ResourceKind::Power) - 60.0).abs() < f64::EPSILON);
        assert!(ledger.set_maximum(ResourceKind::Power, 200.0).is_ok());
        assert!((ledger.current(ResourceKind::Power) - 60.0).abs() < f64::EPSILON);
        assert!((ledger.ratio(ResourceKind::Power) - 0.3).abs() < 1e-12);

        bus.flush();
        let deltas: Vec<f64> = seen
            .borrow()
            .iter()
            .filter_map(|p| match p {
                EventPayload::ResourceChanged { delta, .. } => Some(*delta),
                _ => None,
            })
            .collect();
        assert_eq!(deltas.len(), 2);
        assert!(deltas.first().is_some_and(|d| (d + 40.0).abs() < f64::EPSILON));
        assert!(deltas.get(1).is_some_and(|d| d.abs() < f64::EPSILON));
        assert!(ledger.set_maximum(ResourceKind::Power, 0.0).is_err());
    }

    #[test]
    fn tick_drains_energy() {
        let (mut ledger, _, _) = ledger();
        assert!(ledger.tick());
        assert!((ledger.current(ResourceKind::Energy) - 79.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bundles_are_all_or_nothing() {
        let (mut ledger, _, _) = ledger();
        let _ = ledger.consume(ResourceKind::Energy, 78.0, "test");
        let carve = [(ResourceKind::Power, 8.0), (ResourceKind::Energy, 4.0)];
        assert_eq!(ledger.consume_all(&carve, "carve"), Ok(false));
        assert!((ledger.current(ResourceKind::Power) - 100.0).abs() < f64::EPSILON);
        let _ = ledger.restore(ResourceKind::Energy, 10.0, "test");
        assert_eq!(ledger.consume_all(&carve, "carve"), Ok(true));
        assert!((ledger.current(ResourceKind::Power) - 92.0).abs() < f64::EPSILON);
        assert!((ledger.current(ResourceKind::Energy) - 8.0).abs() < f64::EPSILON);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn consume_is_exact_or_untouched(
                spends in proptest::collection::vec(0.0f64..60.0, 1..30),
            ) {
                let (mut ledger, _, _) = ledger();
                for amount in spends {
                    let before = ledger.current(ResourceKind::Power);
                    let ok = ledger.consume(ResourceKind::Power, amount, "prop");
                    let after = ledger.current(ResourceKind::Power);
                    if amount > before {
                        prop_assert_eq!(ok, Ok(false));
                        prop_assert!((after - before).abs() < f64::EPSILON);
                    } else {
                        prop_assert_eq!(ok, Ok(true));
                        prop_assert!((before - amount - after).abs() < 1e-9);
                    }
                    prop_assert!(after >= 0.0);
                }
            }
        }
    }
}
