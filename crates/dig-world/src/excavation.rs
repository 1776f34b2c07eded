//! The live, mutable view of a site that the player digs through.
//!
//! [`Excavation`] exclusively owns the [`NodeTree`] for the session. It
//! tracks the current directory, advances visibility on scans, carves
//! debris into files, and decays every visible node once per turn. Each
//! observable change is posted to the shared [`EventBus`].

use std::rc::Rc;

use dig_events::{Event, EventBus, EventPayload};
use dig_types::{ArtifactId, NodeId, Visibility};
use tracing::debug;

use crate::error::ExcavationError;
use crate::node::{Node, NodeTree};

/// Corruption added to every non-hidden node each turn.
pub const DEFAULT_CORRUPTION_TICK: f64 = 0.02;

/// Debris at or above this corruption can no longer be carved.
pub const DEFAULT_CARVE_FAIL_THRESHOLD: f64 = 0.8;

/// Corruption boundaries that produce a `NodeCorrupted` event when crossed.
pub const CORRUPTION_THRESHOLDS: [f64; 4] = [0.25, 0.50, 0.75, 1.0];

const SOURCE: &str = "excavation";

/// Result of a single scan step.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOutcome {
    /// The scanned node.
    pub node: NodeId,
    /// Visibility after the scan.
    pub visibility: Visibility,
    /// Whether the scan advanced visibility.
    pub changed: bool,
    /// Artifact surfaced by this scan, if it fully revealed an artifact file.
    pub artifact: Option<ArtifactId>,
}

/// Result of a carve attempt on valid debris.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarveOutcome {
    /// The carved node.
    pub node: NodeId,
    /// Whether the debris became a file.
    pub success: bool,
    /// Corruption at the time of the attempt.
    pub corruption: f64,
}

/// Navigation and excavation over one site.
#[derive(Debug)]
pub struct Excavation {
    tree: NodeTree,
    cwd: NodeId,
    bus: Rc<EventBus>,
    corruption_per_turn: f64,
    carve_fail_threshold: f64,
}

impl Excavation {
    /// Take ownership of `tree`, starting at its root.
    pub fn new(tree: NodeTree, bus: Rc<EventBus>) -> Self {
        let cwd = tree.root();
        Self {
            tree,
            cwd,
            bus,
            corruption_per_turn: DEFAULT_CORRUPTION_TICK,
            carve_fail_threshold: DEFAULT_CARVE_FAIL_THRESHOLD,
        }
    }

    /// Override the per-turn decay and the carve failure threshold.
    #[must_use]
    pub const fn with_tuning(mut self, corruption_per_turn: f64, carve_fail_threshold: f64) -> Self {
        self.corruption_per_turn = corruption_per_turn;
        self.carve_fail_threshold = carve_fail_threshold;
        self
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Read-only access to the whole tree.
    pub const fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Look up any node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.tree.get(id)
    }

    /// Current directory id.
    pub const fn cwd(&self) -> NodeId {
        self.cwd
    }

    /// Current directory node.
    pub fn current_node(&self) -> Option<&Node> {
        self.tree.get(self.cwd)
    }

    /// Slash-separated path of the current directory.
    pub fn current_path(&self) -> String {
        self.tree.path_of(self.cwd).unwrap_or_else(|| String::from("/"))
    }

    /// Child of the current directory named `name`, hidden or not.
    pub fn find_child(&self, name: &str) -> Option<&Node> {
        self.tree
            .child_named(self.cwd, name)
            .and_then(|id| self.tree.get(id))
    }

    /// Children of the current directory, hidden ones only on request.
    pub fn list_children(&self, include_hidden: bool) -> Vec<&Node> {
        self.tree
            .children(self.cwd)
            .iter()
            .filter_map(|id| self.tree.get(*id))
            .filter(|n| include_hidden || n.visibility().is_visible())
            .collect()
    }

    fn resolve(&self, name: &str) -> Result<&Node, ExcavationError> {
        self.find_child(name).ok_or_else(|| ExcavationError::NoSuchTarget {
            name: name.to_owned(),
        })
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Enter a visible child directory, or go up with `..`.
    ///
    /// # Errors
    ///
    /// [`ExcavationError::AtRoot`] for `..` at the root; otherwise
    /// `NoSuchTarget`, `NotVisible`, or `NotADirectory` for the target.
    pub fn change_directory(&mut self, target: &str) -> Result<NodeId, ExcavationError> {
        let next = if target == ".." {
            self.current_node()
                .and_then(Node::parent)
                .ok_or(ExcavationError::AtRoot)?
        } else {
            let node = self.resolve(target)?;
            if !node.visibility().is_visible() {
                return Err(ExcavationError::NotVisible {
                    name: target.to_owned(),
                });
            }
            if !node.is_directory() {
                return Err(ExcavationError::NotADirectory {
                    name: target.to_owned(),
                });
            }
            node.id()
        };
        self.cwd = next;
        debug!(path = %self.current_path(), "changed directory");
        Ok(next)
    }

    // -----------------------------------------------------------------------
    // Scanning
    // -----------------------------------------------------------------------

    /// Scan the child `name`: advance its visibility one step.
    ///
    /// Posts `NodeRevealed` when visibility changes, `ArtifactFound` when
    /// the step fully reveals an artifact file, and `ScanComplete` in every
    /// case. Scanning an already revealed node changes nothing and posts
    /// only `ScanComplete` with `changed: false`.
    ///
    /// # Errors
    ///
    /// [`ExcavationError::NoSuchTarget`] if no child has that name.
    pub fn reveal(&mut self, name: &str) -> Result<RevealOutcome, ExcavationError> {
        let id = self.resolve(name)?.id();
        self.reveal_node(id)
    }

    /// Scan every child of the current directory once, in order.
    pub fn reveal_all(&mut self) -> Vec<RevealOutcome> {
        let children = self.tree.children(self.cwd).to_vec();
        children
            .into_iter()
            .filter_map(|id| self.reveal_node(id).ok())
            .collect()
    }

    fn reveal_node(&mut self, id: NodeId) -> Result<RevealOutcome, ExcavationError> {
        let node = self.tree.get_mut(id).ok_or(ExcavationError::UnknownNode(id))?;
        let next = node.visibility().next();
        if let Some(visibility) = next {
            node.set_visibility(visibility);
        }
        let node = self.tree.get(id).ok_or(ExcavationError::UnknownNode(id))?;
        let changed = next.is_some();
        let visibility = node.visibility();
        let name = node.name().to_owned();

        let artifact = if changed && visibility == Visibility::Revealed && node.is_file() {
            node.artifact().cloned()
        } else {
            None
        };

        if changed {
            debug!(node = %id, name = %name, ?visibility, "node revealed");
            self.post(EventPayload::NodeRevealed {
                node: id,
                name: name.clone(),
                kind: node.kind(),
                visibility,
            });
        }
        if let Some(artifact) = &artifact {
            debug!(node = %id, artifact = %artifact, "artifact surfaced");
            self.post(EventPayload::ArtifactFound {
                node: id,
                name: name.clone(),
                artifact: artifact.clone(),
            });
        }
        self.post(EventPayload::ScanComplete {
            node: id,
            name,
            visibility,
            changed,
        });

        Ok(RevealOutcome {
            node: id,
            visibility,
            changed,
            artifact,
        })
    }

    // -----------------------------------------------------------------------
    // Carving
    // -----------------------------------------------------------------------

    /// Carve visible debris `name` into a revealed file.
    ///
    /// Debris at or above the carve threshold resists: the node is left
    /// untouched and the outcome reports failure. Both results post
    /// `CarveComplete`.
    ///
    /// # Errors
    ///
    /// `NoSuchTarget`, `NotVisible` for hidden debris, `NotDebris` for
    /// anything else.
    pub fn convert(&mut self, name: &str) -> Result<CarveOutcome, ExcavationError> {
        let node = self.resolve(name)?;
        if !node.visibility().is_visible() {
            return Err(ExcavationError::NotVisible {
                name: name.to_owned(),
            });
        }
        if !node.is_debris() {
            return Err(ExcavationError::NotDebris {
                name: name.to_owned(),
            });
        }
        let id = node.id();
        let corruption = node.corruption();
        let success = corruption < self.carve_fail_threshold;

        if success {
            if let Some(node) = self.tree.get_mut(id) {
                node.carve_into_file();
                node.set_visibility(Visibility::Revealed);
            }
            debug!(node = %id, "debris carved into file");
        } else {
            debug!(node = %id, corruption, "carve failed: corruption too high");
        }
        self.post(EventPayload::CarveComplete {
            node: id,
            name: name.to_owned(),
            success,
            corruption,
        });
        Ok(CarveOutcome {
            node: id,
            success,
            corruption,
        })
    }

    // -----------------------------------------------------------------------
    // Decay
    // -----------------------------------------------------------------------

    /// Add one turn of corruption to every non-hidden node. Posts at most one
    /// `NodeCorrupted` per node: for the lowest threshold crossed this tick.
    /// Returns the number of threshold events posted.
    pub fn tick(&mut self) -> usize {
        let delta = self.corruption_per_turn;
        let mut crossings = Vec::new();
        for node in self.tree.iter_mut() {
            if !node.visibility().is_visible() {
                continue;
            }
            let before = node.corruption();
            let after = node.apply_corruption(delta);
            if let Some(threshold) = first_crossed(before, after) {
                crossings.push(EventPayload::NodeCorrupted {
                    node: node.id(),
                    name: node.name().to_owned(),
                    corruption: after,
                    threshold,
                });
            }
        }
        let count = crossings.len();
        for payload in crossings {
            self.post(payload);
        }
        if count > 0 {
            debug!(count, "corruption thresholds crossed");
        }
        count
    }

    /// Add `delta` corruption to one node without threshold events. Used by
    /// daemons. Returns the clamped result.
    ///
    /// # Errors
    ///
    /// [`ExcavationError::UnknownNode`] for ids outside this site.
    pub fn apply_corruption(&mut self, id: NodeId, delta: f64) -> Result<f64, ExcavationError> {
        self.tree
            .get_mut(id)
            .map(|node| node.apply_corruption(delta))
            .ok_or(ExcavationError::UnknownNode(id))
    }

    fn post(&self, payload: EventPayload) {
        self.bus.post(Event::immediate(payload).with_source(SOURCE));
    }
}

/// Lowest threshold `t` with `before < t <= after`.
fn first_crossed(before: f64, after: f64) -> Option<f64> {
    CORRUPTION_THRESHOLDS
        .iter()
        .copied()
        .find(|&t| before < t && t <= after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use dig_events::EventKind;
    use dig_types::NodeKind;

    struct Fixture {
        bus: Rc<EventBus>,
        excavation: Excavation,
        seen: Rc<RefCell<Vec<EventKind>>>,
    }

    /// root/{docs/, memo.doc (artifact), chunk_03 (debris)}
    fn fixture() -> Fixture {
        let mut tree = NodeTree::with_root("root");
        let root = tree.root();
        let docs = tree.add_node(root, "docs", NodeKind::Directory).unwrap_or(root);
        let memo = tree.add_node(root, "memo.doc", NodeKind::File).unwrap_or(root);
        let _ = tree.add_node(root, "chunk_03", NodeKind::Debris);
        let _ = tree.add_node(docs, "inner.txt", NodeKind::File);
        let _ = tree.add_node(root, "vault", NodeKind::Directory);
        let _ = tree.attach_artifact(memo, ArtifactId::new("arc_test_0000"));
        if let Some(vault) = tree.child_named(root, "vault").and_then(|id| tree.get_mut(id)) {
            vault.set_visibility(Visibility::Hidden);
        }

        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe_all(move |event, _| {
            sink.borrow_mut().push(event.kind());
            Ok(())
        });
        let excavation = Excavation::new(tree, Rc::clone(&bus));
        Fixture {
            bus,
            excavation,
            seen,
        }
    }

    impl Fixture {
        fn drain(&self) -> Vec<EventKind> {
            self.bus.flush();
            self.seen.borrow_mut().drain(..).collect()
        }

        fn corruption_of(&self, name: &str) -> f64 {
            self.excavation.find_child(name).map_or(f64::NAN, Node::corruption)
        }

        fn set_corruption(&mut self, name: &str, value: f64) {
            if let Some(id) = self.excavation.find_child(name).map(Node::id) {
                let _ = self.excavation.apply_corruption(id, -1.0);
                let _ = self.excavation.apply_corruption(id, value);
            }
        }
    }

    #[test]
    fn reveal_steps_hidden_to_revealed_and_surfaces_artifact_once() {
        let mut fx = fixture();
        let first = fx.excavation.reveal("memo.doc");
        assert!(first.as_ref().is_ok_and(|o| o.changed && o.visibility == Visibility::Detected));
        assert!(first.is_ok_and(|o| o.artifact.is_none()));
        assert_eq!(fx.drain(), vec![EventKind::NodeRevealed, EventKind::ScanComplete]);

        let second = fx.excavation.reveal("memo.doc");
        assert!(second.is_ok_and(|o| o.artifact == Some(ArtifactId::new("arc_test_0000"))));
        assert_eq!(
            fx.drain(),
            vec![EventKind::NodeRevealed, EventKind::ArtifactFound, EventKind::ScanComplete]
        );

        let third = fx.excavation.reveal("memo.doc");
        assert!(third.is_ok_and(|o| !o.changed && o.visibility == Visibility::Revealed));
        assert_eq!(fx.drain(), vec![EventKind::ScanComplete]);
    }

    #[test]
    fn reveal_unknown_target_is_a_typed_failure() {
        let mut fx = fixture();
        let result = fx.excavation.reveal("nothing.here");
        assert_eq!(
            result,
            Err(ExcavationError::NoSuchTarget {
                name: String::from("nothing.here")
            })
        );
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn list_children_filters_hidden() {
        let mut fx = fixture();
        let visible: Vec<&str> = fx.excavation.list_children(false).iter().map(|n| n.name()).collect();
        assert_eq!(visible, vec!["docs"]);
        assert_eq!(fx.excavation.list_children(true).len(), 4);
        let _ = fx.excavation.reveal("chunk_03");
        assert_eq!(fx.excavation.list_children(false).len(), 2);
    }

    #[test]
    fn change_directory_validates_target() {
        let mut fx = fixture();
        assert_eq!(fx.excavation.change_directory(".."), Err(ExcavationError::AtRoot));
        assert!(matches!(
            fx.excavation.change_directory("vault"),
            Err(ExcavationError::NotVisible { .. })
        ));
        let _ = fx.excavation.reveal("memo.doc");
        assert!(matches!(
            fx.excavation.change_directory("memo.doc"),
            Err(ExcavationError::NotADirectory { .. })
        ));
        assert!(matches!(
            fx.excavation.change_directory("nope"),
            Err(ExcavationError::NoSuchTarget { .. })
        ));

        assert!(fx.excavation.change_directory("docs").is_ok());
        assert_eq!(fx.excavation.current_path(), "/docs");
        assert!(fx.excavation.change_directory("..").is_ok());
        assert_eq!(fx.excavation.current_path(), "/");
    }

    #[test]
    fn convert_requires_visible_debris() {
        let mut fx = fixture();
        assert!(matches!(
            fx.excavation.convert("chunk_03"),
            Err(ExcavationError::NotVisible { .. })
        ));
        assert!(matches!(
            fx.excavation.convert("docs"),
            Err(ExcavationError::NotDebris { .. })
        ));
        let _ = fx.excavation.reveal("chunk_03");
        fx.drain();

        let outcome = fx.excavation.convert("chunk_03");
        assert!(outcome.is_ok_and(|o| o.success));
        let node = fx.excavation.find_child("chunk_03");
        assert!(node.is_some_and(|n| n.is_file() && n.visibility() == Visibility::Revealed));
        assert_eq!(fx.drain(), vec![EventKind::CarveComplete]);
    }

    #[test]
    fn convert_fails_on_decayed_debris_without_mutation() {
        let mut fx = fixture();
        let _ = fx.excavation.reveal("chunk_03");
        fx.set_corruption("chunk_03", 0.8);
        fx.drain();

        let outcome = fx.excavation.convert("chunk_03");
        assert!(outcome.is_ok_and(|o| !o.success));
        let node = fx.excavation.find_child("chunk_03");
        assert!(node.is_some_and(|n| n.is_debris() && n.visibility() == Visibility::Detected));
        assert_eq!(fx.drain(), vec![EventKind::CarveComplete]);
    }

    #[test]
    fn tick_decays_only_visible_nodes() {
        let mut fx = fixture();
        let hidden_before = fx.corruption_of("memo.doc");
        let docs_before = fx.corruption_of("docs");
        fx.excavation.tick();
        assert!((fx.corruption_of("memo.doc") - hidden_before).abs() < f64::EPSILON);
        assert!((fx.corruption_of("docs") - docs_before - DEFAULT_CORRUPTION_TICK).abs() < 1e-12);
    }

    #[test]
    fn crossing_a_boundary_emits_exactly_one_event() {
        let mut fx = fixture();
        fx.set_corruption("docs", 0.24);
        fx.drain();
        assert_eq!(fx.excavation.tick(), 1);
        assert!((fx.corruption_of("docs") - 0.26).abs() < 1e-9);
        let corrupted = fx
            .drain()
            .into_iter()
            .filter(|k| *k == EventKind::NodeCorrupted)
            .count();
        assert_eq!(corrupted, 1);
        assert_eq!(fx.excavation.tick(), 0);
    }

    #[test]
    fn large_step_reports_only_first_threshold() {
        let tree = NodeTree::with_root("root");
        let bus = Rc::new(EventBus::new());
        let captured = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&captured);
        bus.subscribe(EventKind::NodeCorrupted, move |event, _| {
            if let EventPayload::NodeCorrupted { threshold, .. } = event.payload() {
                sink.borrow_mut().push(*threshold);
            }
            Ok(())
        });
        let mut excavation = Excavation::new(tree, Rc::clone(&bus)).with_tuning(0.9, 0.8);
        assert_eq!(excavation.tick(), 1);
        bus.flush();
        assert_eq!(*captured.borrow(), vec![0.25]);
        assert_eq!(first_crossed(0.2, 1.0), Some(0.25));
        assert_eq!(first_crossed(0.5, 0.5), None);
        assert_eq!(first_crossed(0.99, 1.0), Some(1.0));
    }

    #[test]
    fn apply_corruption_rejects_unknown_nodes() {
        let mut fx = fixture();
        assert_eq!(
            fx.excavation.apply_corruption(NodeId(500), 0.1),
            Err(ExcavationError::UnknownNode(NodeId(500)))
        );
    }

    #[test]
    fn reveal_all_scans_every_child_once() {
        let mut fx = fixture();
        let outcomes = fx.excavation.reveal_all();
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.changed));
        // "docs" started detected and is now fully revealed.
        let again = fx.excavation.reveal_all();
        assert_eq!(again.iter().filter(|o| o.changed).count(), 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn corruption_stays_in_unit_interval(
                deltas in proptest::collection::vec(-2.0f64..2.0, 1..50),
            ) {
                let mut fx = fixture();
                let root = fx.excavation.tree().root();
                for delta in deltas {
                    let value = fx.excavation.apply_corruption(root, delta);
                    prop_assert!(value.is_ok_and(|v| (0.0..=1.0).contains(&v)));
                    fx.excavation.tick();
                }
                for node in fx.excavation.tree().iter() {
                    prop_assert!((0.0..=1.0).contains(&node.corruption()));
                }
            }

            #[test]
            fn reveal_never_lowers_visibility(scans in proptest::collection::vec(0usize..4, 0..20)) {
                let mut fx = fixture();
                let names = ["docs", "memo.doc", "chunk_03", "vault"];
                for idx in scans {
                    let name = names.get(idx).copied().unwrap_or("docs");
                    let before = fx.excavation.find_child(name).map(Node::visibility);
                    let _ = fx.excavation.reveal(name);
                    let after = fx.excavation.find_child(name).map(Node::visibility);
                    prop_assert!(after >= before);
                }
            }
        }
    }
}
