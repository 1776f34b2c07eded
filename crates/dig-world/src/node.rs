//! Nodes and the tree that owns them.
//!
//! The tree is an arena: nodes live in a `Vec` and refer to each other by
//! [`NodeId`], which is the node's slot. Ids are handed out in creation
//! order, so a seeded generator always produces the same ids.

use std::collections::BTreeMap;

use dig_types::{ArtifactId, NodeId, NodeKind, Visibility};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Clamp a corruption value into `[0, 1]`. NaN collapses to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A single directory, file, or debris block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    name: String,
    kind: NodeKind,
    corruption: f64,
    visibility: Visibility,
    artifact: Option<ArtifactId>,
    metadata: BTreeMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, name: String, kind: NodeKind, parent: Option<NodeId>) -> Self {
        let visibility = match (parent, kind) {
            (None, _) => Visibility::Revealed,
            (Some(_), NodeKind::Directory) => Visibility::Detected,
            (Some(_), _) => Visibility::Hidden,
        };
        Self {
            id,
            name,
            kind,
            corruption: 0.0,
            visibility,
            artifact: None,
            metadata: BTreeMap::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// This node's id.
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory, file, or debris.
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Decay in `[0, 1]`.
    pub const fn corruption(&self) -> f64 {
        self.corruption
    }

    /// What the player knows about this node.
    pub const fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// The artifact carried by this file, if any.
    pub const fn artifact(&self) -> Option<&ArtifactId> {
        self.artifact.as_ref()
    }

    /// Free-form generator metadata.
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Parent id; `None` only for the root.
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Ordered child ids. Always empty for files and debris.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this is the site root.
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether this node is a directory.
    pub const fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Whether this node is a file.
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File)
    }

    /// Whether this node is debris.
    pub const fn is_debris(&self) -> bool {
        matches!(self.kind, NodeKind::Debris)
    }

    /// Whether this file carries an artifact.
    pub const fn has_artifact(&self) -> bool {
        self.artifact.is_some()
    }

    /// Whether corruption has reached 1.0.
    pub fn is_fully_corrupted(&self) -> bool {
        self.corruption >= 1.0
    }

    /// Overwrite corruption, clamped to `[0, 1]`.
    pub(crate) fn set_corruption(&mut self, value: f64) {
        self.corruption = clamp_unit(value);
    }

    /// Add `delta` (negative repairs) and return the clamped result.
    pub(crate) fn apply_corruption(&mut self, delta: f64) -> f64 {
        self.set_corruption(self.corruption + delta);
        self.corruption
    }

    /// Overwrite visibility. The root stays revealed.
    pub(crate) fn set_visibility(&mut self, visibility: Visibility) {
        if !self.is_root() {
            self.visibility = visibility;
        }
    }

    /// Insert or replace a metadata entry.
    pub(crate) fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// Carving turns debris into a file; nothing else changes kind.
    pub(crate) fn carve_into_file(&mut self) {
        if self.is_debris() {
            self.kind = NodeKind::File;
        }
    }
}

/// Arena owning every node of one site.
///
/// Outside this crate the tree is read-only; visibility and corruption
/// change only through [`Excavation`](crate::Excavation).
///
/// ```compile_fail
/// let mut tree = dig_world::NodeTree::with_root("root");
/// let root = tree.root();
/// let _ = tree.get_mut(root);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl NodeTree {
    /// A tree holding only a revealed root directory named `name`.
    pub fn with_root(name: impl Into<String>) -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![Node::new(root, name.into(), NodeKind::Directory, None)],
            root,
        }
    }

    /// Append a node under `parent`. Directories start detected, everything
    /// else hidden.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownNode`] if `parent` is not in the tree,
    /// [`WorldError::NotADirectory`] if it cannot hold children, or
    /// [`WorldError::TreeFull`] when ids are exhausted.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeId, WorldError> {
        let parent_node = self.get(parent).ok_or(WorldError::UnknownNode(parent))?;
        if !parent_node.is_directory() {
            return Err(WorldError::NotADirectory(parent));
        }
        let id = NodeId(
            u32::try_from(self.nodes.len())
                .ok()
                .ok_or(WorldError::TreeFull)?,
        );
        self.nodes.push(Node::new(id, name.into(), kind, Some(parent)));
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Attach an artifact to a file node.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownNode`] or [`WorldError::NotAFile`].
    pub fn attach_artifact(&mut self, id: NodeId, artifact: ArtifactId) -> Result<(), WorldError> {
        let node = self.get_mut(id).ok_or(WorldError::UnknownNode(id))?;
        if !node.is_file() {
            return Err(WorldError::NotAFile(id));
        }
        node.artifact = Some(artifact);
        Ok(())
    }

    /// Root node id.
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node mutably.
    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Whether `id` belongs to this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Children of `id` (empty when unknown or not a directory).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// First child of `parent` named `name`.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.get(child).is_some_and(|n| n.name == name))
    }

    /// Tree adjacency: children in order, then the parent.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut out = node.children.clone();
        out.extend(node.parent);
        out
    }

    /// Slash-separated path from the root, e.g. `/invoices/archive`. The
    /// root itself is `/`.
    pub fn path_of(&self, id: NodeId) -> Option<String> {
        let mut parts = Vec::new();
        let mut cursor = self.get(id)?;
        while let Some(parent) = cursor.parent {
            parts.push(cursor.name.as_str());
            cursor = self.get(parent)?;
        }
        parts.reverse();
        Some(format!("/{}", parts.join("/")))
    }

    /// Number of nodes of `kind`.
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    /// Nodes carrying artifacts, in creation order.
    pub fn artifact_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.artifact.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::with_root("root");
        let root = tree.root();
        let logs = tree.add_node(root, "logs", NodeKind::Directory).unwrap_or(root);
        let memo = tree.add_node(logs, "memo.doc", NodeKind::File).unwrap_or(root);
        (tree, root, logs, memo)
    }

    #[test]
    fn root_is_revealed_directory() {
        let tree = NodeTree::with_root("root");
        let root = tree.get(tree.root());
        assert!(root.is_some_and(|n| n.is_root() && n.is_directory()));
        assert_eq!(root.map(Node::visibility), Some(Visibility::Revealed));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn new_nodes_start_with_kind_dependent_visibility() {
        let (tree, _, logs, memo) = small_tree();
        assert_eq!(tree.get(logs).map(Node::visibility), Some(Visibility::Detected));
        assert_eq!(tree.get(memo).map(Node::visibility), Some(Visibility::Hidden));
        assert_eq!(tree.get(memo).and_then(Node::parent), Some(logs));
    }

    #[test]
    fn only_directories_hold_children() {
        let (mut tree, _, _, memo) = small_tree();
        let result = tree.add_node(memo, "nested", NodeKind::File);
        assert!(matches!(result, Err(WorldError::NotADirectory(id)) if id == memo));
        let result = tree.add_node(NodeId(99), "ghost", NodeKind::File);
        assert!(matches!(result, Err(WorldError::UnknownNode(_))));
    }

    #[test]
    fn artifacts_only_attach_to_files() {
        let (mut tree, _, logs, memo) = small_tree();
        assert!(tree.attach_artifact(memo, ArtifactId::new("arc_x_0000")).is_ok());
        assert!(tree.get(memo).is_some_and(Node::has_artifact));
        let result = tree.attach_artifact(logs, ArtifactId::new("arc_x_0001"));
        assert!(matches!(result, Err(WorldError::NotAFile(_))));
    }

    #[test]
    fn corruption_is_clamped() {
        let (mut tree, _, _, memo) = small_tree();
        let Some(node) = tree.get_mut(memo) else {
            return;
        };
        assert!((node.apply_corruption(1.7) - 1.0).abs() < f64::EPSILON);
        assert!(node.is_fully_corrupted());
        assert!(node.apply_corruption(-5.0).abs() < f64::EPSILON);
        node.set_corruption(f64::NAN);
        assert!(node.corruption().abs() < f64::EPSILON);
    }

    #[test]
    fn root_visibility_cannot_be_lowered() {
        let mut tree = NodeTree::with_root("root");
        let root = tree.root();
        if let Some(node) = tree.get_mut(root) {
            node.set_visibility(Visibility::Hidden);
        }
        assert_eq!(tree.get(root).map(Node::visibility), Some(Visibility::Revealed));
    }

    #[test]
    fn neighbors_list_children_then_parent() {
        let (mut tree, root, logs, memo) = small_tree();
        let notes = tree.add_node(logs, "notes.txt", NodeKind::Debris).unwrap_or(root);
        assert_eq!(tree.neighbors(logs), vec![memo, notes, root]);
        assert_eq!(tree.neighbors(root), vec![logs]);
        assert_eq!(tree.neighbors(memo), vec![logs]);
        assert!(tree.neighbors(NodeId(42)).is_empty());
    }

    #[test]
    fn paths_join_names_from_root() {
        let (tree, root, logs, memo) = small_tree();
        assert_eq!(tree.path_of(root).as_deref(), Some("/"));
        assert_eq!(tree.path_of(logs).as_deref(), Some("/logs"));
        assert_eq!(tree.path_of(memo).as_deref(), Some("/logs/memo.doc"));
        assert_eq!(tree.child_named(logs, "memo.doc"), Some(memo));
        assert_eq!(tree.child_named(logs, "missing"), None);
    }
}
