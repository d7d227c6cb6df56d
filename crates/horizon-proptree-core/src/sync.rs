//! Synchronized nodes and the forest that owns them.
//!
//! A [`SyncNode`] is the payload stored in a [`Forest`]: a wire [`NodeId`],
//! the common flags and a [`NodeValue`] whose variant fixes the node's kind.
//! [`SyncForest`] pairs the arena with the ID generator that stamps new
//! nodes, and dereferences to the arena for topology operations. The wire
//! protocol itself lives in [`crate::protocol`].

use std::ops::{Deref, DerefMut};

use crate::forest::{Forest, NodeData, NodeKey};
use crate::id::{IdGenerator, NodeId, SharedIdGenerator};
use crate::kind::NodeKind;
use crate::logging::targets;
use crate::value::NodeValue;

/// Name given to nodes created with an empty name.
pub const UNDEFINED_NAME: &str = "Undefined";

/// Payload of a node that takes part in synchronization.
///
/// Equality compares the synchronized state and ignores the revision.
#[derive(Debug, Clone)]
pub struct SyncNode {
    id: NodeId,
    name: String,
    enabled: bool,
    visible: bool,
    value: NodeValue,
    /// Bumped whenever a setter changes the node.
    revision: u64,
}

impl SyncNode {
    pub(crate) fn new(id: NodeId, name: impl Into<String>, value: NodeValue) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name = UNDEFINED_NAME.to_string();
        }
        Self {
            id,
            name,
            enabled: true,
            visible: true,
            value,
            revision: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name;
            self.revision += 1;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.revision += 1;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.revision += 1;
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Replace the payload.
    ///
    /// The kind of a node never changes, so a value of another kind is
    /// refused and `false` is returned.
    pub fn set_value(&mut self, value: NodeValue) -> bool {
        if value.kind() != self.kind() {
            tracing::warn!(
                target: targets::PROTOCOL,
                id = %self.id,
                expected = %self.kind(),
                found = %value.kind(),
                "refusing value of another kind"
            );
            return false;
        }
        if self.value != value {
            self.value = value;
            self.revision += 1;
        }
        true
    }

    /// Counter that changes whenever the name, a flag or the value changes.
    ///
    /// Views compare revisions to find nodes that need repainting.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Preferred row height for this node, if its kind has one.
    pub fn best_height(&self) -> Option<u32> {
        self.kind().best_height()
    }
}

impl PartialEq for SyncNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.enabled == other.enabled
            && self.visible == other.visible
            && self.value == other.value
    }
}

impl NodeData for SyncNode {
    fn skip_children(&self) -> bool {
        self.kind().skip_children()
    }
}

/// A forest of [`SyncNode`]s plus the generator that stamps their IDs.
#[derive(Debug, Clone, Default)]
pub struct SyncForest {
    nodes: Forest<SyncNode>,
    ids: SharedIdGenerator,
}

impl SyncForest {
    /// Create an empty forest with a generator at the default seed.
    pub fn new() -> Self {
        Self::with_id_generator(IdGenerator::new())
    }

    /// Create an empty forest drawing IDs from `ids`.
    pub fn with_id_generator(ids: impl Into<SharedIdGenerator>) -> Self {
        Self {
            nodes: Forest::new(),
            ids: ids.into(),
        }
    }

    pub fn id_generator(&self) -> &SharedIdGenerator {
        &self.ids
    }

    /// Create a detached node with a freshly generated ID.
    pub fn create_node(&mut self, name: impl Into<String>, value: NodeValue) -> NodeKey {
        let id = self.ids.next_id();
        let key = self.nodes.insert(SyncNode::new(id, name, value));
        tracing::trace!(target: targets::FOREST, %id, ?key, "created node");
        key
    }

    /// Create a detached node of `kind` holding its default payload.
    pub fn create_default(&mut self, name: impl Into<String>, kind: NodeKind) -> NodeKey {
        self.create_node(name, NodeValue::default_for(kind))
    }

    /// Create a detached node and append it under `parent`.
    pub fn create_child(
        &mut self,
        parent: NodeKey,
        name: impl Into<String>,
        value: NodeValue,
    ) -> NodeKey {
        let key = self.create_node(name, value);
        self.nodes.push_back(parent, key);
        key
    }

    /// Insert a node that already carries an ID, reserving it in the generator.
    pub(crate) fn insert_with_id(&mut self, node: SyncNode) -> NodeKey {
        if !self.ids.reserve(node.id) {
            tracing::warn!(target: targets::FOREST, id = %node.id, "id could not be reserved");
        }
        self.nodes.insert(node)
    }

    pub fn node(&self, key: NodeKey) -> Option<&SyncNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut SyncNode> {
        self.nodes.get_mut(key)
    }

    pub fn id_of(&self, key: NodeKey) -> Option<NodeId> {
        self.nodes.get(key).map(SyncNode::id)
    }

    /// Scan the whole arena for `id`, regardless of tree membership.
    pub fn node_by_id(&self, id: NodeId) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find(|(_, node)| node.id == id)
            .map(|(key, _)| key)
    }

    /// Search for `id` starting at `start`: `start` itself, its descendants,
    /// then each later sibling with its descendants.
    ///
    /// This is the lookup a root-level dispatcher uses for a patch addressed
    /// to an arbitrary node.
    pub fn find_node_id(&self, start: NodeKey, id: NodeId) -> Option<NodeKey> {
        if !self.nodes.contains(start) {
            return None;
        }
        let mut stack = vec![start];
        while let Some(key) = stack.pop() {
            if self.id_of(key) == Some(id) {
                return Some(key);
            }
            if let Some(next) = self.nodes.next_sibling(key) {
                stack.push(next);
            }
            if let Some(child) = self.nodes.first_child(key) {
                stack.push(child);
            }
        }
        None
    }

    /// Search for `id` within the subtree rooted at `key`, `key` included.
    ///
    /// Unlike [`find_node_id`](Self::find_node_id) this never leaves the
    /// subtree, so it cannot match a node in an unrelated branch.
    pub fn find_child_by_id(&self, key: NodeKey, id: NodeId) -> Option<NodeKey> {
        if self.id_of(key)? == id {
            return Some(key);
        }
        self.nodes
            .descendants(key)
            .find(|&descendant| self.id_of(descendant) == Some(id))
    }
}

impl Deref for SyncForest {
    type Target = Forest<SyncNode>;

    fn deref(&self) -> &Self::Target {
        &self.nodes
    }
}

impl DerefMut for SyncForest {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.nodes
    }
}
