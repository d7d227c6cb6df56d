//! Arena-backed n-ary forest.
//!
//! Nodes live in a single [`Forest`] and refer to each other by [`NodeKey`], a
//! generational index. A node never owns another node: parent, first/last
//! child and previous/next sibling are plain topology links stored next to the
//! payload. Destroying a node invalidates its key, so a stale key held by a
//! view can never reach a reused slot.
//!
//! # Invariants
//!
//! For every node `P` in a consistent forest:
//!
//! - If `P` has a first child it has a last child, and walking `next_sibling`
//!   from the first reaches the last without cycles. `prev_sibling` is the exact
//!   inverse of `next_sibling`.
//! - A node without a parent has no siblings.
//! - Every node reachable as a child of `P` has `P` as its parent.
//!
//! Link operations keep these invariants. Violations are programming errors
//! and panic; see [`Forest::check_invariants`].
//!
//! # Example
//!
//! ```
//! use horizon_proptree_core::forest::{Forest, NodeData};
//!
//! struct Label(&'static str);
//! impl NodeData for Label {}
//!
//! let mut forest = Forest::new();
//! let root = forest.insert(Label("root"));
//! let a = forest.insert(Label("a"));
//! let b = forest.insert(Label("b"));
//!
//! forest.push_back(root, a);
//! forest.push_back(root, b);
//! assert_eq!(forest.children(root).collect::<Vec<_>>(), vec![a, b]);
//!
//! forest.unlink(a);
//! assert_eq!(forest.parent(a), None);
//! assert_eq!(forest.first_child(root), Some(b));
//! ```

use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// Handle to a node stored in a [`Forest`].
    ///
    /// Keys are generational: once the node is destroyed the key never
    /// resolves again, even after its slot is reused.
    pub struct NodeKey;
}

/// Payload hook consulted by [`Forest::delete_subtree`].
pub trait NodeData {
    /// Returns true when the node manages an embedded model of its own and
    /// generic recursive deletion must not walk into its children.
    fn skip_children(&self) -> bool {
        false
    }
}

/// Topology links of a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    /// The parent node, if attached.
    pub parent: Option<NodeKey>,
    /// First child in sibling order.
    pub first_child: Option<NodeKey>,
    /// Last child in sibling order.
    pub last_child: Option<NodeKey>,
    /// Previous sibling under the same parent.
    pub prev_sibling: Option<NodeKey>,
    /// Next sibling under the same parent.
    pub next_sibling: Option<NodeKey>,
}

#[derive(Debug, Clone)]
struct NodeSlot<T> {
    links: Links,
    data: T,
}

/// An arena owning every node of one or more trees.
#[derive(Debug, Clone)]
pub struct Forest<T> {
    nodes: SlotMap<NodeKey, NodeSlot<T>>,
    /// Bumped by every insert, removal and link change.
    generation: u64,
}

impl<T> Default for Forest<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Forest<T> {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            generation: 0,
        }
    }

    /// Create an empty forest with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: SlotMap::with_capacity_and_key(capacity),
            generation: 0,
        }
    }

    /// Store `data` as a new detached node.
    pub fn insert(&mut self, data: T) -> NodeKey {
        self.generation += 1;
        self.nodes.insert(NodeSlot {
            links: Links::default(),
            data,
        })
    }

    /// Topology generation.
    ///
    /// Changes whenever a node is inserted or removed or any link changes.
    /// Payload edits through [`get_mut`](Self::get_mut) leave it alone.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the forest holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `key` refers to a live node.
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    /// Payload of a node.
    pub fn get(&self, key: NodeKey) -> Option<&T> {
        self.nodes.get(key).map(|slot| &slot.data)
    }

    /// Mutable payload of a node. Topology is not reachable from here.
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut T> {
        self.nodes.get_mut(key).map(|slot| &mut slot.data)
    }

    /// Iterate over every live node in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &T)> {
        self.nodes.iter().map(|(key, slot)| (key, &slot.data))
    }

    // =========================================================================
    // Topology queries
    // =========================================================================

    /// Copy of the links of a node.
    pub fn links(&self, key: NodeKey) -> Option<Links> {
        self.nodes.get(key).map(|slot| slot.links)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.links.parent)
    }

    pub fn first_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.links.first_child)
    }

    pub fn last_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.links.last_child)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.links.next_sibling)
    }

    pub fn prev_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.links.prev_sibling)
    }

    /// Whether the node has at least one child.
    pub fn has_children(&self, key: NodeKey) -> bool {
        self.first_child(key).is_some()
    }

    /// Iterate over the direct children of `key` in sibling order.
    pub fn children(&self, key: NodeKey) -> Children<'_, T> {
        Children {
            forest: self,
            next: self.first_child(key),
        }
    }

    /// Number of direct children.
    pub fn child_count(&self, key: NodeKey) -> usize {
        self.children(key).count()
    }

    /// Iterate over all descendants of `key` in pre-order, excluding `key`.
    pub fn descendants(&self, key: NodeKey) -> Descendants<'_, T> {
        Descendants {
            forest: self,
            root: key,
            next: self.first_child(key),
        }
    }

    /// Number of parent hops from `key` to its root.
    pub fn depth(&self, key: NodeKey) -> usize {
        let mut depth = 0;
        let mut current = self.parent(key);
        while let Some(node) = current {
            depth += 1;
            if depth > self.nodes.len() {
                panic!("parent chain of {key:?} contains a cycle");
            }
            current = self.parent(node);
        }
        depth
    }

    /// The root of the tree containing `key`.
    pub fn root_of(&self, key: NodeKey) -> NodeKey {
        let mut current = key;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Whether `ancestor` appears on the parent chain of `node`.
    pub fn is_ancestor_of(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Depth-first search for `target` starting at `start`.
    ///
    /// Visits `start`, then its children recursively, then its later siblings
    /// recursively. Linear in the number of visited nodes; meant for integrity
    /// checks rather than hot paths.
    pub fn find(&self, start: NodeKey, target: NodeKey) -> bool {
        if !self.contains(start) {
            return false;
        }
        let mut stack = vec![start];
        let mut visited = 0usize;
        while let Some(key) = stack.pop() {
            if key == target {
                return true;
            }
            visited += 1;
            if visited > self.nodes.len() {
                panic!("cycle detected while searching from {start:?}");
            }
            let links = self.slot(key).links;
            if let Some(next) = links.next_sibling {
                stack.push(next);
            }
            if let Some(child) = links.first_child {
                stack.push(child);
            }
        }
        false
    }

    // =========================================================================
    // Link operations
    // =========================================================================

    /// Detach `child` and splice it in as the first child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either key is stale or if `child` is an ancestor of `parent`.
    pub fn push_front(&mut self, parent: NodeKey, child: NodeKey) {
        if parent == child {
            return;
        }
        self.assert_can_adopt(parent, child);
        self.unlink(child);

        let first = self.slot(parent).links.first_child;
        {
            let links = self.links_mut(child);
            links.parent = Some(parent);
            links.next_sibling = first;
        }
        match first {
            Some(first) => self.links_mut(first).prev_sibling = Some(child),
            None => self.links_mut(parent).last_child = Some(child),
        }
        self.links_mut(parent).first_child = Some(child);
        self.generation += 1;

        tracing::trace!(target: targets::FOREST, ?parent, ?child, "push_front");
    }

    /// Detach `child` and splice it in as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either key is stale or if `child` is an ancestor of `parent`.
    pub fn push_back(&mut self, parent: NodeKey, child: NodeKey) {
        if parent == child {
            return;
        }
        self.assert_can_adopt(parent, child);
        self.unlink(child);

        let last = self.slot(parent).links.last_child;
        {
            let links = self.links_mut(child);
            links.parent = Some(parent);
            links.prev_sibling = last;
        }
        match last {
            Some(last) => self.links_mut(last).next_sibling = Some(child),
            None => self.links_mut(parent).first_child = Some(child),
        }
        self.links_mut(parent).last_child = Some(child);
        self.generation += 1;

        tracing::trace!(target: targets::FOREST, ?parent, ?child, "push_back");
    }

    /// Detach `node` and place it immediately before `sibling`, under the
    /// same parent.
    ///
    /// A detached `sibling` has no sibling chain to join, so the call does
    /// nothing in that case.
    pub fn insert_before(&mut self, node: NodeKey, sibling: NodeKey) {
        if node == sibling {
            return;
        }
        let Some(parent) = self.slot(sibling).links.parent else {
            tracing::warn!(target: targets::FOREST, ?node, ?sibling, "insert_before on a root node ignored");
            return;
        };
        self.assert_can_adopt(parent, node);
        self.unlink(node);

        let prev = self.slot(sibling).links.prev_sibling;
        {
            let links = self.links_mut(node);
            links.parent = Some(parent);
            links.prev_sibling = prev;
            links.next_sibling = Some(sibling);
        }
        self.links_mut(sibling).prev_sibling = Some(node);
        match prev {
            Some(prev) => self.links_mut(prev).next_sibling = Some(node),
            None => self.links_mut(parent).first_child = Some(node),
        }
        self.generation += 1;

        tracing::trace!(target: targets::FOREST, ?node, ?sibling, "insert_before");
    }

    /// Detach `node` and place it immediately after `sibling`, under the
    /// same parent.
    ///
    /// A detached `sibling` has no sibling chain to join, so the call does
    /// nothing in that case.
    pub fn insert_after(&mut self, node: NodeKey, sibling: NodeKey) {
        if node == sibling {
            return;
        }
        let Some(parent) = self.slot(sibling).links.parent else {
            tracing::warn!(target: targets::FOREST, ?node, ?sibling, "insert_after on a root node ignored");
            return;
        };
        self.assert_can_adopt(parent, node);
        self.unlink(node);

        let next = self.slot(sibling).links.next_sibling;
        {
            let links = self.links_mut(node);
            links.parent = Some(parent);
            links.prev_sibling = Some(sibling);
            links.next_sibling = next;
        }
        self.links_mut(sibling).next_sibling = Some(node);
        match next {
            Some(next) => self.links_mut(next).prev_sibling = Some(node),
            None => self.links_mut(parent).last_child = Some(node),
        }
        self.generation += 1;

        tracing::trace!(target: targets::FOREST, ?node, ?sibling, "insert_after");
    }

    /// Remove `node` from its parent and sibling chain.
    ///
    /// The children of `node` stay attached to it. Unlinking a detached node
    /// does nothing.
    pub fn unlink(&mut self, node: NodeKey) {
        let Links {
            parent,
            prev_sibling,
            next_sibling,
            ..
        } = self.slot(node).links;

        if parent.is_none() && prev_sibling.is_none() && next_sibling.is_none() {
            return;
        }

        match prev_sibling {
            Some(prev) => self.links_mut(prev).next_sibling = next_sibling,
            None => {
                if let Some(parent) = parent {
                    self.links_mut(parent).first_child = next_sibling;
                }
            }
        }
        match next_sibling {
            Some(next) => self.links_mut(next).prev_sibling = prev_sibling,
            None => {
                if let Some(parent) = parent {
                    self.links_mut(parent).last_child = prev_sibling;
                }
            }
        }

        let links = self.links_mut(node);
        links.parent = None;
        links.prev_sibling = None;
        links.next_sibling = None;
        self.generation += 1;

        tracing::trace!(target: targets::FOREST, ?node, ?parent, "unlink");
    }

    /// Unlink `node` if it is a direct child of `parent`; otherwise do nothing.
    pub fn unlink_child(&mut self, parent: NodeKey, node: NodeKey) {
        if self.parent(node) == Some(parent) {
            self.unlink(node);
        }
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Verify the link invariants for the subtree rooted at `root`.
    ///
    /// # Panics
    ///
    /// Panics with a description of the first violation found.
    pub fn check_invariants(&self, root: NodeKey) {
        let root_links = self.slot(root).links;
        if root_links.parent.is_none()
            && (root_links.prev_sibling.is_some() || root_links.next_sibling.is_some())
        {
            panic!("detached node {root:?} still has siblings");
        }

        let mut stack = vec![root];
        let mut visited = 0usize;
        while let Some(node) = stack.pop() {
            visited += 1;
            if visited > self.nodes.len() {
                panic!("cycle detected below {root:?}");
            }

            let links = self.slot(node).links;
            if links.first_child.is_some() != links.last_child.is_some() {
                panic!("{node:?} has only one of first_child/last_child set");
            }

            let mut prev = None;
            let mut current = links.first_child;
            let mut steps = 0usize;
            while let Some(child) = current {
                steps += 1;
                if steps > self.nodes.len() {
                    panic!("sibling chain under {node:?} contains a cycle");
                }
                let child_links = self.slot(child).links;
                if child_links.parent != Some(node) {
                    panic!(
                        "{child:?} is linked under {node:?} but its parent is {:?}",
                        child_links.parent
                    );
                }
                if child_links.prev_sibling != prev {
                    panic!("prev_sibling of {child:?} does not mirror next_sibling");
                }
                stack.push(child);
                prev = Some(child);
                current = child_links.next_sibling;
            }
            if prev != links.last_child {
                panic!("sibling chain under {node:?} does not end at last_child");
            }
        }
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn slot(&self, key: NodeKey) -> &NodeSlot<T> {
        match self.nodes.get(key) {
            Some(slot) => slot,
            None => panic!("stale node key {key:?}"),
        }
    }

    fn links_mut(&mut self, key: NodeKey) -> &mut Links {
        match self.nodes.get_mut(key) {
            Some(slot) => &mut slot.links,
            None => panic!("stale node key {key:?}"),
        }
    }

    fn assert_can_adopt(&self, parent: NodeKey, child: NodeKey) {
        self.slot(child);
        self.slot(parent);
        if self.is_ancestor_of(child, parent) {
            panic!("cannot link {child:?} under its own descendant {parent:?}");
        }
    }

    /// Remove an already unlinked node, turning any children it still holds
    /// into free-standing roots.
    fn remove_detached(&mut self, key: NodeKey) -> Option<T> {
        let mut next = self.slot(key).links.first_child;
        while let Some(child) = next {
            next = self.slot(child).links.next_sibling;
            let links = self.links_mut(child);
            links.parent = None;
            links.prev_sibling = None;
            links.next_sibling = None;
        }
        self.generation += 1;
        self.nodes.remove(key).map(|slot| slot.data)
    }
}

impl<T: NodeData> Forest<T> {
    /// Destroy every descendant of `node`, leaving `node` itself in place.
    ///
    /// Nothing happens when `node` opts out through
    /// [`NodeData::skip_children`]. A destroyed descendant that opts out is
    /// removed without walking into its children; those become detached roots.
    /// Returns the number of destroyed nodes.
    pub fn delete_subtree(&mut self, node: NodeKey) -> usize {
        if self.slot(node).data.skip_children() {
            return 0;
        }
        // Pre-order, so every node is listed after its parent.
        let mut doomed = Vec::new();
        let mut stack: Vec<NodeKey> = self.children(node).collect();
        while let Some(key) = stack.pop() {
            doomed.push(key);
            if !self.slot(key).data.skip_children() {
                stack.extend(self.children(key));
            }
        }

        let mut removed = 0;
        for &key in doomed.iter().rev() {
            self.unlink(key);
            if self.remove_detached(key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::trace!(target: targets::FOREST, ?node, removed, "delete_subtree");
        }
        removed
    }

    /// Unlink `node`, destroy its subtree and remove it, returning its payload.
    pub fn destroy(&mut self, node: NodeKey) -> Option<T> {
        if !self.contains(node) {
            return None;
        }
        self.unlink(node);
        self.delete_subtree(node);
        self.remove_detached(node)
    }
}

/// Iterator over the direct children of a node.
#[derive(Debug, Clone)]
pub struct Children<'a, T> {
    forest: &'a Forest<T>,
    next: Option<NodeKey>,
}

impl<T> Iterator for Children<'_, T> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let current = self.next?;
        self.next = self.forest.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node.
#[derive(Debug, Clone)]
pub struct Descendants<'a, T> {
    forest: &'a Forest<T>,
    root: NodeKey,
    next: Option<NodeKey>,
}

impl<T> Iterator for Descendants<'_, T> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let current = self.next?;
        self.next = match self.forest.first_child(current) {
            Some(child) => Some(child),
            None => {
                let mut node = current;
                loop {
                    if let Some(next) = self.forest.next_sibling(node) {
                        break Some(next);
                    }
                    match self.forest.parent(node) {
                        Some(parent) if parent != self.root => node = parent,
                        _ => break None,
                    }
                }
            }
        };
        Some(current)
    }
}
