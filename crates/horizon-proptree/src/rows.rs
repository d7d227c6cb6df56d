//! Flattening a forest into visible rows.
//!
//! A [`RowModel`] walks the forest below a sentinel root and emits one
//! [`Row`] for every node whose ancestors are all open. The sentinel itself
//! is never shown and is always treated as open, so its children sit at
//! depth 0.
//!
//! Open state is view state: it lives here, keyed by [`NodeKey`], and never
//! touches the synchronized nodes. Keys of destroyed nodes simply stop
//! matching.
//!
//! Rows are rebuilt lazily. Any change the model cannot follow sets the dirty
//! flag and the next [`RowModel::flatten`] rebuilds the sequence from
//! scratch. Opening or closing a single row on a clean model splices the
//! affected rows in place instead.

use horizon_proptree_core::{NodeId, NodeKey, SyncForest, SyncNode};
use slotmap::SecondaryMap;

use crate::config::TableConfig;
use crate::logging::targets;

/// One visible line of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    pub node: NodeKey,
    pub id: NodeId,
    /// Nesting level; children of the sentinel are at depth 0.
    pub depth: u32,
    pub is_open: bool,
    /// Whether the node has children, open or not. Drives the open/close
    /// affordance.
    pub has_children: bool,
    /// Distance from the top of the content to the top of this row.
    pub y_offset: u32,
    pub height: u32,
}

impl Row {
    /// Distance from the top of the content to the bottom of this row.
    #[inline]
    pub fn bottom(&self) -> u32 {
        self.y_offset + self.height
    }

    #[inline]
    pub fn contains_y(&self, y: u32) -> bool {
        y >= self.y_offset && y < self.bottom()
    }
}

/// How tall each row is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowHeights {
    pub default_height: u32,
    /// Ask each node for its preferred height, falling back to the default.
    pub apply_best_height: bool,
}

impl RowHeights {
    pub fn height_of(&self, node: &SyncNode) -> u32 {
        if self.apply_best_height {
            node.best_height().unwrap_or(self.default_height)
        } else {
            self.default_height
        }
    }
}

impl Default for RowHeights {
    fn default() -> Self {
        Self {
            default_height: 20,
            apply_best_height: false,
        }
    }
}

impl From<&TableConfig> for RowHeights {
    fn from(config: &TableConfig) -> Self {
        Self {
            default_height: config.default_row_height,
            apply_best_height: config.apply_best_height,
        }
    }
}

/// The flattened, visible rows below a sentinel node.
#[derive(Debug, Clone)]
pub struct RowModel {
    root: NodeKey,
    open: SecondaryMap<NodeKey, ()>,
    rows: Vec<Row>,
    heights: RowHeights,
    dirty: bool,
}

impl RowModel {
    /// Create a model showing the children of `root`.
    pub fn new(root: NodeKey, heights: RowHeights) -> Self {
        Self {
            root,
            open: SecondaryMap::new(),
            rows: Vec::new(),
            heights,
            dirty: true,
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Show the children of another sentinel.
    pub fn set_root(&mut self, root: NodeKey) {
        if self.root != root {
            self.root = root;
            self.invalidate();
        }
    }

    pub fn heights(&self) -> RowHeights {
        self.heights
    }

    pub fn set_heights(&mut self, heights: RowHeights) {
        if self.heights != heights {
            self.heights = heights;
            self.invalidate();
        }
    }

    // =========================================================================
    // Open State
    // =========================================================================

    /// Whether `key` is open. The sentinel always counts as open.
    pub fn is_open(&self, key: NodeKey) -> bool {
        key == self.root || self.open.contains_key(key)
    }

    /// Set the open state of `key`, returning whether it changed.
    ///
    /// The rows are rebuilt on the next flatten. Use
    /// [`expand_row`](Self::expand_row) or [`collapse_row`](Self::collapse_row)
    /// to update a visible row in place.
    pub fn set_open(&mut self, key: NodeKey, open: bool) -> bool {
        let changed = self.store_open(key, open);
        if changed {
            self.invalidate();
        }
        changed
    }

    /// Open every node below the sentinel that has children.
    pub fn open_all(&mut self, forest: &SyncForest) {
        for key in forest.descendants(self.root) {
            if forest.has_children(key) {
                self.open.insert(key, ());
            }
        }
        self.invalidate();
    }

    pub fn close_all(&mut self) {
        self.open.clear();
        self.invalidate();
    }

    fn store_open(&mut self, key: NodeKey, open: bool) -> bool {
        if open {
            self.open.insert(key, ()).is_none()
        } else {
            self.open.remove(key).is_some()
        }
    }

    // =========================================================================
    // Flattening
    // =========================================================================

    /// Mark the rows stale.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Rebuild the rows with a depth-first walk from the sentinel.
    ///
    /// Only open subtrees are visited, so the cost is proportional to the
    /// number of visible rows.
    ///
    /// # Panics
    ///
    /// Panics if the forest has a cycle or a child whose parent link does not
    /// point back at the node being walked.
    #[tracing::instrument(skip(self, forest), target = "horizon_proptree::rows", level = "trace")]
    pub fn flatten(&mut self, forest: &SyncForest) {
        self.rows = if forest.contains(self.root) {
            walk(forest, &self.open, self.heights, self.root, 0, 0)
        } else {
            Vec::new()
        };
        self.dirty = false;
        tracing::debug!(target: targets::ROWS, rows = self.rows.len(), "flattened");
    }

    /// Flatten only when stale.
    pub fn ensure_flat(&mut self, forest: &SyncForest) {
        if self.dirty {
            self.flatten(forest);
        }
    }

    /// Open the node shown at `index` and splice its visible subtree in below it.
    ///
    /// Returns the number of rows inserted. On a dirty model only the open
    /// state is recorded.
    pub fn expand_row(&mut self, forest: &SyncForest, index: usize) -> usize {
        let Some(row) = self.rows.get(index).copied() else {
            return 0;
        };
        let changed = self.store_open(row.node, true);
        self.rows[index].is_open = true;
        if self.dirty || !changed {
            return 0;
        }

        let inserted = walk(
            forest,
            &self.open,
            self.heights,
            row.node,
            row.depth + 1,
            row.bottom(),
        );
        let added: u32 = inserted.iter().map(|r| r.height).sum();
        let count = inserted.len();
        for later in &mut self.rows[index + 1..] {
            later.y_offset += added;
        }
        self.rows.splice(index + 1..index + 1, inserted);
        tracing::debug!(target: targets::ROWS, index, count, "expanded row");
        count
    }

    /// Close the node shown at `index` and remove its descendant rows.
    ///
    /// Returns the number of rows removed. On a dirty model only the open
    /// state is recorded.
    pub fn collapse_row(&mut self, index: usize) -> usize {
        let Some(row) = self.rows.get(index).copied() else {
            return 0;
        };
        let changed = self.store_open(row.node, false);
        self.rows[index].is_open = false;
        if self.dirty || !changed {
            return 0;
        }

        let end = self.descendant_end(index);
        let removed: u32 = self.rows[index + 1..end].iter().map(|r| r.height).sum();
        self.rows.drain(index + 1..end);
        for later in &mut self.rows[index + 1..] {
            later.y_offset -= removed;
        }
        let count = end - index - 1;
        tracing::debug!(target: targets::ROWS, index, count, "collapsed row");
        count
    }

    /// One past the last row that is a descendant of the row at `index`.
    pub fn descendant_end(&self, index: usize) -> usize {
        let Some(row) = self.rows.get(index) else {
            return index;
        };
        index
            + 1
            + self.rows[index + 1..]
                .iter()
                .take_while(|r| r.depth > row.depth)
                .count()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The rows as of the last flatten.
    pub fn visible_rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Index of the row showing `key`, if visible.
    pub fn row_index_of(&self, key: NodeKey) -> Option<usize> {
        self.rows.iter().position(|row| row.node == key)
    }

    /// Index of the row covering content offset `y`.
    pub fn row_at_y(&self, y: u32) -> Option<usize> {
        let index = self.rows.partition_point(|row| row.bottom() <= y);
        self.rows
            .get(index)
            .filter(|row| row.contains_y(y))
            .map(|_| index)
    }

    /// Total height of all rows.
    pub fn content_height(&self) -> u32 {
        self.rows.last().map_or(0, Row::bottom)
    }
}

/// Emit the visible rows below `parent`, starting at `depth` and `y`.
fn walk(
    forest: &SyncForest,
    open: &SecondaryMap<NodeKey, ()>,
    heights: RowHeights,
    parent: NodeKey,
    depth: u32,
    mut y: u32,
) -> Vec<Row> {
    let limit = forest.len();
    let mut rows = Vec::new();
    // (next sibling to visit, its expected parent, its depth)
    let mut stack = vec![(forest.first_child(parent), parent, depth)];

    while let Some(top) = stack.last_mut() {
        let Some(key) = top.0 else {
            stack.pop();
            continue;
        };
        let (expected_parent, depth) = (top.1, top.2);
        top.0 = forest.next_sibling(key);

        let actual_parent = forest.parent(key);
        if actual_parent != Some(expected_parent) {
            panic!(
                "node {key:?} is linked under {expected_parent:?} but its parent is {actual_parent:?}"
            );
        }
        if rows.len() >= limit {
            panic!("forest below {parent:?} contains a cycle");
        }
        let Some(node) = forest.node(key) else {
            panic!("dangling child link to {key:?}");
        };

        let has_children = forest.has_children(key);
        let is_open = open.contains_key(key);
        let height = heights.height_of(node);
        rows.push(Row {
            node: key,
            id: node.id(),
            depth,
            is_open,
            has_children,
            y_offset: y,
            height,
        });
        y += height;

        if is_open && has_children {
            stack.push((forest.first_child(key), key, depth + 1));
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_proptree_core::{IdGenerator, NodeKind, NodeValue};

    struct Sample {
        forest: SyncForest,
        root: NodeKey,
        a: NodeKey,
        b: NodeKey,
        c: NodeKey,
        d: NodeKey,
    }

    // root
    // ├── a
    // ├── b
    // │   ├── c (Spline)
    // │   └── d
    // └── e
    fn sample() -> (Sample, NodeKey) {
        let mut forest = SyncForest::with_id_generator(IdGenerator::with_seed(1));
        let root = forest.create_default("root", NodeKind::Root);
        let a = forest.create_child(root, "a", NodeValue::Checkbox(true));
        let b = forest.create_child(root, "b", NodeValue::Folder);
        let c = forest.create_default("c", NodeKind::Spline);
        forest.push_back(b, c);
        let d = forest.create_child(b, "d", NodeValue::Folder);
        let e = forest.create_child(root, "e", NodeValue::Folder);
        (
            Sample {
                forest,
                root,
                a,
                b,
                c,
                d,
            },
            e,
        )
    }

    fn nodes(model: &RowModel) -> Vec<NodeKey> {
        model.visible_rows().iter().map(|r| r.node).collect()
    }

    #[test]
    fn test_closed_children_are_hidden() {
        let (s, e) = sample();
        let mut model = RowModel::new(s.root, RowHeights::default());
        model.flatten(&s.forest);
        assert_eq!(nodes(&model), vec![s.a, s.b, e]);
        assert!(model.row(1).unwrap().has_children);
        assert!(!model.row(1).unwrap().is_open);
        assert_eq!(model.row(0).unwrap().depth, 0);
    }

    #[test]
    fn test_open_shows_children_with_offsets() {
        let (s, e) = sample();
        let mut model = RowModel::new(s.root, RowHeights::default());
        assert!(model.set_open(s.b, true));
        assert!(!model.set_open(s.b, true));
        model.ensure_flat(&s.forest);

        assert_eq!(nodes(&model), vec![s.a, s.b, s.c, s.d, e]);
        let offsets: Vec<_> = model.visible_rows().iter().map(|r| r.y_offset).collect();
        assert_eq!(offsets, vec![0, 20, 40, 60, 80]);
        assert_eq!(model.row(2).unwrap().depth, 1);
        assert_eq!(model.content_height(), 100);
    }

    #[test]
    fn test_best_height() {
        let (s, _) = sample();
        let heights = RowHeights {
            default_height: 20,
            apply_best_height: true,
        };
        let mut model = RowModel::new(s.root, heights);
        model.set_open(s.b, true);
        model.flatten(&s.forest);
        let heights: Vec<_> = model.visible_rows().iter().map(|r| r.height).collect();
        assert_eq!(heights, vec![20, 20, 52, 20, 20]);
    }

    #[test]
    fn test_row_at_y() {
        let (s, e) = sample();
        let mut model = RowModel::new(s.root, RowHeights::default());
        model.flatten(&s.forest);
        assert_eq!(model.row_at_y(0), Some(0));
        assert_eq!(model.row_at_y(19), Some(0));
        assert_eq!(model.row_at_y(20), Some(1));
        assert_eq!(model.row_at_y(59), Some(2));
        assert_eq!(model.row_at_y(60), None);
        assert_eq!(model.row_index_of(e), Some(2));
        assert_eq!(model.row_index_of(s.c), None);
    }

    #[test]
    fn test_collapse_and_expand_splice_in_place() {
        let (mut s, e) = sample();
        let f = s.forest.create_child(s.d, "f", NodeValue::Folder);
        let mut model = RowModel::new(s.root, RowHeights::default());
        model.set_open(s.b, true);
        model.set_open(s.d, true);
        model.flatten(&s.forest);
        assert_eq!(nodes(&model), vec![s.a, s.b, s.c, s.d, f, e]);

        assert_eq!(model.collapse_row(1), 3);
        assert_eq!(nodes(&model), vec![s.a, s.b, e]);
        assert_eq!(model.row(2).unwrap().y_offset, 40);
        assert!(!model.is_dirty());

        // d stays open, so expanding b brings f back too.
        assert_eq!(model.expand_row(&s.forest, 1), 3);
        assert_eq!(nodes(&model), vec![s.a, s.b, s.c, s.d, f, e]);
        assert_eq!(model.row(5).unwrap().y_offset, 100);

        let spliced = model.visible_rows().to_vec();
        model.flatten(&s.forest);
        assert_eq!(model.visible_rows(), spliced.as_slice());
    }

    #[test]
    fn test_close_all_and_open_all() {
        let (s, _) = sample();
        let mut model = RowModel::new(s.root, RowHeights::default());
        model.open_all(&s.forest);
        model.flatten(&s.forest);
        assert_eq!(model.len(), 5);
        model.close_all();
        assert!(model.is_dirty());
        model.flatten(&s.forest);
        assert_eq!(model.len(), 3);
    }

    #[test]
    fn test_destroyed_nodes_drop_out() {
        let (mut s, e) = sample();
        let mut model = RowModel::new(s.root, RowHeights::default());
        model.set_open(s.b, true);
        s.forest.destroy(s.b);
        model.flatten(&s.forest);
        assert_eq!(nodes(&model), vec![s.a, e]);
        assert!(!model.is_open(s.b));
    }

    #[test]
    fn test_stale_root_gives_no_rows() {
        let (mut s, _) = sample();
        let root = s.root;
        s.forest.destroy(root);
        let mut model = RowModel::new(root, RowHeights::default());
        model.flatten(&s.forest);
        assert!(model.is_empty());
        assert_eq!(model.content_height(), 0);
    }
}
