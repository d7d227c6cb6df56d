//! A single-column tree browser on top of [`TableEngine`].
//!
//! [`TreeEngine`] shows one fitted column without headers and adds the
//! pointer policy of a tree:
//!
//! - clicking a closed row that has children opens it;
//! - an open row closes only when the click hits its open/close affordance;
//! - a double click on the selected row toggles it;
//! - when the selection moves away from a row without children, that row is
//!   closed as well.
//!
//! Everything else (geometry, selection queries, painting) is reached through
//! `Deref` to the underlying table.

use std::ops::{Deref, DerefMut};

use horizon_proptree_core::{NodeKey, SyncForest};

use crate::config::TableConfig;
use crate::geometry::Point;
use crate::logging::targets;
use crate::table::TableEngine;

/// A [`TableEngine`] with tree click behavior.
#[derive(Debug)]
pub struct TreeEngine {
    table: TableEngine,
}

impl Default for TreeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeEngine {
    /// Create an empty tree with its own forest.
    pub fn new() -> Self {
        Self::from_table(TableEngine::new(TableConfig::tree()))
    }

    /// Show the children of `root` in `forest`.
    pub fn with_forest(forest: SyncForest, root: NodeKey) -> Self {
        Self::from_table(TableEngine::with_forest(forest, root, TableConfig::tree()))
    }

    fn from_table(mut table: TableEngine) -> Self {
        let width = table.config().default_column_width;
        table.add_column("name", false, width);
        Self { table }
    }

    pub fn into_table(self) -> TableEngine {
        self.table
    }

    /// Handle a press at `point`, returning the row it hit.
    pub fn click(&mut self, point: Point) -> Option<usize> {
        let previous = self.table.selected_node();

        let Some((row, column)) = self.table.hit_test(point) else {
            self.table.clear_selection();
            self.close_previous(previous, None);
            return None;
        };
        let entry = self.table.rows().row(row).copied()?;
        // Before selecting: selecting may scroll the row.
        let on_toggle = self
            .table
            .open_close_rect(row)
            .is_some_and(|rect| rect.contains(point));

        self.table.select(row, column);
        if entry.has_children && (!entry.is_open || on_toggle) {
            self.table.toggle_open(row);
        }
        self.close_previous(previous, Some(entry.node));
        tracing::debug!(target: targets::TREE, row, "click");
        Some(row)
    }

    /// Handle a double click at `point`, returning the row it hit.
    ///
    /// Nothing happens unless a row is already selected. A double click on
    /// another row is treated as a click.
    pub fn double_click(&mut self, point: Point) -> Option<usize> {
        let (selected, _) = self.table.selected()?;
        let (row, _) = self.table.hit_test(point)?;
        if row != selected {
            return self.click(point);
        }
        if self.table.rows().row(row).is_some_and(|r| r.has_children) {
            self.table.toggle_open(row);
        }
        tracing::debug!(target: targets::TREE, row, "double click");
        Some(row)
    }

    /// Close the previously clicked row when the click moved elsewhere and
    /// that row has no children.
    fn close_previous(&mut self, previous: Option<NodeKey>, current: Option<NodeKey>) {
        let Some(previous) = previous.filter(|&key| Some(key) != current) else {
            return;
        };
        let forest = self.table.forest();
        if forest.contains(previous) && !forest.has_children(previous) {
            self.table.close_node(previous);
        }
    }
}

impl Deref for TreeEngine {
    type Target = TableEngine;

    fn deref(&self) -> &TableEngine {
        &self.table
    }
}

impl DerefMut for TreeEngine {
    fn deref_mut(&mut self) -> &mut TableEngine {
        &mut self.table
    }
}
