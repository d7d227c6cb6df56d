//! Single selection for table views.
//!
//! The selection is anchored to a node, not a row index, so it stays on the
//! same node when rows above it open or close.

use horizon_proptree_core::NodeKey;
use serde::{Deserialize, Serialize};

/// What gets selected when the user clicks a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Select a single cell.
    #[default]
    Cell,
    /// Select the whole row of the clicked cell.
    Row,
    /// Select the whole column of the clicked cell.
    Column,
}

/// The selected cell, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    mode: SelectionMode,
    current: Option<(NodeKey, usize)>,
}

impl Selection {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            current: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    /// The selected node and column.
    pub fn current(&self) -> Option<(NodeKey, usize)> {
        self.current
    }

    /// Select `(node, column)`, returning the previous selection.
    pub fn set(&mut self, node: NodeKey, column: usize) -> Option<(NodeKey, usize)> {
        self.current.replace((node, column))
    }

    /// Clear the selection, returning what was selected.
    pub fn clear(&mut self) -> Option<(NodeKey, usize)> {
        self.current.take()
    }

    /// Whether the cell at `(node, column)` is covered by the selection under
    /// the current mode.
    pub fn covers(&self, node: NodeKey, column: usize) -> bool {
        match (self.current, self.mode) {
            (None, _) => false,
            (Some(current), SelectionMode::Cell) => current == (node, column),
            (Some((selected, _)), SelectionMode::Row) => selected == node,
            (Some((_, selected)), SelectionMode::Column) => selected == column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys() -> (NodeKey, NodeKey) {
        let mut map: SlotMap<NodeKey, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn test_set_replaces_previous() {
        let (a, b) = keys();
        let mut selection = Selection::new(SelectionMode::Cell);
        assert_eq!(selection.set(a, 0), None);
        assert_eq!(selection.set(b, 1), Some((a, 0)));
        assert_eq!(selection.clear(), Some((b, 1)));
        assert_eq!(selection.current(), None);
    }

    #[test]
    fn test_covers_follows_mode() {
        let (a, b) = keys();
        let mut selection = Selection::new(SelectionMode::Cell);
        selection.set(a, 1);
        assert!(selection.covers(a, 1));
        assert!(!selection.covers(a, 0));

        selection.set_mode(SelectionMode::Row);
        assert!(selection.covers(a, 0));
        assert!(!selection.covers(b, 1));

        selection.set_mode(SelectionMode::Column);
        assert!(selection.covers(b, 1));
        assert!(!selection.covers(a, 0));
    }
}
