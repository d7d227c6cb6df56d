//! The table engine: rows and columns mapped onto viewport pixels.
//!
//! [`TableEngine`] owns a [`SyncForest`] and a sentinel root node whose
//! children form the top level of the table. It flattens the visible part of
//! the forest into rows, lays out the columns, answers geometry and hit-test
//! queries, tracks the selection and records what needs repainting.
//!
//! # Coordinates
//!
//! All rectangles and points are in viewport pixels. The cell area starts to
//! the right of the row header and below the column header (each only when
//! shown) and is shifted by the scroll offset:
//!
//! ```text
//! +-----+------------+------------+
//! |     | name       | value      |   column header
//! +-----+------------+------------+
//! |     | > folder   |            |   row 0
//! |     |     leaf   | on         |   row 1
//! +-----+------------+------------+
//!  row header
//! ```
//!
//! # Mutation
//!
//! The forest is edited through [`TableEngine::forest_mut`], which hands out a
//! guard. When the guard is dropped after a topology change the rows are
//! flattened again, so every query on the engine sees the current tree. Edits
//! that only touch names, flags or values repaint just the affected rows, and
//! an edit that changed nothing (a rejected patch, say) repaints nothing.
//!
//! # Example
//!
//! ```
//! use horizon_proptree::{Point, TableConfig, TableEngine};
//! use horizon_proptree_core::NodeValue;
//!
//! let mut table = TableEngine::new(TableConfig::default());
//! table.add_column("Name", false, 140);
//! table.add_column("Value", false, 140);
//!
//! let root = table.root();
//! table.forest_mut().create_child(root, "enabled", NodeValue::Checkbox(true));
//!
//! assert_eq!(table.rows().len(), 1);
//! assert_eq!(table.hit_test(Point::new(40.0, 25.0)), Some((0, 0)));
//! ```

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};

use horizon_proptree_core::{NodeKey, NodeKind, PerfSpan, SyncForest, SyncNode};

use crate::column::{Column, ColumnLayout};
use crate::config::TableConfig;
use crate::damage::DamageTracker;
use crate::geometry::{Point, Rect, Size};
use crate::logging::targets;
use crate::paint::{Font, Painter};
use crate::rows::{Row, RowHeights, RowModel};
use crate::selection::{Selection, SelectionMode};

/// Layout, selection and repaint state of a table of nodes.
#[derive(Debug)]
pub struct TableEngine {
    forest: SyncForest,
    root: NodeKey,
    config: TableConfig,
    rows: RowModel,
    columns: ColumnLayout,
    selection: Selection,
    viewport: Size,
    scroll_x: u32,
    scroll_y: u32,
    /// Row indices to repaint on the next [`paint`](TableEngine::paint).
    dirty_rows: BTreeSet<usize>,
    /// Pixels no longer covered by any row, e.g. after a close.
    damage: DamageTracker,
    header_dirty: bool,
}

impl TableEngine {
    /// Create an empty table with its own forest.
    pub fn new(config: TableConfig) -> Self {
        let mut forest = SyncForest::new();
        let root = forest.create_default("root", NodeKind::Root);
        Self::with_forest(forest, root, config)
    }

    /// Show the children of `root` in `forest`.
    pub fn with_forest(forest: SyncForest, root: NodeKey, config: TableConfig) -> Self {
        let rows = RowModel::new(root, RowHeights::from(&config));
        let mut table = Self {
            forest,
            root,
            columns: ColumnLayout::new(config.floating_columns),
            selection: Selection::new(config.selection_mode),
            config,
            rows,
            viewport: Size::ZERO,
            scroll_x: 0,
            scroll_y: 0,
            dirty_rows: BTreeSet::new(),
            damage: DamageTracker::new(),
            header_dirty: true,
        };
        table.relayout();
        table
    }

    // =========================================================================
    // Tree Access
    // =========================================================================

    pub fn forest(&self) -> &SyncForest {
        &self.forest
    }

    /// Borrow the forest for editing.
    ///
    /// See [`ForestMut`] for what happens when the guard is dropped.
    pub fn forest_mut(&mut self) -> ForestMut<'_> {
        let generation = self.forest.generation();
        let revisions = self.row_revisions();
        ForestMut {
            table: self,
            generation,
            revisions,
        }
    }

    /// Revision of the node shown in each visible row.
    fn row_revisions(&self) -> Vec<u64> {
        self.rows
            .visible_rows()
            .iter()
            .map(|row| self.forest.node(row.node).map_or(0, SyncNode::revision))
            .collect()
    }

    /// The sentinel whose children are the top-level rows.
    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn rows(&self) -> &RowModel {
        &self.rows
    }

    pub fn visible_rows(&self) -> &[Row] {
        self.rows.visible_rows()
    }

    /// Flatten the forest again and schedule a full repaint.
    pub fn relayout(&mut self) {
        let _perf = PerfSpan::new("table.relayout");
        self.rows.flatten(&self.forest);
        if let Some((node, _)) = self.selection.current() {
            if !self.forest.contains(node) {
                self.selection.clear();
            }
        }
        self.clamp_scroll();
        self.invalidate_all();
    }

    /// Delete every node below the sentinel.
    pub fn empty_table(&mut self) {
        if self.forest.contains(self.root) {
            let removed = self.forest.delete_subtree(self.root);
            tracing::debug!(target: targets::TABLE, removed, "emptied table");
        }
        self.selection.clear();
        self.relayout();
    }

    /// Open every node that has children.
    pub fn open_all(&mut self) {
        self.rows.open_all(&self.forest);
        self.relayout();
    }

    pub fn close_all(&mut self) {
        self.rows.close_all();
        self.relayout();
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Append a column and return its index.
    ///
    /// `width` is raised to the configured minimum. In fitted mode the
    /// non-fixed columns are then reset to an equal share of the width.
    pub fn add_column(&mut self, name: impl Into<String>, fixed_width: bool, width: u32) -> usize {
        let min_width = self.config.min_column_width;
        let index = self.columns.add_column(Column {
            name: name.into(),
            width: width.max(min_width),
            min_width,
            fixed_width,
        });
        self.clamp_scroll();
        self.invalidate_all();
        index
    }

    /// Resize a column. See [`ColumnLayout::resize`].
    pub fn resize_column(&mut self, index: usize, width: u32) -> bool {
        let resized = self.columns.resize(index, width);
        if resized {
            self.clamp_scroll();
            self.invalidate_all();
        }
        resized
    }

    /// Switch between floating and fitted columns.
    pub fn set_floating_columns(&mut self, floating: bool) {
        self.config.floating_columns = floating;
        self.columns.set_floating(floating);
        self.clamp_scroll();
        self.invalidate_all();
    }

    pub fn columns(&self) -> &[Column] {
        self.columns.columns()
    }

    /// Left edge of column `index`, relative to the start of the content.
    pub fn column_x(&self, index: usize) -> Option<u32> {
        self.columns.column_x(index)
    }

    // =========================================================================
    // Viewport and Scrolling
    // =========================================================================

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Set the size of the widget showing the table.
    pub fn set_viewport(&mut self, size: Size) {
        if self.viewport == size {
            return;
        }
        self.viewport = size;
        let width = (size.width.max(0.0) as u32).saturating_sub(self.cells_left());
        self.columns.set_available(width);
        self.damage
            .set_viewport(Rect::new(0.0, 0.0, size.width, size.height));
        self.clamp_scroll();
        self.invalidate_all();
    }

    /// Width and height of all columns and rows.
    pub fn content_size(&self) -> Size {
        Size::new(
            self.columns.total_width() as f32,
            self.rows.content_height() as f32,
        )
    }

    pub fn scroll(&self) -> (u32, u32) {
        (self.scroll_x, self.scroll_y)
    }

    /// Scroll the content, clamped so it never scrolls past its end.
    /// Returns whether the offset changed.
    pub fn set_scroll(&mut self, x: u32, y: u32) -> bool {
        let (max_x, max_y) = self.max_scroll();
        let (x, y) = (x.min(max_x), y.min(max_y));
        if (x, y) == (self.scroll_x, self.scroll_y) {
            return false;
        }
        self.scroll_x = x;
        self.scroll_y = y;
        self.invalidate_all();
        true
    }

    /// Scroll vertically just enough to show the row at `index`.
    pub fn ensure_visible(&mut self, index: usize) {
        let Some(row) = self.rows.row(index).copied() else {
            return;
        };
        let height = self.cells_height();
        if height == 0 {
            return;
        }
        let y = if row.y_offset < self.scroll_y {
            row.y_offset
        } else if row.bottom() > self.scroll_y + height {
            row.bottom() - height
        } else {
            return;
        };
        self.set_scroll(self.scroll_x, y);
    }

    fn max_scroll(&self) -> (u32, u32) {
        let content = (self.columns.total_width(), self.rows.content_height());
        (
            content.0.saturating_sub(self.cells_width()),
            content.1.saturating_sub(self.cells_height()),
        )
    }

    fn clamp_scroll(&mut self) {
        let (max_x, max_y) = self.max_scroll();
        self.scroll_x = self.scroll_x.min(max_x);
        self.scroll_y = self.scroll_y.min(max_y);
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    fn cells_left(&self) -> u32 {
        if self.config.show_row_header {
            self.config.row_header_width
        } else {
            0
        }
    }

    fn cells_top(&self) -> u32 {
        if self.config.show_column_header {
            self.config.column_header_height
        } else {
            0
        }
    }

    /// Width of the cell area, or 0 while the viewport is unknown.
    fn cells_width(&self) -> u32 {
        (self.viewport.width.max(0.0) as u32).saturating_sub(self.cells_left())
    }

    fn cells_height(&self) -> u32 {
        (self.viewport.height.max(0.0) as u32).saturating_sub(self.cells_top())
    }

    /// Viewport x of content offset `x`.
    fn view_x(&self, x: u32) -> f32 {
        self.cells_left() as f32 + x as f32 - self.scroll_x as f32
    }

    /// Viewport y of content offset `y`.
    fn view_y(&self, y: u32) -> f32 {
        self.cells_top() as f32 + y as f32 - self.scroll_y as f32
    }

    /// The cell under `point`, as `(row, column)`.
    pub fn hit_test(&self, point: Point) -> Option<(usize, usize)> {
        let x = point.x - self.cells_left() as f32;
        let y = point.y - self.cells_top() as f32;
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        if !self.viewport.is_empty()
            && (point.x >= self.viewport.width || point.y >= self.viewport.height)
        {
            return None;
        }
        let row = self.rows.row_at_y((y as u32).saturating_add(self.scroll_y))?;
        let column = self
            .columns
            .column_at((x as u32).saturating_add(self.scroll_x))?;
        Some((row, column))
    }

    /// The rectangle of cell `(row, column)`.
    pub fn geometry_for(&self, row: usize, column: usize) -> Option<Rect> {
        let entry = self.rows.row(row)?;
        let x = self.columns.column_x(column)?;
        let width = self.columns.column(column)?.width;
        Some(Rect::new(
            self.view_x(x),
            self.view_y(entry.y_offset),
            width as f32,
            entry.height as f32,
        ))
    }

    /// Where the content of cell `(row, column)` goes.
    ///
    /// In the first column the content is indented by the row's depth and,
    /// when the row has children, by the open/close affordance.
    pub fn content_geometry_for(&self, row: usize, column: usize) -> Option<Rect> {
        let cell = self.geometry_for(row, column)?;
        if column != 0 {
            return Some(cell);
        }
        let entry = self.rows.row(row)?;
        let mut indent = entry.depth * self.config.depth_indent;
        if entry.has_children {
            indent += self.config.open_close_width;
        }
        let indent = (indent as f32).min(cell.width());
        Some(Rect::new(
            cell.left() + indent,
            cell.top(),
            cell.width() - indent,
            cell.height(),
        ))
    }

    /// The open/close affordance of `row`, if it has children.
    pub fn open_close_rect(&self, row: usize) -> Option<Rect> {
        let entry = self.rows.row(row)?;
        if !entry.has_children {
            return None;
        }
        Some(Rect::new(
            self.view_x(entry.depth * self.config.depth_indent),
            self.view_y(entry.y_offset),
            self.config.open_close_width as f32,
            entry.height as f32,
        ))
    }

    /// The band between content offsets `top` and `bottom` across the cell area.
    fn content_band(&self, top: u32, bottom: u32) -> Rect {
        let width = match self.cells_width() {
            0 => self.columns.total_width(),
            width => width,
        };
        Rect::new(
            self.cells_left() as f32,
            self.view_y(top),
            width as f32,
            bottom.saturating_sub(top) as f32,
        )
    }

    /// The full width of a row, row header included.
    fn row_band(&self, row: &Row) -> Rect {
        let width = if self.viewport.is_empty() {
            (self.cells_left() + self.columns.total_width()) as f32
        } else {
            self.viewport.width
        };
        Rect::new(0.0, self.view_y(row.y_offset), width, row.height as f32)
    }

    // =========================================================================
    // Open / Close
    // =========================================================================

    /// Flip the open state of `row`, returning the new state.
    ///
    /// Returns `None` when the row does not exist or has no children.
    pub fn toggle_open(&mut self, row: usize) -> Option<bool> {
        let entry = *self.rows.row(row)?;
        if !entry.has_children {
            return None;
        }
        let old_bottom = self.rows.content_height();
        if entry.is_open {
            self.rows.collapse_row(row);
            let new_bottom = self.rows.content_height();
            if new_bottom < old_bottom {
                self.damage
                    .add_damage(self.content_band(new_bottom, old_bottom));
            }
        } else {
            self.rows.expand_row(&self.forest, row);
        }
        self.clamp_scroll();
        self.mark_rows_from(row);
        tracing::debug!(target: targets::TABLE, row, open = !entry.is_open, "toggled row");
        Some(!entry.is_open)
    }

    /// Close `node`, whether or not it is visible. Returns whether it was open.
    pub fn close_node(&mut self, node: NodeKey) -> bool {
        if !self.rows.is_open(node) || node == self.root {
            return false;
        }
        match self.rows.row_index_of(node) {
            Some(index) if self.rows.row(index).is_some_and(|r| r.has_children) => {
                self.toggle_open(index);
            }
            Some(index) => {
                self.rows.collapse_row(index);
                self.dirty_rows.insert(index);
            }
            // Hidden below a closed ancestor: no row moves.
            None => {
                self.rows.set_open(node, false);
                self.rows.flatten(&self.forest);
            }
        }
        true
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selection_mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    pub fn set_selection_mode(&mut self, mode: SelectionMode) {
        if self.selection.mode() != mode {
            self.selection.set_mode(mode);
            self.config.selection_mode = mode;
            self.invalidate_all();
        }
    }

    /// Select cell `(row, column)` and scroll it into view.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, row: usize, column: usize) -> bool {
        let changed = self.highlight(row, column);
        if changed {
            self.ensure_visible(row);
            tracing::debug!(target: targets::TABLE, row, column, "selected");
        }
        changed
    }

    /// Select cell `(row, column)` without scrolling.
    ///
    /// The rows of the previous and the new selection are marked dirty.
    pub fn highlight(&mut self, row: usize, column: usize) -> bool {
        let Some(node) = self.rows.row(row).map(|r| r.node) else {
            return false;
        };
        if column >= self.columns.len() {
            return false;
        }
        let previous = self.selection.set(node, column);
        if previous == Some((node, column)) {
            return false;
        }
        self.mark_selection_dirty(previous);
        self.mark_selection_dirty(Some((node, column)));
        true
    }

    /// Select the cell under `point`, returning it.
    pub fn click(&mut self, point: Point) -> Option<(usize, usize)> {
        let (row, column) = self.hit_test(point)?;
        self.select(row, column);
        Some((row, column))
    }

    /// Returns whether anything was selected.
    pub fn clear_selection(&mut self) -> bool {
        let previous = self.selection.clear();
        self.mark_selection_dirty(previous);
        previous.is_some()
    }

    /// The selected cell as `(row, column)`, if its node is visible.
    pub fn selected(&self) -> Option<(usize, usize)> {
        let (node, column) = self.selection.current()?;
        let row = self.rows.row_index_of(node)?;
        Some((row, column))
    }

    /// The node of the selected cell, visible or not.
    pub fn selected_node(&self) -> Option<NodeKey> {
        self.selection.current().map(|(node, _)| node)
    }

    /// The area covered by the selection under the current mode.
    pub fn selection_rect(&self) -> Option<Rect> {
        let (row, column) = self.selected()?;
        match self.selection.mode() {
            SelectionMode::Cell => self.geometry_for(row, column),
            SelectionMode::Row => {
                let first = self.geometry_for(row, 0)?;
                let last = self.geometry_for(row, self.columns.len().checked_sub(1)?)?;
                Some(first.union(&last))
            }
            SelectionMode::Column => {
                let first = self.geometry_for(0, column)?;
                let last = self.geometry_for(self.rows.len().checked_sub(1)?, column)?;
                Some(first.union(&last))
            }
        }
    }

    fn mark_selection_dirty(&mut self, selection: Option<(NodeKey, usize)>) {
        let Some((node, _)) = selection else {
            return;
        };
        if self.selection.mode() == SelectionMode::Column {
            self.dirty_rows.extend(0..self.rows.len());
        } else if let Some(index) = self.rows.row_index_of(node) {
            self.dirty_rows.insert(index);
        }
    }

    // =========================================================================
    // Repaint
    // =========================================================================

    /// Repaint everything on the next paint.
    pub fn invalidate_all(&mut self) {
        self.dirty_rows.extend(0..self.rows.len());
        self.damage.invalidate_all();
        self.header_dirty = true;
    }

    fn mark_rows_from(&mut self, row: usize) {
        self.dirty_rows.extend(row..self.rows.len());
    }

    /// Whether the next paint redraws the whole viewport.
    pub fn needs_full_repaint(&self) -> bool {
        self.damage.needs_full_repaint()
    }

    /// Whether [`paint`](Self::paint) has anything to draw.
    pub fn needs_repaint(&self) -> bool {
        self.header_dirty || self.damage.has_damage() || !self.dirty_rows.is_empty()
    }

    /// Row indices waiting to be repainted, in order. Clears the set.
    pub fn take_dirty_rows(&mut self) -> Vec<usize> {
        let len = self.rows.len();
        std::mem::take(&mut self.dirty_rows)
            .into_iter()
            .filter(|&index| index < len)
            .collect()
    }

    /// Pixels no row covers any more, if any. Clears the region.
    pub fn take_repaint_region(&mut self) -> Option<Rect> {
        self.damage.take()
    }

    /// Paint the pending background, the column header and the dirty rows.
    pub fn paint(&mut self, painter: &mut dyn Painter) {
        let _perf = PerfSpan::new("table.paint");
        let font = self.config.font();

        let full = self.damage.needs_full_repaint();
        if let Some(region) = self.damage.take() {
            painter.fill_rect(region, self.config.colors.even_row);
        }
        if full || self.header_dirty {
            self.paint_column_header(painter, &font);
            self.header_dirty = false;
        }
        let dirty = self.take_dirty_rows();
        tracing::trace!(target: targets::TABLE, rows = dirty.len(), "painting rows");
        for index in dirty {
            self.paint_row(painter, index, &font);
        }
    }

    fn paint_column_header(&self, painter: &mut dyn Painter, font: &Font) {
        if !self.config.show_column_header {
            return;
        }
        let colors = &self.config.colors;
        let height = self.config.column_header_height as f32;
        painter.push_clip(Rect::new(
            self.cells_left() as f32,
            0.0,
            self.cells_width().max(self.columns.total_width()) as f32,
            height,
        ));
        let mut x = 0;
        for column in self.columns.columns() {
            let rect = Rect::new(self.view_x(x), 0.0, column.width as f32, height);
            painter.fill_rect(rect, colors.header);
            painter.draw_text(rect.origin, &column.name, font, colors.text);
            x += column.width;
        }
        painter.pop_clip();
    }

    fn paint_row(&self, painter: &mut dyn Painter, index: usize, font: &Font) {
        let Some(row) = self.rows.row(index) else {
            return;
        };
        let Some(node) = self.forest.node(row.node) else {
            return;
        };
        let colors = &self.config.colors;

        painter.push_clip(self.row_band(row));
        if self.config.show_row_header {
            painter.fill_rect(
                Rect::new(
                    0.0,
                    self.view_y(row.y_offset),
                    self.config.row_header_width as f32,
                    row.height as f32,
                ),
                colors.header,
            );
        }
        for column in 0..self.columns.len() {
            let Some(cell) = self.geometry_for(index, column) else {
                continue;
            };
            let background = if self.selection.covers(row.node, column) {
                colors.selection
            } else if index % 2 == 0 {
                colors.even_row
            } else {
                colors.odd_row
            };
            painter.fill_rect(cell, background);

            let text = match column {
                0 => node.name().to_string(),
                1 => node.value().display_text(),
                _ => continue,
            };
            if text.is_empty() {
                continue;
            }
            if let Some(content) = self.content_geometry_for(index, column) {
                painter.draw_text(content.origin, &text, font, colors.text);
            }
        }
        painter.pop_clip();
    }
}

/// Mutable access to the forest of a [`TableEngine`].
///
/// Dereferences to [`SyncForest`]. On drop the guard compares the forest with
/// what it saw when it was handed out:
///
/// - a changed [topology generation](horizon_proptree_core::Forest::generation)
///   flattens the rows again and repaints everything;
/// - otherwise rows whose node [revision](SyncNode::revision) moved are marked
///   dirty;
/// - otherwise nothing happens.
pub struct ForestMut<'a> {
    table: &'a mut TableEngine,
    generation: u64,
    revisions: Vec<u64>,
}

impl Deref for ForestMut<'_> {
    type Target = SyncForest;

    fn deref(&self) -> &SyncForest {
        &self.table.forest
    }
}

impl DerefMut for ForestMut<'_> {
    fn deref_mut(&mut self) -> &mut SyncForest {
        &mut self.table.forest
    }
}

impl Drop for ForestMut<'_> {
    fn drop(&mut self) {
        // A panic mid-edit may have left the links half updated.
        if std::thread::panicking() {
            return;
        }
        if self.table.forest.generation() != self.generation {
            self.table.relayout();
            return;
        }

        let changed: Vec<usize> = self
            .table
            .row_revisions()
            .iter()
            .zip(&self.revisions)
            .enumerate()
            .filter(|(_, (now, before))| now != before)
            .map(|(index, _)| index)
            .collect();
        if !changed.is_empty() {
            tracing::debug!(target: targets::TABLE, rows = changed.len(), "node values changed");
            self.table.dirty_rows.extend(changed);
        }
    }
}

static_assertions::assert_impl_all!(TableEngine: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{PaintCommand, RecordingPainter};
    use horizon_proptree_core::NodeValue;

    /// root
    /// ├── a
    /// ├── b
    /// │   ├── c
    /// │   └── d
    /// └── e
    fn sample(config: TableConfig) -> (TableEngine, [NodeKey; 5]) {
        let mut table = TableEngine::new(config);
        table.add_column("Name", false, 100);
        table.add_column("Value", false, 100);
        let root = table.root();
        let keys = {
            let mut forest = table.forest_mut();
            let a = forest.create_child(root, "a", NodeValue::Checkbox(true));
            let b = forest.create_child(root, "b", NodeValue::Folder);
            let c = forest.create_child(b, "c", NodeValue::EditText("text".into()));
            let d = forest.create_child(b, "d", NodeValue::Folder);
            let e = forest.create_child(root, "e", NodeValue::Folder);
            [a, b, c, d, e]
        };
        (table, keys)
    }

    fn floating() -> TableConfig {
        TableConfig::default().with_floating_columns(true)
    }

    #[test]
    fn test_forest_edits_relayout() {
        let (mut table, [a, ..]) = sample(floating());
        assert_eq!(table.rows().len(), 3);
        table.forest_mut().destroy(a);
        assert_eq!(table.rows().len(), 2);
        assert!(!table.rows().is_dirty());
        assert!(table.needs_full_repaint());
    }

    #[test]
    fn test_untouched_forest_repaints_nothing() {
        let (mut table, [a, ..]) = sample(floating());
        table.paint(&mut RecordingPainter::new());
        assert!(!table.needs_repaint());

        {
            let forest = table.forest_mut();
            assert_eq!(forest.get(a).map(|n| n.name()), Some("a"));
        }
        // Setting a value to what it already is changes nothing either.
        table.forest_mut().get_mut(a).unwrap().set_value(NodeValue::Checkbox(true));

        assert!(!table.needs_repaint());
        assert!(table.take_dirty_rows().is_empty());
        assert_eq!(table.take_repaint_region(), None);
    }

    #[test]
    fn test_value_edit_dirties_only_its_row() {
        let (mut table, [a, b, ..]) = sample(floating());
        table.toggle_open(1);
        table.paint(&mut RecordingPainter::new());

        table.forest_mut().get_mut(a).unwrap().set_value(NodeValue::Checkbox(false));
        assert!(!table.needs_full_repaint());
        assert_eq!(table.take_dirty_rows(), vec![0]);

        table.forest_mut().get_mut(b).unwrap().set_name("renamed");
        assert_eq!(table.take_dirty_rows(), vec![1]);
        assert_eq!(table.take_repaint_region(), None);
    }

    #[test]
    fn test_geometry_offsets() {
        let (table, _) = sample(floating());
        // Row header 30, column header 20.
        assert_eq!(table.geometry_for(1, 1), Some(Rect::new(130.0, 40.0, 100.0, 20.0)));
        assert_eq!(table.geometry_for(3, 0), None);
        assert_eq!(table.geometry_for(0, 2), None);
    }

    #[test]
    fn test_content_and_open_close_geometry() {
        let (mut table, _) = sample(floating());
        table.toggle_open(1);
        // b has children: indent by the open/close width only.
        assert_eq!(
            table.content_geometry_for(1, 0),
            Some(Rect::new(45.0, 40.0, 85.0, 20.0))
        );
        // c sits at depth 1 without children.
        assert_eq!(
            table.content_geometry_for(2, 0),
            Some(Rect::new(50.0, 60.0, 80.0, 20.0))
        );
        assert_eq!(table.content_geometry_for(2, 1), table.geometry_for(2, 1));
        assert_eq!(table.open_close_rect(1), Some(Rect::new(30.0, 40.0, 15.0, 20.0)));
        assert_eq!(table.open_close_rect(2), None);
    }

    #[test]
    fn test_hit_test() {
        let (table, _) = sample(floating());
        assert_eq!(table.hit_test(Point::new(31.0, 21.0)), Some((0, 0)));
        assert_eq!(table.hit_test(Point::new(150.0, 59.0)), Some((1, 1)));
        // Row header, column header, past the last row and column.
        assert_eq!(table.hit_test(Point::new(10.0, 30.0)), None);
        assert_eq!(table.hit_test(Point::new(50.0, 10.0)), None);
        assert_eq!(table.hit_test(Point::new(50.0, 80.0)), None);
        assert_eq!(table.hit_test(Point::new(230.0, 30.0)), None);
    }

    #[test]
    fn test_toggle_open_splices_and_damages() {
        let (mut table, [_, b, c, ..]) = sample(floating());
        table.set_viewport(Size::new(300.0, 300.0));
        table.take_repaint_region();
        table.take_dirty_rows();

        assert_eq!(table.toggle_open(1), Some(true));
        assert_eq!(table.rows().row_index_of(c), Some(2));
        assert_eq!(table.take_dirty_rows(), vec![1, 2, 3, 4]);
        assert_eq!(table.take_repaint_region(), None);

        assert_eq!(table.toggle_open(1), Some(false));
        assert!(!table.rows().is_open(b));
        assert_eq!(table.take_dirty_rows(), vec![1, 2]);
        // Rows used to end at 100; now they end at 60.
        assert_eq!(
            table.take_repaint_region(),
            Some(Rect::new(30.0, 80.0, 270.0, 40.0))
        );

        assert_eq!(table.toggle_open(0), None);
        assert_eq!(table.toggle_open(9), None);
    }

    #[test]
    fn test_fitted_columns_follow_viewport() {
        let (mut table, _) = sample(TableConfig::default());
        table.set_viewport(Size::new(330.0, 200.0));
        assert_eq!(table.content_size().width, 300.0);
        assert!(table.resize_column(0, 200));
        let widths: Vec<_> = table.columns().iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![200, 100]);
        table.set_viewport(Size::new(630.0, 200.0));
        assert_eq!(table.content_size().width, 600.0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let (mut table, _) = sample(floating());
        table.open_all();
        // 5 rows of 20 in a 60 pixel tall cell area.
        table.set_viewport(Size::new(130.0, 80.0));
        assert!(table.set_scroll(1000, 1000));
        assert_eq!(table.scroll(), (100, 40));
        assert_eq!(table.hit_test(Point::new(31.0, 21.0)), Some((2, 1)));
        assert_eq!(table.geometry_for(2, 1), Some(Rect::new(30.0, 20.0, 100.0, 20.0)));
        assert!(!table.set_scroll(1000, 1000));
    }

    #[test]
    fn test_select_marks_rows_dirty() {
        let (mut table, [a, ..]) = sample(floating());
        table.take_dirty_rows();
        assert!(table.select(0, 1));
        assert_eq!(table.take_dirty_rows(), vec![0]);
        assert!(!table.select(0, 1));
        assert!(table.select(2, 0));
        assert_eq!(table.take_dirty_rows(), vec![0, 2]);
        assert_eq!(table.selected(), Some((2, 0)));
        assert_ne!(table.selected_node(), Some(a));

        assert!(!table.select(3, 0));
        assert!(!table.select(0, 2));
        assert!(table.clear_selection());
        assert_eq!(table.take_dirty_rows(), vec![2]);
        assert_eq!(table.selected(), None);
    }

    #[test]
    fn test_selection_follows_node() {
        let (mut table, [_, _, _, _, e]) = sample(floating());
        table.select(2, 0);
        table.toggle_open(1);
        assert_eq!(table.selected(), Some((4, 0)));
        assert_eq!(table.selected_node(), Some(e));
        table.forest_mut().destroy(e);
        assert_eq!(table.selected_node(), None);
    }

    #[test]
    fn test_column_mode_dirties_every_row() {
        let (mut table, _) = sample(floating().with_selection_mode(SelectionMode::Column));
        table.take_dirty_rows();
        table.select(1, 1);
        assert_eq!(table.take_dirty_rows(), vec![0, 1, 2]);
        assert_eq!(table.selection_rect(), Some(Rect::new(130.0, 20.0, 100.0, 60.0)));
    }

    #[test]
    fn test_row_selection_rect() {
        let (mut table, _) = sample(floating().with_selection_mode(SelectionMode::Row));
        table.select(1, 1);
        assert_eq!(table.selection_rect(), Some(Rect::new(30.0, 40.0, 200.0, 20.0)));
    }

    #[test]
    fn test_paint_dirty_rows() {
        let (mut table, _) = sample(floating());
        let mut painter = RecordingPainter::new();
        table.paint(&mut painter);
        assert_eq!(painter.clip_depth(), 0);
        assert_eq!(painter.texts(), vec!["Name", "Value", "a", "on", "b", "e"]);

        painter.clear();
        table.select(2, 0);
        table.paint(&mut painter);
        assert_eq!(painter.texts(), vec!["e"]);
        assert!(painter.commands().contains(&PaintCommand::FillRect(
            Rect::new(30.0, 60.0, 100.0, 20.0),
            table.config().colors.selection,
        )));

        painter.clear();
        table.paint(&mut painter);
        assert!(painter.commands().is_empty());
    }

    #[test]
    fn test_empty_table() {
        let (mut table, _) = sample(floating());
        table.select(0, 0);
        table.empty_table();
        assert!(table.rows().is_empty());
        assert_eq!(table.selected_node(), None);
        assert_eq!(table.forest().len(), 1);
    }

    #[test]
    fn test_close_node() {
        let (mut table, [_, b, _, d, _]) = sample(floating());
        table.open_all();
        table.forest_mut().create_child(d, "f", NodeValue::Folder);
        table.open_all();
        assert_eq!(table.rows().len(), 6);
        assert!(table.close_node(d));
        assert_eq!(table.rows().len(), 5);
        assert!(!table.close_node(d));

        table.toggle_open(1);
        table.rows.set_open(d, true);
        assert!(table.close_node(d));
        assert!(!table.rows().is_open(d));
        assert!(!table.rows().is_open(b));
    }
}
