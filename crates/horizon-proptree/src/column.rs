//! Column widths and horizontal layout.
//!
//! Columns are laid out left to right starting at x = 0 of the cell area.
//! In floating mode every column keeps its own width and the total may
//! overflow the viewport. In fitted mode the non-fixed ("flexible") columns
//! always share the width left over by the fixed ones; the last flexible
//! column absorbs rounding so the total matches exactly.
//!
//! Fitting only happens once the available width is known (non-zero).

use crate::logging::targets;

/// One table column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub width: u32,
    pub min_width: u32,
    /// Fixed columns keep their width when the table is fitted.
    pub fixed_width: bool,
}

/// The columns of a table and how they share the available width.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    floating: bool,
    available: u32,
}

impl ColumnLayout {
    pub fn new(floating: bool) -> Self {
        Self {
            columns: Vec::new(),
            floating,
            available: 0,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.floating
    }

    /// Switch between floating and fitted mode.
    pub fn set_floating(&mut self, floating: bool) {
        self.floating = floating;
        self.fit_proportional();
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Width the cell area offers to the columns.
    pub fn available(&self) -> u32 {
        self.available
    }

    fn is_fitted(&self) -> bool {
        !self.floating && self.available > 0
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Append a column and return its index.
    ///
    /// In fitted mode all flexible columns are then reset to an equal share.
    pub fn add_column(&mut self, column: Column) -> usize {
        self.columns.push(column);
        if self.is_fitted() {
            self.fit_equal();
        }
        self.columns.len() - 1
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    /// Set the available width, rescaling flexible columns in fitted mode.
    pub fn set_available(&mut self, width: u32) {
        if self.available == width {
            return;
        }
        self.available = width;
        self.fit_proportional();
    }

    /// Resize the column at `index`, clamped to its minimum width.
    ///
    /// In fitted mode the other flexible columns give or take the difference
    /// in proportion to their widths, and `width` is capped so they keep
    /// their minimums. Returns `false` when nothing could be resized.
    pub fn resize(&mut self, index: usize, width: u32) -> bool {
        let Some(column) = self.columns.get(index) else {
            return false;
        };
        if column.fixed_width {
            tracing::warn!(target: targets::TABLE, index, "ignoring resize of fixed column");
            return false;
        }
        let width = width.max(column.min_width);

        if !self.is_fitted() {
            self.columns[index].width = width;
            return true;
        }

        let others: Vec<usize> = self
            .flexible()
            .filter(|&other| other != index)
            .collect();
        if others.is_empty() {
            tracing::warn!(
                target: targets::TABLE,
                index,
                "ignoring resize of the only flexible column"
            );
            return false;
        }

        let flex_total = self.flexible_target();
        let reserved: u32 = others.iter().map(|&i| self.columns[i].min_width).sum();
        let cap = flex_total.saturating_sub(reserved).max(self.columns[index].min_width);
        let width = width.min(cap);

        self.columns[index].width = width;
        self.distribute(&others, flex_total.saturating_sub(width));
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Sum of all column widths.
    pub fn total_width(&self) -> u32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Left edge of column `index`, relative to the start of the cell area.
    pub fn column_x(&self, index: usize) -> Option<u32> {
        if index >= self.columns.len() {
            return None;
        }
        Some(self.columns[..index].iter().map(|c| c.width).sum())
    }

    /// Index of the column covering `x`, relative to the start of the cell area.
    pub fn column_at(&self, x: u32) -> Option<usize> {
        let mut left = 0;
        for (index, column) in self.columns.iter().enumerate() {
            let right = left + column.width;
            if x >= left && x < right {
                return Some(index);
            }
            left = right;
        }
        None
    }

    // =========================================================================
    // Fitting
    // =========================================================================

    fn flexible(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.fixed_width)
            .map(|(i, _)| i)
    }

    /// Width the flexible columns must fill together.
    fn flexible_target(&self) -> u32 {
        let fixed: u32 = self
            .columns
            .iter()
            .filter(|c| c.fixed_width)
            .map(|c| c.width)
            .sum();
        self.available.saturating_sub(fixed)
    }

    fn fit_equal(&mut self) {
        let flexible: Vec<usize> = self.flexible().collect();
        let Some(count) = u32::try_from(flexible.len()).ok().filter(|&n| n > 0) else {
            return;
        };
        let target = self.flexible_target();
        let share = target / count;
        let last_share = target - share * (count - 1);
        for (n, &index) in flexible.iter().enumerate() {
            let column = &mut self.columns[index];
            let width = if n + 1 == flexible.len() { last_share } else { share };
            column.width = width.max(column.min_width);
        }
    }

    fn fit_proportional(&mut self) {
        if !self.is_fitted() {
            return;
        }
        let flexible: Vec<usize> = self.flexible().collect();
        let target = self.flexible_target();
        self.distribute(&flexible, target);
    }

    /// Rescale the columns at `indices` so their widths sum to `target`.
    ///
    /// Every column keeps its minimum; the width above the minimums is shared
    /// in proportion to what each column had above its own minimum. The last
    /// column takes whatever rounding leaves over.
    fn distribute(&mut self, indices: &[usize], target: u32) {
        let Some((&last, rest)) = indices.split_last() else {
            return;
        };
        let minimums: u32 = indices.iter().map(|&i| self.columns[i].min_width).sum();
        let spare = u64::from(target.saturating_sub(minimums));
        let excess: u64 = indices
            .iter()
            .map(|&i| u64::from(self.columns[i].width.saturating_sub(self.columns[i].min_width)))
            .sum();
        let count = indices.len() as u64;

        let mut assigned = 0u32;
        for &index in rest {
            let column = &mut self.columns[index];
            let extra = if excess == 0 {
                spare / count
            } else {
                u64::from(column.width.saturating_sub(column.min_width)) * spare / excess
            };
            column.width = column
                .min_width
                .saturating_add(u32::try_from(extra).unwrap_or(u32::MAX));
            assigned = assigned.saturating_add(column.width);
        }
        let column = &mut self.columns[last];
        column.width = target.saturating_sub(assigned).max(column.min_width);
        tracing::trace!(target: targets::TABLE, target, columns = indices.len(), "distributed width");
    }
}
