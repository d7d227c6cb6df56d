//! Logging and debugging facilities for Horizon Proptree.
//!
//! This module provides:
//! - Target names for filtering the `tracing` output of each subsystem
//! - Debug visualization for forests of synchronized nodes
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Proptree only emits events; install a subscriber to see them:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_proptree_core::protocol=debug")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! ```
//! use horizon_proptree_core::logging::{ForestDebug, TreeFormatOptions};
//! use horizon_proptree_core::{NodeValue, SyncForest};
//!
//! let mut forest = SyncForest::new();
//! let root = forest.create_node("settings", NodeValue::Folder);
//! forest.create_child(root, "enabled", NodeValue::Checkbox(true));
//!
//! let text = ForestDebug::with_options(&forest, TreeFormatOptions::minimal())
//!     .format_subtree(root)
//!     .unwrap();
//! assert_eq!(text, "settings\n\u{2514}\u{2500}\u{2500} enabled\n");
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::forest::NodeKey;
use crate::sync::SyncForest;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Forest topology target.
    pub const FOREST: &str = "horizon_proptree_core::forest";
    /// Sync protocol target.
    pub const PROTOCOL: &str = "horizon_proptree_core::protocol";
    /// Performance spans.
    pub const PERF: &str = "horizon_proptree_core::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact dash-prefixed lines.
    Compact,
}

/// Configuration for forest debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show wire IDs.
    pub show_ids: bool,
    /// Whether to show node kinds.
    pub show_kinds: bool,
    /// Whether to show the display text of each payload.
    pub show_values: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_kinds: true,
            show_values: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Options that also print every value.
    pub fn detailed() -> Self {
        Self {
            show_values: true,
            ..Default::default()
        }
    }

    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_kinds: false,
            show_values: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing a [`SyncForest`].
#[derive(Debug, Clone)]
pub struct ForestDebug<'a> {
    forest: &'a SyncForest,
    options: TreeFormatOptions,
}

impl<'a> ForestDebug<'a> {
    /// Create a visualizer with default options.
    pub fn new(forest: &'a SyncForest) -> Self {
        Self::with_options(forest, TreeFormatOptions::default())
    }

    /// Create a visualizer with custom options.
    pub fn with_options(forest: &'a SyncForest, options: TreeFormatOptions) -> Self {
        Self { forest, options }
    }

    /// Format every detached tree in the forest.
    pub fn format_all(&self) -> String {
        let mut roots: Vec<NodeKey> = self
            .forest
            .iter()
            .filter(|(key, _)| self.forest.parent(*key).is_none())
            .map(|(key, _)| key)
            .collect();
        roots.sort_by_key(|key| self.forest.id_of(*key));

        let mut output = String::new();
        writeln!(output, "Forest ({} total nodes):", self.forest.len()).expect("write to String");
        if roots.is_empty() {
            writeln!(output, "  (empty)").expect("write to String");
        }
        for root in roots {
            self.format_subtree_into(root, 0, true, &mut output);
        }
        output
    }

    /// Format the subtree rooted at `root`, or `None` for a stale key.
    pub fn format_subtree(&self, root: NodeKey) -> Option<String> {
        if !self.forest.contains(root) {
            return None;
        }
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output);
        Some(output)
    }

    fn format_subtree_into(&self, key: NodeKey, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Some(node) = self.forest.node(key) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(node.name());
        if self.options.show_ids {
            write!(output, " [{}]", node.id()).expect("write to String");
        }
        if self.options.show_kinds {
            write!(output, " ({})", node.kind()).expect("write to String");
        }
        if self.options.show_values {
            let text = node.value().display_text();
            if !text.is_empty() {
                write!(output, " = {text}").expect("write to String");
            }
        }
        output.push('\n');

        let children: Vec<NodeKey> = self.forest.children(key).collect();
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500} ",
                "\u{2514}\u{2500}\u{2500} ",
            ),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

impl fmt::Display for ForestDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_all())
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for tracking the duration of layout and protocol passes.
#[derive(Debug)]
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Enter a span named after `operation`.
    pub fn new(operation: &'static str) -> Self {
        let span = tracing::info_span!(target: targets::PERF, "perf", operation);
        Self {
            _span: span.entered(),
        }
    }
}
