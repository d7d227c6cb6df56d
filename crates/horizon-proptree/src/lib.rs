//! Horizon Proptree table and tree engines.
//!
//! This crate turns a synchronized property forest from
//! [`horizon_proptree_core`] into something a UI can draw and click on:
//!
//! - [`RowModel`] flattens the open part of the forest into rows;
//! - [`TableEngine`] maps rows and columns to viewport pixels, hit-tests
//!   pointer positions, tracks the selection and paints dirty rows through a
//!   [`Painter`];
//! - [`TreeEngine`] is a single-column table with tree click behavior.
//!
//! Layout constants and colors come from a [`TableConfig`], which can be
//! loaded from TOML.
//!
//! # Example
//!
//! ```
//! use horizon_proptree::{Point, RecordingPainter, Size, TreeEngine};
//! use horizon_proptree_core::NodeValue;
//!
//! let mut tree = TreeEngine::new();
//! tree.set_viewport(Size::new(200.0, 100.0));
//!
//! let root = tree.root();
//! {
//!     let mut forest = tree.forest_mut();
//!     let group = forest.create_child(root, "lighting", NodeValue::Folder);
//!     forest.create_child(group, "shadows", NodeValue::Checkbox(true));
//! }
//!
//! // Clicking the closed folder opens it.
//! tree.click(Point::new(50.0, 5.0));
//! assert_eq!(tree.rows().len(), 2);
//!
//! let mut painter = RecordingPainter::new();
//! tree.paint(&mut painter);
//! assert_eq!(painter.texts(), vec!["lighting", "shadows"]);
//! ```

pub mod column;
pub mod config;
pub mod damage;
pub mod geometry;
pub mod logging;
pub mod paint;
pub mod rows;
pub mod selection;
pub mod table;
pub mod tree;

pub use column::{Column, ColumnLayout};
pub use config::{ConfigError, ConfigResult, TableColors, TableConfig};
pub use damage::DamageTracker;
pub use geometry::{Color, Point, Rect, Size};
pub use paint::{Font, PaintCommand, Painter, RecordingPainter};
pub use rows::{Row, RowHeights, RowModel};
pub use selection::{Selection, SelectionMode};
pub use table::{ForestMut, TableEngine};
pub use tree::TreeEngine;
