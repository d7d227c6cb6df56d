//! Core systems for Horizon Proptree.
//!
//! This crate provides the data side of a synchronized property tree:
//!
//! - **Forest**: Arena-backed n-ary trees with explicit parent/sibling links
//! - **Node Kinds**: The closed set of property kinds and their payloads
//! - **IDs**: Process-wide node identifiers that correlate both ends of a sync
//! - **Sync Protocol**: XML create and patch documents keyed by node ID
//! - **Debugging**: Tracing targets and tree visualization
//!
//! Presentation (row flattening, column layout, hit testing and painting)
//! lives in the `horizon-proptree` crate.
//!
//! # Example
//!
//! ```
//! use horizon_proptree_core::{Document, NodeKind, NodeValue, SyncForest};
//!
//! // The owning side builds a tree.
//! let mut sender = SyncForest::new();
//! let root = sender.create_default("root", NodeKind::Root);
//! let group = sender.create_child(root, "lighting", NodeValue::Folder);
//! let gain = sender.create_default("gain", NodeKind::FloatValuator);
//! sender.push_back(group, gain);
//!
//! // The document travels as text.
//! let text = sender.encode(root).unwrap().to_xml_string();
//!
//! // The remote side rebuilds it with the same IDs.
//! let mut receiver = SyncForest::new();
//! let copy = receiver.decode_create(&Document::parse(&text).unwrap()).unwrap();
//! assert_eq!(receiver.id_of(copy), sender.id_of(root));
//! assert_eq!(receiver.descendants(copy).count(), 2);
//! ```

mod error;
pub mod forest;
mod id;
mod kind;
pub mod logging;
pub mod protocol;
mod sync;
pub mod value;
pub mod xml;

pub use error::{ProtocolError, ProtocolResult};
pub use forest::{Forest, Links, NodeData, NodeKey};
pub use id::{IdGenerator, NodeId, SharedIdGenerator};
pub use kind::{NodeKind, PROPERTY_BORDER_Y};
pub use logging::{ForestDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use sync::{SyncForest, SyncNode, UNDEFINED_NAME};
pub use value::{
    Axis, Bounded, Combo, ComboItem, Knot, NodeValue, Rgb, Rgba, Stepped, VectorValuator,
};
pub use xml::{Document, Element};
