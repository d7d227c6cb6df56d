//! Error types for the sync protocol.

use crate::id::NodeId;
use crate::kind::NodeKind;

/// Result type for protocol operations.
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding a create or patch document.
///
/// A returned error always means the forest was left untouched.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A patch element addresses a node that does not exist.
    #[error("no node with id {id}")]
    UnknownNodeId { id: NodeId },

    /// The `Type` attribute names no decodable kind.
    #[error("unknown node type '{code}' on node {id}")]
    UnknownKind { code: String, id: NodeId },

    /// A required attribute is absent.
    #[error("missing attribute '{attribute}' on node {}", display_id(.id))]
    MissingAttribute {
        attribute: String,
        id: Option<NodeId>,
    },

    /// A required payload element is absent.
    #[error("missing element '{element}' in node {id}")]
    MissingElement { element: &'static str, id: NodeId },

    /// An attribute is present but does not parse.
    #[error("invalid value '{value}' for attribute '{attribute}' on node {}", display_id(.id))]
    InvalidAttribute {
        attribute: String,
        value: String,
        id: Option<NodeId>,
    },

    /// A patch would change the kind of an existing node.
    #[error("node {id} is {expected}, patch says {found}")]
    KindMismatch {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },

    /// A patch document is applied to a node with a different ID.
    #[error("patch addresses node {found}, applied to node {expected}")]
    IdMismatch { expected: NodeId, found: NodeId },

    /// A create document would introduce an ID that is already taken.
    #[error("duplicate node id {id}")]
    DuplicateId { id: NodeId },

    /// The document is not a single well-formed element tree.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The XML tokenizer failed.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

fn display_id(id: &Option<NodeId>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<unknown>".to_string(),
    }
}
