//! Error types for tree and formatting operations.

use thiserror::Error;

use crate::dom::NodeId;

/// Result alias used by fallible tree operations.
pub type Result<T> = std::result::Result<T, EditorError>;

/// Errors raised while manipulating the content tree.
///
/// These never escape the public formatting operations: each operation
/// catches them at its boundary, logs them and falls back or no-ops.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    /// Node is not attached to the surface.
    #[error("node {0} is detached from the surface")]
    Detached(NodeId),

    /// Operation expected a different kind of node.
    #[error("node {node} is not {expected}")]
    WrongKind {
        node: NodeId,
        expected: &'static str,
    },

    /// Offset past the end of a node's content.
    #[error("offset {offset} out of bounds for node {node} (len {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    /// Boundary does not lie inside the requested ancestor.
    #[error("boundary in node {node} is not inside ancestor {ancestor}")]
    NotInside { node: NodeId, ancestor: NodeId },

    /// Range could not be resolved against the surface.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Unrecognised format, colour or theme name.
    #[error("unknown {kind} name: {name}")]
    UnknownName { kind: &'static str, name: String },
}
