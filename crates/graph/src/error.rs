//! Graph-level error type.

use thiserror::Error;

use crate::NodeId;

/// Errors produced while building, loading or querying a graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A query or edge referenced an id the graph does not contain.
    #[error("node '{0}' not found in graph")]
    NodeNotFound(NodeId),

    /// The graph file is syntactically or structurally malformed.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
}
