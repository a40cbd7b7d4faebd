//! Serializable graph description.
//!
//! This is the JSON on-disk form accepted by [`crate::load_graph`] for files
//! with a `.json` extension.

use serde::{Deserialize, Serialize};

use crate::{DiGraph, GraphError, NodeId};

/// Directed edge from one node to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDefinition {
    pub from: NodeId,
    pub to: NodeId,
}

/// A complete graph definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Undirected definitions get both directions of every edge.
    #[serde(default = "default_directed")]
    pub directed: bool,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

fn default_directed() -> bool {
    true
}

impl GraphDefinition {
    /// Build the in-memory graph.
    ///
    /// # Errors
    /// [`GraphError::NodeNotFound`] if an edge references an undeclared node.
    pub fn build(&self) -> Result<DiGraph, GraphError> {
        let mut graph = DiGraph::new();
        for id in &self.nodes {
            graph.add_node(id.clone());
        }
        for edge in &self.edges {
            graph.add_edge(&edge.from, &edge.to)?;
            if !self.directed {
                graph.add_edge(&edge.to, &edge.from)?;
            }
        }
        Ok(graph)
    }
}
