//! In-memory directed graph.
//!
//! Nodes are stored in insertion order; predecessor and successor lists keep
//! the order in which edges were added. Both orders are stable, which is
//! what the engines rely on for reproducible seeded runs.

use std::collections::HashMap;

use crate::{DiffusionGraph, GraphError, NodeAttributes, NodeId};

/// Adjacency-list directed graph with typed per-node attributes.
#[derive(Debug, Clone, Default)]
pub struct DiGraph {
    ids: Vec<NodeId>,
    index: HashMap<NodeId, usize>,
    predecessors: Vec<Vec<NodeId>>,
    successors: Vec<Vec<NodeId>>,
    attributes: Vec<NodeAttributes>,
    edge_count: usize,
}

impl DiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an edge list, adding endpoints as they appear.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<NodeId>,
    {
        let mut graph = Self::new();
        for (from, to) in edges {
            let (from, to) = (from.into(), to.into());
            graph.add_node(from.clone());
            graph.add_node(to.clone());
            // Both endpoints were just inserted.
            let _ = graph.add_edge(&from, &to);
        }
        graph
    }

    /// Insert a node. Returns `false` if it was already present.
    pub fn add_node(&mut self, id: impl Into<NodeId>) -> bool {
        let id = id.into();
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id.clone(), self.ids.len());
        self.ids.push(id);
        self.predecessors.push(Vec::new());
        self.successors.push(Vec::new());
        self.attributes.push(NodeAttributes::default());
        true
    }

    /// Insert the edge `from -> to`. Parallel edges collapse into one.
    ///
    /// # Errors
    /// [`GraphError::NodeNotFound`] if either endpoint is missing.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let from_idx = self.position(from)?;
        let to_idx = self.position(to)?;

        if self.successors[from_idx].iter().any(|s| s == to) {
            return Ok(());
        }
        self.successors[from_idx].push(to.to_owned());
        self.predecessors[to_idx].push(from.to_owned());
        self.edge_count += 1;
        Ok(())
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    fn position(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_owned()))
    }
}

impl DiffusionGraph for DiGraph {
    fn node_ids(&self) -> &[NodeId] {
        &self.ids
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn predecessors(&self, id: &str) -> Result<&[NodeId], GraphError> {
        let idx = self.position(id)?;
        Ok(&self.predecessors[idx])
    }

    fn successors(&self, id: &str) -> Result<&[NodeId], GraphError> {
        let idx = self.position(id)?;
        Ok(&self.successors[idx])
    }

    fn attributes(&self, id: &str) -> Result<&NodeAttributes, GraphError> {
        let idx = self.position(id)?;
        Ok(&self.attributes[idx])
    }

    fn attributes_mut(&mut self, id: &str) -> Result<&mut NodeAttributes, GraphError> {
        let idx = self.position(id)?;
        Ok(&mut self.attributes[idx])
    }
}
