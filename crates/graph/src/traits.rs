//! The `DiffusionGraph` trait — the contract both engines consume.

use crate::{GraphError, HealthState, NodeAttributes, NodeId};

/// A directed graph with a fixed node set and mutable per-node attributes.
///
/// `node_ids` must return the same order for the lifetime of a run; the
/// engines iterate it (and each node's successor list) when drawing random
/// numbers, so a stable order is what makes seeded runs reproducible.
pub trait DiffusionGraph {
    /// All node ids in a stable order.
    fn node_ids(&self) -> &[NodeId];

    fn contains(&self, id: &str) -> bool;

    /// Nodes with an edge pointing into `id`.
    fn predecessors(&self, id: &str) -> Result<&[NodeId], GraphError>;

    /// Nodes reachable by one edge from `id`.
    fn successors(&self, id: &str) -> Result<&[NodeId], GraphError>;

    fn attributes(&self, id: &str) -> Result<&NodeAttributes, GraphError>;

    fn attributes_mut(&mut self, id: &str) -> Result<&mut NodeAttributes, GraphError>;

    fn node_count(&self) -> usize {
        self.node_ids().len()
    }

    fn is_active(&self, id: &str) -> Result<bool, GraphError> {
        Ok(self.attributes(id)?.active)
    }

    fn set_active(&mut self, id: &str, active: bool) -> Result<(), GraphError> {
        self.attributes_mut(id)?.active = active;
        Ok(())
    }

    fn state(&self, id: &str) -> Result<HealthState, GraphError> {
        Ok(self.attributes(id)?.state)
    }

    fn set_state(&mut self, id: &str, state: HealthState) -> Result<(), GraphError> {
        self.attributes_mut(id)?.state = state;
        Ok(())
    }
}
