//! Engine-level error types.

use graph::{GraphError, NodeId};
use thiserror::Error;

/// Errors produced by the diffusion engines (validation + execution).
///
/// Every variant aborts the run at the point of detection; a partially
/// simulated run is never returned.
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Validation errors ------

    /// An initiator id is not a node of the graph.
    #[error("initiator '{0}' is not a node of the graph")]
    InvalidInitiator(NodeId),

    /// A numeric parameter is outside its documented range.
    #[error("parameter '{name}' = {value} is out of range ({expected})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    // ------ Execution errors ------

    /// Graph query failure, propagated unchanged.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The observation sink failed; the run stops after the current step.
    #[error(transparent)]
    Observer(#[from] anyhow::Error),
}
