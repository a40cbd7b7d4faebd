//! `graph` crate — the directed-graph contract the diffusion engines run on,
//! the in-memory `DiGraph` implementation, and graph file loading.
//!
//! The engines only ever talk to a graph through [`DiffusionGraph`].

pub mod attributes;
pub mod digraph;
pub mod error;
pub mod gml;
pub mod loader;
pub mod models;
pub mod traits;

pub use attributes::{HealthState, NodeAttributes};
pub use digraph::DiGraph;
pub use error::GraphError;
pub use loader::load_graph;
pub use models::{EdgeDefinition, GraphDefinition};
pub use traits::DiffusionGraph;

/// Stable, hashable node identifier.
pub type NodeId = String;
