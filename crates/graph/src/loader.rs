//! Load a graph from disk.

use std::path::Path;

use tracing::info;

use crate::{gml::parse_gml, DiGraph, DiffusionGraph, GraphDefinition, GraphError};

/// Read a graph file. `.json` files are parsed as a [`GraphDefinition`];
/// anything else is treated as GML.
///
/// # Errors
/// Propagates I/O, JSON and GML parse failures as [`GraphError`].
pub fn load_graph(path: impl AsRef<Path>) -> Result<DiGraph, GraphError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let graph = if is_json {
        let definition: GraphDefinition = serde_json::from_str(&content)?;
        definition.build()?
    } else {
        parse_gml(&content)?
    };

    info!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph loaded"
    );
    Ok(graph)
}
