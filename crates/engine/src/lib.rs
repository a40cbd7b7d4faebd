//! `engine` crate — the threshold cascade and SIR epidemic engines, their
//! configuration, result types and observation sinks.

pub mod cascade;
pub mod epidemic;
pub mod error;
pub mod models;
pub mod observer;

pub use cascade::{run_cascade, CascadeEngine};
pub use epidemic::{run_epidemic, EpidemicEngine};
pub use error::EngineError;
pub use models::{CascadeConfig, CascadeOutcome, DayCounts, EpidemicConfig, EpidemicReport};
pub use observer::{NoopObserver, Observer, RecordingObserver, Snapshot, TracingObserver};

use graph::DiffusionGraph;

/// Every initiator must name a node of the graph.
pub(crate) fn check_initiators<G, S>(graph: &G, initiators: &[S]) -> Result<(), EngineError>
where
    G: DiffusionGraph + ?Sized,
    S: AsRef<str>,
{
    for id in initiators {
        let id: &str = id.as_ref();
        if !graph.contains(id) {
            return Err(EngineError::InvalidInitiator(id.to_owned()));
        }
    }
    Ok(())
}
