//! Threshold cascade.
//!
//! Every node starts inactive except the initiators. Each round, an inactive
//! node with at least one predecessor activates when
//! `active predecessors / predecessors >= threshold`. All activations decided
//! in a round are applied together at the end of it, so a node activated in
//! round `k` only counts toward decisions from round `k + 1`. The run stops
//! at the first round that activates nothing.
//!
//! Activation is monotonic and the node set is finite, so the run always
//! terminates after at most `|nodes|` activating rounds.

use std::collections::HashMap;

use graph::{DiffusionGraph, NodeId};
use tracing::{debug, info, instrument};

use crate::observer::{NoopObserver, Observer, Snapshot};
use crate::{check_initiators, CascadeConfig, CascadeOutcome, EngineError};

/// Runs the threshold cascade over a graph.
#[derive(Debug, Clone)]
pub struct CascadeEngine {
    config: CascadeConfig,
}

impl CascadeEngine {
    /// # Errors
    /// [`EngineError::InvalidParameter`] if the threshold is outside `[0, 1]`.
    pub fn new(config: CascadeConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Run the cascade to its fixpoint and return the final activation map.
    ///
    /// `observer` receives a snapshot after every round, including the last
    /// round that found nothing to activate.
    ///
    /// # Errors
    /// - [`EngineError::InvalidInitiator`] if an initiator is not in the graph.
    /// - [`EngineError::Observer`] if the observer fails.
    #[instrument(skip_all, fields(threshold = self.config.threshold, nodes = graph.node_count()))]
    pub fn run<G, S>(
        &self,
        graph: &mut G,
        initiators: &[S],
        observer: &mut dyn Observer<bool>,
    ) -> Result<CascadeOutcome, EngineError>
    where
        G: DiffusionGraph,
        S: AsRef<str>,
    {
        check_initiators(graph, initiators)?;

        let ids: Vec<NodeId> = graph.node_ids().to_vec();
        for id in &ids {
            graph.set_active(id, false)?;
        }
        for id in initiators {
            graph.set_active(id.as_ref(), true)?;
        }

        let mut rounds = 0;
        let mut executed = 0;
        loop {
            executed += 1;

            // Decide every activation from the same snapshot, then apply.
            let newly_active = self.ready_to_activate(graph, &ids)?;
            for id in &newly_active {
                graph.set_active(id, true)?;
            }
            debug!(round = executed, activated = newly_active.len(), "cascade round");

            let snapshot = active_snapshot(graph, &ids)?;
            observer.observe(&format!("Cascade Round {executed}"), &snapshot)?;

            if newly_active.is_empty() {
                break;
            }
            rounds += 1;
        }

        let active: HashMap<NodeId, bool> = active_snapshot(graph, &ids)?.into_iter().collect();
        info!(
            rounds,
            active = active.values().filter(|a| **a).count(),
            "cascade reached fixpoint"
        );

        Ok(CascadeOutcome { rounds, active })
    }

    /// Inactive nodes whose active-predecessor fraction meets the threshold.
    fn ready_to_activate<G: DiffusionGraph>(
        &self,
        graph: &G,
        ids: &[NodeId],
    ) -> Result<Vec<NodeId>, EngineError> {
        let mut ready = Vec::new();

        for id in ids {
            if graph.is_active(id)? {
                continue;
            }
            let predecessors = graph.predecessors(id)?;
            // No predecessors: only an initiator can be active.
            if predecessors.is_empty() {
                continue;
            }

            let mut active = 0usize;
            for pred in predecessors {
                if graph.is_active(pred)? {
                    active += 1;
                }
            }

            let fraction = active as f64 / predecessors.len() as f64;
            if fraction >= self.config.threshold {
                ready.push(id.clone());
            }
        }

        Ok(ready)
    }
}

fn active_snapshot<G: DiffusionGraph>(graph: &G, ids: &[NodeId]) -> Result<Snapshot<bool>, EngineError> {
    ids.iter()
        .map(|id| Ok((id.clone(), graph.is_active(id)?)))
        .collect()
}

/// Run a cascade with no observer and return the final `node -> active` map.
///
/// # Errors
/// See [`CascadeEngine::new`] and [`CascadeEngine::run`].
pub fn run_cascade<G, S>(
    graph: &mut G,
    initiators: &[S],
    threshold: f64,
) -> Result<HashMap<NodeId, bool>, EngineError>
where
    G: DiffusionGraph,
    S: AsRef<str>,
{
    let engine = CascadeEngine::new(CascadeConfig { threshold })?;
    let outcome = engine.run(graph, initiators, &mut NoopObserver)?;
    Ok(outcome.active)
}
