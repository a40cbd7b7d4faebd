//! Observation sinks — where the engines report per-round/per-day snapshots.
//!
//! The engines call [`Observer::observe`] once per cascade round and once per
//! epidemic day. Rendering or persisting a snapshot is entirely up to the
//! sink; the engines only propagate its errors.

use std::collections::BTreeMap;

use graph::{HealthState, NodeId};
use tracing::{debug, info};

/// Node id → attribute value, in the graph's node order.
pub type Snapshot<T> = Vec<(NodeId, T)>;

/// Receives a labelled snapshot after every round or day.
pub trait Observer<T> {
    fn observe(&mut self, label: &str, snapshot: &Snapshot<T>) -> anyhow::Result<()>;
}

/// Discards every snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<T> Observer<T> for NoopObserver {
    fn observe(&mut self, _label: &str, _snapshot: &Snapshot<T>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps every snapshot it receives, in call order.
#[derive(Debug, Clone)]
pub struct RecordingObserver<T> {
    pub snapshots: Vec<(String, Snapshot<T>)>,
}

impl<T> Default for RecordingObserver<T> {
    fn default() -> Self {
        Self { snapshots: Vec::new() }
    }
}

impl<T> RecordingObserver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots received.
    pub fn call_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.snapshots.iter().map(|(label, _)| label.as_str()).collect()
    }
}

impl<T: Clone> Observer<T> for RecordingObserver<T> {
    fn observe(&mut self, label: &str, snapshot: &Snapshot<T>) -> anyhow::Result<()> {
        self.snapshots.push((label.to_owned(), snapshot.clone()));
        Ok(())
    }
}

/// Logs a one-line summary of each snapshot through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer<bool> for TracingObserver {
    fn observe(&mut self, label: &str, snapshot: &Snapshot<bool>) -> anyhow::Result<()> {
        let active: Vec<&str> = snapshot
            .iter()
            .filter(|(_, active)| *active)
            .map(|(id, _)| id.as_str())
            .collect();
        info!("{label}: {}/{} active", active.len(), snapshot.len());
        debug!("{label}: active {active:?}");
        Ok(())
    }
}

impl Observer<HealthState> for TracingObserver {
    fn observe(&mut self, label: &str, snapshot: &Snapshot<HealthState>) -> anyhow::Result<()> {
        let mut counts: BTreeMap<char, usize> = BTreeMap::new();
        for (_, state) in snapshot {
            *counts.entry(state.code()).or_insert(0) += 1;
        }
        info!("{label}: {counts:?}");
        Ok(())
    }
}
