//! Engine configuration and run results.
//!
//! Configs are validated once, when an engine is constructed; the run loops
//! can then assume every parameter is in range.

use std::collections::HashMap;

use graph::{HealthState, NodeId};
use serde::{Deserialize, Serialize};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the threshold cascade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Fraction of active predecessors needed to activate, in `[0, 1]`.
    pub threshold: f64,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl CascadeConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        check_unit_interval("threshold", self.threshold)
    }
}

/// Tuning knobs for the epidemic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpidemicConfig {
    /// Per-edge transmission probability.
    pub p_infect: f64,
    /// Number of simulated days.
    pub lifespan: usize,
    /// Fraction of nodes that shelter for the whole run.
    pub shelter_rate: f64,
    /// Fraction of nodes vaccinated before day 1.
    pub vaccination_rate: f64,
}

impl Default for EpidemicConfig {
    fn default() -> Self {
        Self {
            p_infect: 0.1,
            lifespan: 30,
            shelter_rate: 0.0,
            vaccination_rate: 0.0,
        }
    }
}

impl EpidemicConfig {
    /// Build and validate a config from raw values.
    ///
    /// # Errors
    /// [`EngineError::InvalidParameter`] for a negative `lifespan` or any
    /// rate outside `[0, 1]`.
    pub fn new(
        p_infect: f64,
        lifespan: i64,
        shelter_rate: f64,
        vaccination_rate: f64,
    ) -> Result<Self, EngineError> {
        let lifespan = usize::try_from(lifespan).map_err(|_| EngineError::InvalidParameter {
            name: "lifespan",
            value: lifespan as f64,
            expected: ">= 0",
        })?;
        let config = Self { p_infect, lifespan, shelter_rate, vaccination_rate };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        check_unit_interval("p_infect", self.p_infect)?;
        check_unit_interval("shelter_rate", self.shelter_rate)?;
        check_unit_interval("vaccination_rate", self.vaccination_rate)
    }
}

/// NaN fails the range check too.
fn check_unit_interval(name: &'static str, value: f64) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter { name, value, expected: "0 <= x <= 1" })
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Final state of a cascade run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeOutcome {
    /// Rounds that activated at least one node. The closing round that
    /// found nothing to activate is not counted.
    pub rounds: usize,
    /// Activation flag of every node.
    pub active: HashMap<NodeId, bool>,
}

impl CascadeOutcome {
    /// Ids of the active nodes, sorted.
    pub fn active_nodes(&self) -> Vec<&NodeId> {
        let mut nodes: Vec<&NodeId> = self
            .active
            .iter()
            .filter(|(_, &active)| active)
            .map(|(id, _)| id)
            .collect();
        nodes.sort();
        nodes
    }
}

/// Compartment sizes for one day, taken before that day's transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DayCounts {
    /// 1-based day number.
    pub day: usize,
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub vaccinated: usize,
}

impl DayCounts {
    pub(crate) fn record(&mut self, state: HealthState) {
        match state {
            HealthState::Susceptible => self.susceptible += 1,
            HealthState::Infected => self.infected += 1,
            HealthState::Recovered => self.recovered += 1,
            HealthState::Vaccinated => self.vaccinated += 1,
        }
    }
}

/// Full record of an epidemic run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpidemicReport {
    /// One entry per simulated day.
    pub days: Vec<DayCounts>,
    /// Nodes drawn for vaccination, in draw order.
    pub vaccinated: Vec<NodeId>,
    /// Nodes drawn for sheltering, in draw order.
    pub sheltered: Vec<NodeId>,
    /// Compartment of every node after the last day.
    pub final_states: HashMap<NodeId, HealthState>,
}

impl EpidemicReport {
    /// Infected count of each day, before that day's transitions.
    pub fn infected_history(&self) -> Vec<usize> {
        self.days.iter().map(|d| d.infected).collect()
    }

    /// Day with the most infected nodes (earliest on ties).
    pub fn peak(&self) -> Option<&DayCounts> {
        self.days
            .iter()
            .rev()
            .max_by_key(|d| d.infected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_are_valid() {
        CascadeConfig::default().validate().expect("default cascade config");
        EpidemicConfig::default().validate().expect("default epidemic config");
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        assert!(matches!(
            CascadeConfig { threshold: 1.5 }.validate(),
            Err(EngineError::InvalidParameter { name: "threshold", .. })
        ));
        assert!(matches!(
            EpidemicConfig::new(0.5, 10, -0.1, 0.0),
            Err(EngineError::InvalidParameter { name: "shelter_rate", .. })
        ));
        assert!(matches!(
            EpidemicConfig::new(f64::NAN, 10, 0.0, 0.0),
            Err(EngineError::InvalidParameter { name: "p_infect", .. })
        ));
    }

    #[test]
    fn negative_lifespan_is_rejected() {
        assert!(matches!(
            EpidemicConfig::new(0.5, -1, 0.0, 0.0),
            Err(EngineError::InvalidParameter { name: "lifespan", .. })
        ));
        let config = EpidemicConfig::new(0.5, 0, 0.0, 1.0).expect("zero days is valid");
        assert_eq!(config.lifespan, 0);
    }

    #[test]
    fn day_counts_serialize_by_compartment() {
        let day = DayCounts { day: 3, susceptible: 4, infected: 2, recovered: 1, vaccinated: 0 };
        let json = serde_json::to_value(day).unwrap();
        assert_eq!(json["day"], 3);
        assert_eq!(json["infected"], 2);
    }

    #[test]
    fn peak_prefers_the_earliest_day() {
        let day = |day, infected| DayCounts { day, infected, ..Default::default() };
        let report = EpidemicReport {
            days: vec![day(1, 1), day(2, 3), day(3, 3), day(4, 0)],
            vaccinated: vec![],
            sheltered: vec![],
            final_states: HashMap::new(),
        };
        assert_eq!(report.infected_history(), vec![1, 3, 3, 0]);
        assert_eq!(report.peak().map(|d| d.day), Some(2));
    }
}
