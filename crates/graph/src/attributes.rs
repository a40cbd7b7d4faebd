//! Typed per-node attributes.
//!
//! Each engine owns exactly one field: the cascade engine writes `active`,
//! the epidemic engine writes `state`. Nothing else mutates them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Epidemic compartment of a node.
///
/// Transitions are one-way: `Susceptible -> Infected -> Recovered`, and
/// `Susceptible -> Vaccinated` only while a run is being set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HealthState {
    #[default]
    #[serde(rename = "S")]
    Susceptible,
    #[serde(rename = "I")]
    Infected,
    #[serde(rename = "R")]
    Recovered,
    #[serde(rename = "V")]
    Vaccinated,
}

impl HealthState {
    /// Single-letter compartment code.
    pub fn code(self) -> char {
        match self {
            HealthState::Susceptible => 'S',
            HealthState::Infected => 'I',
            HealthState::Recovered => 'R',
            HealthState::Vaccinated => 'V',
        }
    }
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Mutable state carried by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeAttributes {
    /// Cascade activation flag.
    pub active: bool,
    /// Epidemic compartment.
    pub state: HealthState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attributes_are_inactive_and_susceptible() {
        let attrs = NodeAttributes::default();
        assert!(!attrs.active);
        assert_eq!(attrs.state, HealthState::Susceptible);
    }

    #[test]
    fn states_serialize_as_compartment_codes() {
        let json = serde_json::to_string(&HealthState::Vaccinated).unwrap();
        assert_eq!(json, "\"V\"");
        assert_eq!(HealthState::Recovered.to_string(), "R");
    }
}
