//! Stochastic SIR epidemic with vaccination and sheltering.
//!
//! Setup, once per run:
//! 1. every node becomes `Susceptible`;
//! 2. `round(|nodes| * vaccination_rate)` nodes are drawn and vaccinated;
//! 3. `round(|nodes| * shelter_rate)` nodes are drawn, independently, into
//!    the sheltered set (the two draws may overlap);
//! 4. initiators that are still `Susceptible` become `Infected`.
//!
//! Each day, every `Infected` node tries to infect each `Susceptible`,
//! unsheltered successor with probability `p_infect` (one draw per edge) and
//! then recovers. Transitions are decided from the start-of-day state and
//! applied together at the end of the day.
//!
//! Random draws happen in a fixed order (vaccination sample, shelter sample,
//! then per-edge draws in node order and successor order), so a seeded
//! generator reproduces a run exactly.

use std::collections::{HashMap, HashSet};

use graph::{DiffusionGraph, HealthState, NodeId};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::observer::{NoopObserver, Observer, Snapshot};
use crate::{check_initiators, DayCounts, EngineError, EpidemicConfig, EpidemicReport};

/// Upper bound on the day history reserved up front; longer runs grow it.
const MAX_PREALLOCATED_DAYS: usize = 4096;

/// Runs the epidemic over a graph.
#[derive(Debug, Clone)]
pub struct EpidemicEngine {
    config: EpidemicConfig,
}

impl EpidemicEngine {
    /// # Errors
    /// [`EngineError::InvalidParameter`] if any rate is outside `[0, 1]`.
    pub fn new(config: EpidemicConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EpidemicConfig {
        &self.config
    }

    /// Simulate `lifespan` days and return the daily compartment counts.
    ///
    /// `observer` receives the node states at the end of every day.
    ///
    /// # Errors
    /// - [`EngineError::InvalidInitiator`] if an initiator is not in the graph.
    /// - [`EngineError::Observer`] if the observer fails.
    #[instrument(
        skip_all,
        fields(
            p_infect = self.config.p_infect,
            lifespan = self.config.lifespan,
            nodes = graph.node_count()
        )
    )]
    pub fn run<G, S, R>(
        &self,
        graph: &mut G,
        initiators: &[S],
        rng: &mut R,
        observer: &mut dyn Observer<HealthState>,
    ) -> Result<EpidemicReport, EngineError>
    where
        G: DiffusionGraph,
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        check_initiators(graph, initiators)?;

        let ids: Vec<NodeId> = graph.node_ids().to_vec();
        for id in &ids {
            graph.set_state(id, HealthState::Susceptible)?;
        }

        let vaccinated = draw_nodes(rng, &ids, self.config.vaccination_rate);
        for id in &vaccinated {
            graph.set_state(id, HealthState::Vaccinated)?;
        }

        let sheltered = draw_nodes(rng, &ids, self.config.shelter_rate);
        let shelter_set: HashSet<&str> = sheltered.iter().map(String::as_str).collect();

        for id in initiators {
            let id: &str = id.as_ref();
            match graph.state(id)? {
                HealthState::Susceptible => graph.set_state(id, HealthState::Infected)?,
                HealthState::Vaccinated => warn!(initiator = id, "vaccinated initiator not seeded"),
                // Already seeded by a repeated id.
                HealthState::Infected | HealthState::Recovered => {}
            }
        }

        info!(
            vaccinated = vaccinated.len(),
            sheltered = sheltered.len(),
            "epidemic set up"
        );

        let mut days = Vec::with_capacity(self.config.lifespan.min(MAX_PREALLOCATED_DAYS));
        for day in 1..=self.config.lifespan {
            let mut counts = DayCounts { day, ..Default::default() };
            let mut transitions: Vec<(NodeId, HealthState)> = Vec::new();

            for id in &ids {
                let state = graph.state(id)?;
                counts.record(state);
                if state != HealthState::Infected {
                    continue;
                }

                for succ in graph.successors(id)? {
                    if graph.state(succ)? != HealthState::Susceptible
                        || shelter_set.contains(succ.as_str())
                    {
                        continue;
                    }
                    if rng.gen::<f64>() < self.config.p_infect {
                        transitions.push((succ.clone(), HealthState::Infected));
                    }
                }
                transitions.push((id.clone(), HealthState::Recovered));
            }

            for (id, state) in &transitions {
                graph.set_state(id, *state)?;
            }
            debug!(
                day,
                susceptible = counts.susceptible,
                infected = counts.infected,
                recovered = counts.recovered,
                vaccinated = counts.vaccinated,
                "epidemic day"
            );
            days.push(counts);

            let snapshot = state_snapshot(graph, &ids)?;
            observer.observe(&format!("Epidemic Day {day}"), &snapshot)?;
        }

        let final_states: HashMap<NodeId, HealthState> =
            state_snapshot(graph, &ids)?.into_iter().collect();
        let report = EpidemicReport { days, vaccinated, sheltered, final_states };

        info!(
            days = report.days.len(),
            peak_infected = report.peak().map_or(0, |d| d.infected),
            "epidemic finished"
        );
        Ok(report)
    }
}

/// Draw `round(|ids| * rate)` distinct nodes uniformly at random.
fn draw_nodes<R: Rng + ?Sized>(rng: &mut R, ids: &[NodeId], rate: f64) -> Vec<NodeId> {
    let amount = ((ids.len() as f64 * rate).round() as usize).min(ids.len());
    rand::seq::index::sample(rng, ids.len(), amount)
        .into_iter()
        .map(|i| ids[i].clone())
        .collect()
}

fn state_snapshot<G: DiffusionGraph>(
    graph: &G,
    ids: &[NodeId],
) -> Result<Snapshot<HealthState>, EngineError> {
    ids.iter()
        .map(|id| Ok((id.clone(), graph.state(id)?)))
        .collect()
}

/// Run an epidemic with no observer and return the daily infected counts.
///
/// # Errors
/// [`EngineError::InvalidParameter`] for a negative `lifespan` or a rate
/// outside `[0, 1]`; otherwise see [`EpidemicEngine::run`].
pub fn run_epidemic<G, S, R>(
    graph: &mut G,
    initiators: &[S],
    p_infect: f64,
    lifespan: i64,
    shelter_rate: f64,
    vaccination_rate: f64,
    rng: &mut R,
) -> Result<Vec<usize>, EngineError>
where
    G: DiffusionGraph,
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    let config = EpidemicConfig::new(p_infect, lifespan, shelter_rate, vaccination_rate)?;
    let report = EpidemicEngine::new(config)?.run(graph, initiators, rng, &mut NoopObserver)?;
    Ok(report.infected_history())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::DiGraph;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::observer::RecordingObserver;

    fn star(leaves: usize) -> DiGraph {
        DiGraph::from_edges((0..leaves).map(|i| ("hub".to_string(), format!("leaf{i}"))))
    }

    #[test]
    fn certain_transmission_reaches_every_successor() {
        let mut graph = star(5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let history = run_epidemic(&mut graph, &["hub"], 1.0, 3, 0.0, 0.0, &mut rng).unwrap();

        assert_eq!(history, vec![1, 5, 0]);
        assert!(graph
            .node_ids()
            .iter()
            .all(|id| graph.state(id).unwrap() == HealthState::Recovered));
    }

    #[test]
    fn zero_probability_never_transmits() {
        let mut graph = star(5);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let history = run_epidemic(&mut graph, &["hub"], 0.0, 3, 0.0, 0.0, &mut rng).unwrap();
        assert_eq!(history, vec![1, 0, 0]);
    }

    #[test]
    fn sample_sizes_are_rounded() {
        let ids: Vec<NodeId> = (0..10).map(|i| i.to_string()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert_eq!(draw_nodes(&mut rng, &ids, 0.25).len(), 3);
        assert_eq!(draw_nodes(&mut rng, &ids, 0.24).len(), 2);
        assert_eq!(draw_nodes(&mut rng, &ids, 1.0).len(), 10);
        assert!(draw_nodes(&mut rng, &ids, 0.0).is_empty());

        let drawn = draw_nodes(&mut rng, &ids, 0.5);
        let distinct: HashSet<&NodeId> = drawn.iter().collect();
        assert_eq!(distinct.len(), drawn.len());
    }

    #[test]
    fn full_shelter_blocks_transmission_but_not_seeding() {
        let mut graph = star(4);
        let engine = EpidemicEngine::new(EpidemicConfig {
            p_infect: 1.0,
            lifespan: 2,
            shelter_rate: 1.0,
            vaccination_rate: 0.0,
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let report = engine.run(&mut graph, &["hub"], &mut rng, &mut NoopObserver).unwrap();

        assert_eq!(report.sheltered.len(), 5);
        assert_eq!(report.infected_history(), vec![1, 0]);
        assert_eq!(report.final_states["hub"], HealthState::Recovered);
        assert_eq!(report.final_states["leaf0"], HealthState::Susceptible);
    }

    #[test]
    fn counts_cover_every_node_each_day() {
        let mut graph = star(6);
        let engine = EpidemicEngine::new(EpidemicConfig {
            p_infect: 0.5,
            lifespan: 4,
            shelter_rate: 0.2,
            vaccination_rate: 0.3,
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut observer = RecordingObserver::new();

        let report = engine.run(&mut graph, &["hub"], &mut rng, &mut observer).unwrap();

        assert_eq!(report.vaccinated.len(), 2);
        assert_eq!(report.sheltered.len(), 1);
        for (i, day) in report.days.iter().enumerate() {
            assert_eq!(day.day, i + 1);
            assert_eq!(
                day.susceptible + day.infected + day.recovered + day.vaccinated,
                7
            );
            assert_eq!(day.vaccinated, 2);
        }
        assert_eq!(
            observer.labels(),
            vec!["Epidemic Day 1", "Epidemic Day 2", "Epidemic Day 3", "Epidemic Day 4"]
        );
    }

    #[test]
    fn zero_lifespan_returns_empty_history() {
        let mut graph = star(2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let history = run_epidemic(&mut graph, &["hub"], 1.0, 0, 0.0, 0.0, &mut rng).unwrap();
        assert!(history.is_empty());
        assert_eq!(graph.state("hub").unwrap(), HealthState::Infected);
    }

    struct FailOnDay(usize);

    impl Observer<HealthState> for FailOnDay {
        fn observe(&mut self, label: &str, _: &Snapshot<HealthState>) -> anyhow::Result<()> {
            if label == format!("Epidemic Day {}", self.0) {
                anyhow::bail!("renderer gone");
            }
            Ok(())
        }
    }

    #[test]
    fn failing_observer_aborts_after_the_day_is_applied() {
        let mut graph = DiGraph::from_edges([("a", "b")]);
        let engine = EpidemicEngine::new(EpidemicConfig {
            p_infect: 1.0,
            lifespan: 5,
            shelter_rate: 0.0,
            vaccination_rate: 0.0,
        })
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let err = engine
            .run(&mut graph, &["a"], &mut rng, &mut FailOnDay(1))
            .unwrap_err();

        assert!(matches!(err, EngineError::Observer(_)));
        assert_eq!(err.to_string(), "renderer gone");
        // Day 1 transitions were applied before the observer ran.
        assert_eq!(graph.state("a").unwrap(), HealthState::Recovered);
        assert_eq!(graph.state("b").unwrap(), HealthState::Infected);
    }

    #[test]
    fn huge_lifespan_does_not_overflow_during_setup() {
        let mut graph = DiGraph::from_edges([("a", "b")]);
        let config = EpidemicConfig::new(1.0, i64::MAX, 0.0, 0.0).unwrap();
        let engine = EpidemicEngine::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        // Stop the run on day 2 so it terminates.
        let err = engine
            .run(&mut graph, &["a"], &mut rng, &mut FailOnDay(2))
            .unwrap_err();

        assert!(matches!(err, EngineError::Observer(_)));
        assert_eq!(graph.state("b").unwrap(), HealthState::Recovered);
    }

    #[test]
    fn repeated_initiator_is_seeded_once() {
        let mut graph = DiGraph::from_edges([("a", "b")]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let history = run_epidemic(&mut graph, &["a", "a"], 1.0, 2, 0.0, 0.0, &mut rng).unwrap();
        assert_eq!(history, vec![1, 1]);
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let mut graph = star(2);
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        assert!(matches!(
            run_epidemic(&mut graph, &["hub"], 1.0, -3, 0.0, 0.0, &mut rng),
            Err(EngineError::InvalidParameter { name: "lifespan", .. })
        ));
        assert!(matches!(
            run_epidemic(&mut graph, &["hub"], 1.0, 3, 0.0, 2.0, &mut rng),
            Err(EngineError::InvalidParameter { name: "vaccination_rate", .. })
        ));
        assert!(matches!(
            run_epidemic(&mut graph, &["nobody"], 1.0, 3, 0.0, 0.0, &mut rng),
            Err(EngineError::InvalidInitiator(id)) if id == "nobody"
        ));
    }
}
