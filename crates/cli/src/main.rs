//! `netspread` CLI entry-point.
//!
//! Available sub-commands:
//! - `cascade` — run a threshold cascade from a set of initiators.
//! - `covid`   — run the SIR epidemic with vaccination and sheltering.
//! - `inspect` — load a graph file and print its size.
//!
//! Logging goes through `tracing`; set `RUST_LOG` to adjust verbosity.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{
    CascadeConfig, CascadeEngine, EpidemicConfig, EpidemicEngine, NoopObserver, Observer,
    TracingObserver,
};
use graph::{load_graph, DiffusionGraph, HealthState};

#[derive(Parser)]
#[command(
    name = "netspread",
    about = "Simulate cascades and epidemics on directed graphs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a threshold cascade to its fixpoint.
    Cascade {
        /// Path to the graph file (.gml or .json).
        graph_file: PathBuf,
        /// Comma-separated list of initiator node ids.
        #[arg(long)]
        initiator: String,
        /// Fraction of active predecessors needed to activate (0-1).
        #[arg(long)]
        threshold: f64,
        /// Log every round.
        #[arg(long)]
        interactive: bool,
        /// Write the final outcome as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the SIR epidemic for a fixed number of days.
    #[command(alias = "epidemic")]
    Covid {
        /// Path to the graph file (.gml or .json).
        graph_file: PathBuf,
        /// Comma-separated list of initiator node ids.
        #[arg(long)]
        initiator: String,
        /// Per-edge infection probability (0-1).
        #[arg(long)]
        probability_of_infection: f64,
        /// Number of days to simulate.
        #[arg(long, allow_negative_numbers = true)]
        lifespan: i64,
        /// Sheltering rate (0-1).
        #[arg(long)]
        shelter: f64,
        /// Vaccination rate (0-1).
        #[arg(long)]
        vaccinations: f64,
        /// Random seed for reproducible runs. When omitted, a random seed is used.
        #[arg(long, env = "NETSPREAD_SEED")]
        seed: Option<u64>,
        /// Log every day.
        #[arg(long)]
        interactive: bool,
        /// Write the daily report as JSON.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print node and edge counts of a graph file.
    Inspect {
        /// Path to the graph file (.gml or .json).
        graph_file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,engine=info,graph=info,netspread=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Cascade { graph_file, initiator, threshold, interactive, output } => {
            let mut graph = load(&graph_file)?;
            let initiators = parse_initiators(&initiator);

            let engine = CascadeEngine::new(CascadeConfig { threshold })?;
            let (mut tracing_observer, mut noop) = (TracingObserver, NoopObserver);
            let observer: &mut dyn Observer<bool> = if interactive {
                &mut tracing_observer
            } else {
                &mut noop
            };
            let outcome = engine.run(&mut graph, &initiators, observer)?;

            println!("Cascade settled after {} round(s)", outcome.rounds);
            for id in graph.node_ids() {
                let mark = if outcome.active[id] { "active" } else { "inactive" };
                println!("  {id}: {mark}");
            }
            println!(
                "{}/{} nodes active",
                outcome.active_nodes().len(),
                graph.node_count()
            );

            if let Some(path) = output {
                write_json(&path, &outcome)?;
            }
        }

        Command::Covid {
            graph_file,
            initiator,
            probability_of_infection,
            lifespan,
            shelter,
            vaccinations,
            seed,
            interactive,
            output,
        } => {
            let mut graph = load(&graph_file)?;
            let initiators = parse_initiators(&initiator);

            let config = EpidemicConfig::new(probability_of_infection, lifespan, shelter, vaccinations)?;
            let engine = EpidemicEngine::new(config)?;

            let seed = seed.unwrap_or_else(rand::random);
            info!(seed, "seeding random generator");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let (mut tracing_observer, mut noop) = (TracingObserver, NoopObserver);
            let observer: &mut dyn Observer<HealthState> = if interactive {
                &mut tracing_observer
            } else {
                &mut noop
            };
            let report = engine.run(&mut graph, &initiators, &mut rng, observer)?;

            println!("day  infected");
            for day in &report.days {
                println!("{:>3}  {}", day.day, day.infected);
            }
            if let Some(peak) = report.peak() {
                println!("peak: {} infected on day {}", peak.infected, peak.day);
            }

            if let Some(path) = output {
                write_json(&path, &report)?;
            }
        }

        Command::Inspect { graph_file } => {
            let graph = load(&graph_file)?;
            println!(
                "{}: {} nodes, {} edges",
                graph_file.display(),
                graph.node_count(),
                graph.edge_count()
            );
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<graph::DiGraph> {
    load_graph(path).with_context(|| format!("cannot load graph {}", path.display()))
}

/// Split a comma-separated id list, dropping empty entries.
fn parse_initiators(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
