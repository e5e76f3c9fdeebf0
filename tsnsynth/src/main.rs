//! tsnsynth
//!
//! Generates a preset TSN scenario and writes it as JSON.
//!
//! - `industrial` builds a line, ring or backbone based plant network
//! - `automotive` builds an in-vehicle zonal network
//! - the optional guarantee tables are applied to every link before export

use std::{fs, path::PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tsnsynth::{
    Context, PerPriority, ScenarioOptions, ScenarioSize, Topology, automotive, export, industrial,
};
use tsnsynth_core::defaults::DEFAULT_SEED;

/// TSN topology and stream set generator.
#[derive(Parser, Debug)]
#[command(name = "tsnsynth", about = "Synthesize TSN topologies with their streams")]
struct Cli {
    #[command(subcommand)]
    scenario: Scenario,

    /// Seed of the random generator.
    #[arg(long, global = true, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Output file, standard output if omitted.
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Per priority maximum delay of every link, in ns (`p0,...,p7`).
    #[arg(long, global = true)]
    max_delays: Option<PerPriority<f64>>,

    /// Per priority maximum idle slope of every link (`p0,...,p7`).
    #[arg(long, global = true)]
    idle_slopes: Option<PerPriority<f64>>,

    /// Per priority maximum queue size of every link (`p0,...,p7`).
    #[arg(long, global = true)]
    queue_sizes: Option<PerPriority<f64>>,

    /// JSON file overriding the scenario options.
    #[arg(long, global = true)]
    options: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// Industrial plant network.
    Industrial {
        #[arg(long, default_value_t = ScenarioSize::Small)]
        size: ScenarioSize,
    },
    /// In-vehicle network.
    Automotive,
}

fn load_options(cli: &Cli) -> Result<ScenarioOptions> {
    let Some(path) = &cli.options else {
        return Ok(ScenarioOptions::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid scenario options in {}", path.display()))
}

fn apply_tables(cli: &Cli, topology: &mut Topology) {
    if let Some(max_delays) = cli.max_delays {
        topology.update_guarantees_all_links(max_delays);
    }
    if let Some(idle_slopes) = cli.idle_slopes {
        topology.update_idle_slopes_all_links(idle_slopes);
    }
    if let Some(queue_sizes) = cli.queue_sizes {
        topology.update_queue_sizes_all_links(queue_sizes);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(seed = cli.seed, scenario = ?cli.scenario, "tsnsynth starting");

    let options = load_options(&cli)?;
    let mut context = Context::with_seed(cli.seed);
    let mut topology = match cli.scenario {
        Scenario::Industrial { size } => industrial(size, &options, &mut context)?,
        Scenario::Automotive => automotive(&options, &mut context)?,
    };
    apply_tables(&cli, &mut topology);

    match &cli.output {
        Some(path) => export::to_json(&topology, path)?,
        None => println!("{}", export::to_json_string(&topology)?),
    }

    info!(stats = %topology.stats(), "done");
    Ok(())
}
