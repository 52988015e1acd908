use std::path::PathBuf;

use precinct_adjacency::{BuildConfig, Candidates, Strategy};

/// Precinct adjacency CLI
#[derive(clap::Parser, Debug)]
#[command(name = "precinct-adjacency", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build an adjacency map from a GeoJSON FeatureCollection (forbids stdout)
    Build(BuildArgs),

    /// Print the neighbors of one precinct in an adjacency file
    Neighbors(NeighborsArgs),

    /// Check an adjacency file for asymmetric, self or duplicate links
    Validate(ValidateArgs),
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum StrategyArg {
    VertexProximity,
    Intersection,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::VertexProximity => Strategy::VertexProximity,
            StrategyArg::Intersection => Strategy::Intersection,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum CandidatesArg {
    AllPairs,
    Envelope,
}

impl From<CandidatesArg> for Candidates {
    fn from(arg: CandidatesArg) -> Self {
        match arg {
            CandidatesArg::AllPairs => Candidates::AllPairs,
            CandidatesArg::Envelope => Candidates::Envelope,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Input GeoJSON FeatureCollection
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output adjacency file; partial results go to "<output>.partial"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// TOML config file; flags given here override it
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Closeness predicate
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Squared vertex distance threshold for vertex-proximity
    #[arg(short, long)]
    pub epsilon: Option<f64>,

    /// Worker threads, defaults to available parallelism
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Stop after this many seconds and write a partial result
    #[arg(short, long)]
    pub timeout: Option<f64>,

    /// Feature property holding the precinct identifier
    #[arg(long)]
    pub id_field: Option<String>,

    /// Pair enumeration
    #[arg(long, value_enum)]
    pub candidates: Option<CandidatesArg>,

    /// Stop once more than this many predicate evaluations have failed
    #[arg(long)]
    pub max_predicate_failures: Option<usize>,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    pub force: bool,

    /// Log progress instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl BuildArgs {
    /// Overlay flags onto a config loaded from file (or the defaults).
    pub fn apply(&self, config: &mut BuildConfig) -> anyhow::Result<()> {
        if let Some(input) = &self.input { config.input_path = Some(input.clone()) }
        if let Some(output) = &self.output { config.output_path = Some(output.clone()) }
        if let Some(strategy) = self.strategy { config.strategy = strategy.into() }
        if let Some(epsilon) = self.epsilon { config.epsilon = epsilon }
        if let Some(workers) = self.workers { config.worker_count = Some(workers) }
        if let Some(secs) = self.timeout {
            config.cancellation_timeout = Some(std::time::Duration::try_from_secs_f64(secs)?);
        }
        if let Some(id_field) = &self.id_field { config.id_field = id_field.clone() }
        if let Some(candidates) = self.candidates { config.candidates = candidates.into() }
        if let Some(max) = self.max_predicate_failures { config.max_predicate_failures = Some(max) }
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct NeighborsArgs {
    /// Adjacency file written by `build`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub adjacency: PathBuf,

    /// Precinct identifier
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Adjacency file written by `build`
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub adjacency: PathBuf,

    /// Also check that keys match the identifiers in this GeoJSON collection
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Feature property holding the precinct identifier
    #[arg(long, default_value = precinct_adjacency::config::DEFAULT_ID_FIELD)]
    pub id_field: String,
}
