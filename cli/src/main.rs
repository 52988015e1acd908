mod cli;
mod commands;

use std::process::ExitCode;

use cli::{Cli, Commands};
use commands::{build, neighbors, validate};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<ExitCode> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Build(args) => build::run(&cli, args),
        Commands::Neighbors(args) => neighbors::run(&cli, args),
        Commands::Validate(args) => validate::run(&cli, args),
    }
}

fn main() -> anyhow::Result<ExitCode> { run() }
