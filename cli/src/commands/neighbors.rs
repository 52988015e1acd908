use std::process::ExitCode;

use anyhow::{bail, Result};
use precinct_adjacency::io::read_adjacency;

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::NeighborsArgs) -> Result<ExitCode> {
    let map = read_adjacency(&args.adjacency)?;
    let Some(neighbors) = map.find_key(&args.id).and_then(|id| map.neighbors(id)) else {
        bail!("precinct {} is not in {}", args.id, args.adjacency.display());
    };

    for neighbor in neighbors {
        println!("{neighbor}");
    }
    Ok(ExitCode::SUCCESS)
}
