use std::process::ExitCode;

use anyhow::Result;
use precinct_adjacency::{io::read_adjacency, precinct::read_collection_file, PrecinctId};

pub fn run(_cli: &crate::cli::Cli, args: &crate::cli::ValidateArgs) -> Result<ExitCode> {
    let map = read_adjacency(&args.adjacency)?;

    let expected: Option<Vec<PrecinctId>> = match &args.input {
        Some(input) => Some(
            read_collection_file(input, &args.id_field)?
                .iter()
                .map(|precinct| precinct.id().clone())
                .collect(),
        ),
        None => None,
    };

    let violations = map.validate(expected.as_deref());
    for violation in &violations {
        println!("{violation}");
    }

    eprintln!(
        "[validate] {} precincts, {} edges, {} isolated, {} violations",
        map.len(),
        map.edge_count(),
        map.isolated().count(),
        violations.len()
    );

    Ok(if violations.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
