use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{BuildConfig, ConfigError};
use crate::graph::{CancelToken, GraphError, ProgressObserver, ScanReport};
use crate::io::{write_adjacency, SerializationError};
use crate::precinct::{read_collection_file, ParseError};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Where a scan's map is written: the configured output for complete scans,
/// `<output>.partial` otherwise.
pub fn output_path_for(report: &ScanReport, output: &Path) -> PathBuf {
    if report.is_complete() {
        return output.to_path_buf();
    }
    let mut name = output.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

/// Read the configured input collection and scan it. Nothing is written.
pub fn build_adjacency(
    config: &BuildConfig,
    observer: &dyn ProgressObserver,
    cancel: &CancelToken,
) -> Result<ScanReport, BuildError> {
    config.validate()?;
    let (input, _) = config.paths()?;

    let precincts = read_collection_file(input, &config.id_field)?;
    let builder = config.builder();
    tracing::info!(
        input = %input.display(),
        precincts = precincts.len(),
        closeness = %builder.closeness(),
        workers = builder.worker_count(),
        "building adjacency map"
    );

    Ok(builder.build(&precincts, observer, cancel)?)
}

/// Write a finished report to [`output_path_for`] and return the path used.
pub fn write_report(report: &ScanReport, output: &Path, force: bool) -> Result<PathBuf, SerializationError> {
    let path = output_path_for(report, output);
    write_adjacency(&path, &report.map, force)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::graph::{AdjacencyMap, CancelReason, ScanStatus};

    fn report(status: ScanStatus) -> ScanReport {
        ScanReport {
            map: AdjacencyMap::new([]).unwrap(),
            status,
            evaluations: 0,
            predicate_failures: 0,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn partial_reports_go_to_a_suffixed_path() {
        let complete = report(ScanStatus::Complete);
        let partial = report(ScanStatus::Partial {
            reason: CancelReason::Timeout,
            last_completed: None,
            rows_completed: 0,
        });

        assert_eq!(output_path_for(&complete, Path::new("out/adj.json")), PathBuf::from("out/adj.json"));
        assert_eq!(output_path_for(&partial, Path::new("out/adj.json")), PathBuf::from("out/adj.json.partial"));
    }

    #[test]
    fn missing_input_path_is_a_config_error() {
        let result = build_adjacency(&BuildConfig::default(), &crate::graph::NoProgress, &CancelToken::new());
        assert!(matches!(result, Err(BuildError::Config(ConfigError::MissingPath("input_path")))));
    }
}
