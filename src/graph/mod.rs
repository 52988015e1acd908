mod adjacency;
mod builder;
mod cancel;
mod candidates;
mod progress;

use thiserror::Error;

use crate::precinct::PrecinctId;

pub use adjacency::{AdjacencyMap, Violation};
pub use builder::{AdjacencyBuilder, ScanReport, ScanStatus};
pub use cancel::{CancelReason, CancelToken};
pub use candidates::Candidates;
pub use progress::{LogProgress, NoProgress, Progress, ProgressObserver};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate precinct identifier {0}")]
    DuplicateIdentifier(PrecinctId),
    #[error("unknown precinct identifier {0}")]
    UnknownIdentifier(PrecinctId),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
