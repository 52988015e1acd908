#![doc = "Precinct adjacency graphs from polygon collections"]
pub mod config;
pub mod graph;
pub mod io;
pub mod precinct;
pub mod predicate;
mod pipeline;

#[doc(inline)]
pub use config::{BuildConfig, ConfigError, Strategy};

#[doc(inline)]
pub use graph::{
    AdjacencyBuilder, AdjacencyMap, CancelReason, CancelToken, Candidates, GraphError,
    Progress, ProgressObserver, ScanReport, ScanStatus,
};

#[doc(inline)]
pub use precinct::{PrecinctGeometry, PrecinctId};

#[doc(inline)]
pub use predicate::{Closeness, PredicateError};

#[doc(inline)]
pub use pipeline::{build_adjacency, output_path_for, write_report, BuildError};
