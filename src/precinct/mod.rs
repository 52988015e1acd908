mod geometry;
mod id;
mod parse;

use std::path::PathBuf;

use thiserror::Error;

pub use geometry::PrecinctGeometry;
pub use id::PrecinctId;
pub use parse::{read_collection, read_collection_file};

/// Why a single feature could not become a `PrecinctGeometry`.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("unsupported geometry kind {0:?} (expected Polygon or MultiPolygon)")]
    UnsupportedGeometryKind(String),
    #[error("feature has no geometry")]
    MissingGeometry,
    #[error("missing identifier property {field:?} (must be an integer or a string)")]
    MissingIdentifier { field: String },
    #[error("identifier property {field:?} is {value}, expected an integer or a string")]
    InvalidIdentifier { field: String, value: String },
    #[error("polygon has no rings, or an empty ring")]
    EmptyGeometry,
    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(&'static str),
}

/// Malformed input collection. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input is not a GeoJSON FeatureCollection (no `features` array)")]
    NotACollection,
    #[error("feature {index}: {source}")]
    Feature { index: usize, #[source] source: FeatureError },
    #[error("duplicate precinct identifier {id} (features {first} and {second})")]
    DuplicateIdentifier { id: PrecinctId, first: usize, second: usize },
}
