//! File IO for adjacency maps.
//!
//! - `pending` - write-then-rename wrapper so a failed write never leaves a truncated file
//! - `json` - JSON adjacency files: `{ id: [neighbor, ...] }`
//!
//! Input geometry collections are read by `precinct::read_collection_file`.

mod json;
mod pending;

use std::path::PathBuf;

use thiserror::Error;

pub use json::{read_adjacency, read_adjacency_bytes, write_adjacency, write_adjacency_bytes};
pub use pending::{finalize_write, open_for_write, PendingWrite};

/// Failure writing an adjacency file.
///
/// Writers only borrow the map, so after this error the caller still holds the full
/// result and can retry elsewhere without rescanning.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("refusing to write to stdout; provide a file path")]
    Stdout,
    #[error("refusing to overwrite existing file {} (use --force)", .0.display())]
    Exists(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to encode adjacency map: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure reading an adjacency file back.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("invalid adjacency file: {0}")]
    Decode(#[from] serde_json::Error),
}
