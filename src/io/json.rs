use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::graph::AdjacencyMap;

use super::{finalize_write, open_for_write, DeserializationError, SerializationError};

/// Encode an adjacency map as JSON bytes.
pub fn write_adjacency_bytes(map: &AdjacencyMap) -> Result<Vec<u8>, SerializationError> {
    Ok(serde_json::to_vec(map)?)
}

/// Atomically write an adjacency map to `path` as JSON.
///
/// The map is only borrowed: on failure the caller can retry with another path.
pub fn write_adjacency(path: &Path, map: &AdjacencyMap, force: bool) -> Result<(), SerializationError> {
    let pending = open_for_write(path, force)?;
    let mut writer = BufWriter::new(pending);
    serde_json::to_writer(&mut writer, map)?;
    writer.flush().map_err(|source| SerializationError::Io { path: path.to_path_buf(), source })?;

    let pending = writer.into_inner()
        .map_err(|err| SerializationError::Io { path: path.to_path_buf(), source: err.into_error() })?;
    finalize_write(pending)?;

    tracing::info!(path = %path.display(), precincts = map.len(), edges = map.edge_count(), "wrote adjacency map");
    Ok(())
}

/// Decode an adjacency map from JSON bytes.
pub fn read_adjacency_bytes(bytes: &[u8]) -> Result<AdjacencyMap, DeserializationError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read an adjacency map written by [`write_adjacency`].
pub fn read_adjacency(path: &Path) -> Result<AdjacencyMap, DeserializationError> {
    let file = File::open(path)
        .map_err(|source| DeserializationError::Io { path: path.to_path_buf(), source })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
