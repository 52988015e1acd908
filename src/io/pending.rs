use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::SerializationError;

/// Write-then-rename wrapper for atomic outputs.
///
/// Bytes go to a temporary file next to the target; [`finalize_write`] renames it into
/// place. Dropping a `PendingWrite` without finalizing deletes the temporary file.
pub struct PendingWrite {
    target: PathBuf,
    tmp: NamedTempFile,
}

impl PendingWrite {
    #[inline] pub fn target(&self) -> &Path { &self.target }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SerializationError + '_ {
    move |source| SerializationError::Io { path: path.to_path_buf(), source }
}

/// Prepare an atomic write to `target`, creating parent directories as needed.
pub fn open_for_write(target: &Path, force: bool) -> Result<PendingWrite, SerializationError> {
    if target == Path::new("-") {
        return Err(SerializationError::Stdout);
    }
    if !force && target.exists() {
        return Err(SerializationError::Exists(target.to_path_buf()));
    }

    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_error(parent))?;
    let tmp = NamedTempFile::new_in(parent).map_err(io_error(parent))?;

    Ok(PendingWrite { target: target.to_path_buf(), tmp })
}

impl Write for PendingWrite {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> { self.tmp.write(buf) }
    fn flush(&mut self) -> io::Result<()> { self.tmp.flush() }
}

/// Flush, fsync and rename the pending file onto its target.
pub fn finalize_write(mut pending: PendingWrite) -> Result<(), SerializationError> {
    pending.tmp.flush().map_err(io_error(&pending.target))?;
    pending.tmp.as_file().sync_all().map_err(io_error(&pending.target))?;

    let PendingWrite { target, tmp } = pending;
    tmp.persist(&target).map_err(|err| SerializationError::Io { path: target.clone(), source: err.error })?;

    // Best-effort directory fsync so the rename itself is durable.
    if let Some(dir) = target.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        let _ = File::open(dir).and_then(|f| f.sync_all());
    }
    Ok(())
}
