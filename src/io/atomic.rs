//! Crash-safe small-file writes.
//!
//! Contents are staged in a temporary sibling file, synced, and renamed over
//! the destination. Readers observe either the previous contents or the new
//! ones, never a truncated mix.

use std::io::Write;
use std::path::Path;

use atomic_write_file::AtomicWriteFile;

use crate::error::{ActivityError, Result};

/// Replace the whole contents of `path` with `bytes`.
///
/// The parent directory must already exist; a missing directory is reported as
/// an I/O error rather than created.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut staged = AtomicWriteFile::options()
        .open(path)
        .map_err(|err| ActivityError::io(path, err))?;
    if let Err(err) = staged.write_all(bytes).and_then(|()| staged.flush()) {
        // Dropping would discard as well; do it explicitly so the temp file goes now.
        let _ = staged.discard();
        return Err(ActivityError::io(path, err));
    }
    staged.commit().map_err(|err| ActivityError::io(path, err))?;
    tracing::trace!(
        activity.path = %path.display(),
        activity.bytes = bytes.len(),
        "atomic write committed"
    );
    Ok(())
}

/// Read a file fully, mapping `NotFound` to `None`.
pub(crate) fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs_err::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ActivityError::io(path, err)),
    }
}
