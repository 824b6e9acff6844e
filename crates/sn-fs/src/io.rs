//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;
use tracing::debug;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial
/// file; an advisory lock guards the temp file against concurrent tools.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native = path.to_native();

    if let Some(parent) = native.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native.clone(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native.clone(),
    })?;

    fs::rename(&temp_path, &native).map_err(|e| Error::io(&native, e))?;
    debug!(path = %path, bytes = content.len(), "wrote file atomically");

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native = path.to_native();
    fs::read_to_string(&native).map_err(|e| Error::io(&native, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Remove a directory tree if it exists.
///
/// Missing directories are not an error; cleanup must be retryable.
pub fn remove_dir_all(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    if !native.exists() {
        debug!(path = %path, "directory already absent, nothing to remove");
        return Ok(());
    }
    debug!(path = %path, "removing directory tree");
    fs::remove_dir_all(&native).map_err(|e| Error::io(&native, e))
}
