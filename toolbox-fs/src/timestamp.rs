//! Epoch timestamps

use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::{lutimes, utimes};
use nix::sys::time::TimeVal;
use toolbox_core::{Error, Result};
use walkdir::WalkDir;

fn epoch() -> TimeVal {
    TimeVal::new(0, 0)
}

/// Set access and modification time of `path` to the Unix epoch
///
/// Symlinks are followed, so the target is updated.
///
/// # Errors
/// Returns [`Error::OperationFailed`] naming `path` if utimes(2) fails, for
/// example `ENOENT` or `EACCES`.
pub fn reset_file_timestamp(path: &Path) -> Result<()> {
    utimes(path, &epoch(), &epoch())
        .map_err(|errno| Error::operation_failed("utimes", path.display().to_string(), errno))?;

    tracing::trace!(path = %path.display(), "Timestamps reset");
    Ok(())
}

/// Reset every entry below `root`, and `root` itself, to the epoch
///
/// Symlinks are not followed: the link itself is updated. Directories are
/// reset after their contents. Returns the number of entries touched and
/// stops at the first failure.
///
/// # Errors
/// Returns [`Error::OperationFailed`] naming the offending path, whether it
/// could not be listed or could not be updated.
pub fn reset_tree_timestamps(root: &Path) -> Result<u64> {
    tracing::debug!(root = %root.display(), "Resetting tree timestamps");

    let mut count = 0;
    for entry in WalkDir::new(root).contents_first(true).follow_links(false) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        let path = entry.path();

        lutimes(path, &epoch(), &epoch()).map_err(|errno| {
            Error::operation_failed("lutimes", path.display().to_string(), errno)
        })?;
        count += 1;
    }

    tracing::debug!(root = %root.display(), entries = count, "Tree timestamps reset");
    Ok(count)
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).display().to_string();
    match err.io_error().and_then(std::io::Error::raw_os_error) {
        Some(code) => Error::operation_failed("walk", path, Errno::from_raw(code)),
        None => Error::Io(err.into()),
    }
}
