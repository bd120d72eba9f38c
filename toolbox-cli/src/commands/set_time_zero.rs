//! Set-time-zero command implementation

use std::path::PathBuf;

use anyhow::Result;
use toolbox_fs::{reset_file_timestamp, reset_tree_timestamps};

pub fn execute(recursive: bool, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if recursive {
            let count = reset_tree_timestamps(path)?;
            tracing::info!(path = %path.display(), entries = count, "Reset timestamps");
        } else {
            reset_file_timestamp(path)?;
            tracing::info!(path = %path.display(), "Reset timestamps");
        }
    }

    Ok(())
}
