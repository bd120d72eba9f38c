//! Filesystem helpers for reproducible trees
//!
//! Resetting timestamps to the epoch keeps generated images and archives
//! byte-for-byte stable across builds.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod timestamp;

pub use timestamp::{reset_file_timestamp, reset_tree_timestamps};
pub use toolbox_core::{Error, Result};
