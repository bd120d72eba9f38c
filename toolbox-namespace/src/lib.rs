//! Namespace isolation primitives
//!
//! The building blocks a process-isolation bootstrap needs before it builds
//! its own filesystem view:
//! - [`unshare_namespaces`] - leave the mount and/or PID namespace
//! - [`remount_root_private`] - stop mount propagation to and from the parent
//!
//! Call them in that order, before spawning threads or children that rely on
//! the new namespaces. Any error means the isolation guarantee does not hold.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod config;
pub mod manager;
pub mod mount;

pub use config::{Namespace, NamespaceFlags};
pub use manager::{unshare_namespaces, NamespaceIds};
pub use mount::{
    parse_mountinfo, read_mountinfo, read_mountinfo_from, remount_root_private, root_propagation,
    root_propagation_in, set_propagation, MountInfo, Propagation,
};
pub use toolbox_core::{Error, Result};
