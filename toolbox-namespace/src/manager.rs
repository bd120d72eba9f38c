//! Namespace unsharing and inspection

use std::fs;
use std::path::{Path, PathBuf};

use nix::sched::unshare;
use serde::{Deserialize, Serialize};
use toolbox_core::{Error, Result};

use crate::config::{Namespace, NamespaceFlags};

/// Detach the calling thread from the selected namespaces
///
/// All requested categories are passed to a single unshare(2) call, so either
/// every one of them is replaced or none is. The change cannot be undone.
///
/// A PID namespace only applies to children forked afterwards; the caller
/// itself keeps its PID. An empty set is forwarded to the kernel as-is and
/// succeeds without effect.
///
/// # Errors
/// Returns [`Error::OperationFailed`] carrying the attempted flag word when
/// the kernel refuses, typically `EPERM` without `CAP_SYS_ADMIN` or `EINVAL`
/// when a category is not compiled into the running kernel.
pub fn unshare_namespaces(flags: NamespaceFlags) -> Result<()> {
    let clone_flags = flags.to_clone_flags();

    tracing::debug!(namespaces = %flags, "Unsharing namespaces");

    unshare(clone_flags).map_err(|errno| {
        Error::operation_failed("unshare", flags.clone_flags_description(), errno)
    })?;

    tracing::debug!(namespaces = %flags, "Namespaces unshared");
    Ok(())
}

/// Namespace identifiers of a task, as reported by `/proc/<pid>/ns`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceIds {
    /// Mount namespace ID
    pub mnt: Option<String>,
    /// PID namespace the task itself lives in
    pub pid: Option<String>,
    /// PID namespace its future children will be created in
    pub pid_for_children: Option<String>,
}

impl NamespaceIds {
    /// Namespaces of the calling thread
    ///
    /// Reads `/proc/thread-self/ns`, which tracks unshare(2) on the current
    /// thread even when other threads of the process stay behind.
    ///
    /// # Errors
    /// Returns error if procfs is not mounted
    pub fn current() -> Result<Self> {
        Self::from_dir(Path::new("/proc/thread-self/ns"))
    }

    /// Namespaces of process `pid`
    ///
    /// # Errors
    /// Returns error if the process does not exist
    pub fn for_pid(pid: u32) -> Result<Self> {
        Self::from_dir(&PathBuf::from(format!("/proc/{pid}/ns")))
    }

    /// Read namespace links from an `ns` directory
    ///
    /// Links missing from the directory (older kernels lack
    /// `pid_for_children`) are reported as `None`.
    ///
    /// # Errors
    /// Returns error if `dir` itself cannot be read
    pub fn from_dir(dir: &Path) -> Result<Self> {
        fs::metadata(dir)?;

        let read_ns = |name: &str| -> Option<String> {
            fs::read_link(dir.join(name))
                .map(|p| p.to_string_lossy().into_owned())
                .ok()
        };

        Ok(Self {
            mnt: read_ns("mnt"),
            pid: read_ns("pid"),
            pid_for_children: read_ns("pid_for_children"),
        })
    }

    /// Identifier that changes when `ns` is unshared by this task
    #[must_use]
    pub fn get(&self, ns: Namespace) -> Option<&str> {
        match ns {
            Namespace::Mount => self.mnt.as_deref(),
            Namespace::Pid => self.pid_for_children.as_deref(),
        }
    }

    /// Check for a PID namespace that has been unshared but has no process yet
    ///
    /// The kernel only exposes `pid_for_children` once the first child is
    /// forked into the new namespace, so the link is unreadable while `pid`
    /// still is.
    #[must_use]
    pub const fn pid_namespace_pending(&self) -> bool {
        self.pid.is_some() && self.pid_for_children.is_none()
    }

    /// Check that every category in `flags` differs from `other`
    ///
    /// A category whose identifier is unknown on either side counts as not
    /// differing, except for a pending PID namespace on `self` against a
    /// known one on `other`. An empty set never differs.
    #[must_use]
    pub fn differs_from(&self, other: &Self, flags: NamespaceFlags) -> bool {
        if flags.is_empty() {
            return false;
        }

        flags.iter().all(|ns| match (self.get(ns), other.get(ns)) {
            (Some(a), Some(b)) => a != b,
            (None, Some(_)) => ns == Namespace::Pid && self.pid_namespace_pending(),
            _ => false,
        })
    }
}

impl std::fmt::Display for NamespaceIds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Namespace Info:")?;
        if let Some(ref mnt) = self.mnt {
            writeln!(f, "  MNT:              {mnt}")?;
        }
        if let Some(ref pid) = self.pid {
            writeln!(f, "  PID:              {pid}")?;
        }
        if let Some(ref pid) = self.pid_for_children {
            writeln!(f, "  PID_FOR_CHILDREN: {pid}")?;
        }
        Ok(())
    }
}
