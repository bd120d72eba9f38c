//! Mount propagation control
//!
//! After unsharing a mount namespace the copied mounts still belong to the
//! same peer groups as the originals, so a mount made on one side can show up
//! on the other. Remounting `/` as recursively private cuts those links.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use nix::mount::{mount, MsFlags};
use serde::{Deserialize, Serialize};
use toolbox_core::{Error, Result};

/// Propagation type of a mount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Propagation {
    /// Events propagate to and from peers
    Shared,
    /// Events are received from the master but not sent back
    Slave,
    /// No propagation in either direction
    Private,
    /// Private, and the mount may not be bind mounted
    Unbindable,
}

impl Propagation {
    /// Flag passed to mount(2) to select this propagation type
    #[must_use]
    pub const fn ms_flag(self) -> MsFlags {
        match self {
            Self::Shared => MsFlags::MS_SHARED,
            Self::Slave => MsFlags::MS_SLAVE,
            Self::Private => MsFlags::MS_PRIVATE,
            Self::Unbindable => MsFlags::MS_UNBINDABLE,
        }
    }

    const fn ms_flag_name(self) -> &'static str {
        match self {
            Self::Shared => "MS_SHARED",
            Self::Slave => "MS_SLAVE",
            Self::Private => "MS_PRIVATE",
            Self::Unbindable => "MS_UNBINDABLE",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shared => "shared",
            Self::Slave => "slave",
            Self::Private => "private",
            Self::Unbindable => "unbindable",
        };
        f.write_str(name)
    }
}

/// Change the propagation type of the mount at `target`
///
/// With `recursive` set the change also applies to every mount below it.
///
/// # Errors
/// Returns [`Error::OperationFailed`] if mount(2) fails, e.g. `EPERM` without
/// `CAP_SYS_ADMIN` or `EINVAL` when `target` is not a mount point.
pub fn set_propagation(target: &Path, propagation: Propagation, recursive: bool) -> Result<()> {
    let mut flags = propagation.ms_flag();
    let mut description = propagation.ms_flag_name().to_string();
    if recursive {
        flags |= MsFlags::MS_REC;
        description.push_str(" | MS_REC");
    }

    tracing::debug!(
        target = %target.display(),
        propagation = %propagation,
        recursive,
        "Changing mount propagation"
    );

    mount(None::<&str>, target, Some("none"), flags, None::<&str>).map_err(|errno| {
        Error::operation_failed(
            "mount",
            format!("{}, {description}", target.display()),
            errno,
        )
    })?;

    tracing::debug!(
        target = %target.display(),
        propagation = %propagation,
        "Mount propagation changed"
    );
    Ok(())
}

/// Make `/` and every mount below it private
///
/// Meant to run right after unsharing a mount namespace. Called from the
/// original namespace it rewrites propagation for every process sharing it.
/// Applying it to an already private tree succeeds again.
///
/// # Errors
/// Returns [`Error::OperationFailed`] if mount(2) fails
pub fn remount_root_private() -> Result<()> {
    set_propagation(Path::new("/"), Propagation::Private, true)
}

/// One line of `/proc/<pid>/mountinfo`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInfo {
    /// Unique mount ID
    pub mount_id: u32,
    /// ID of the parent mount
    pub parent_id: u32,
    /// Root of the mount within its filesystem
    pub root: PathBuf,
    /// Mount point relative to the task's root
    pub mount_point: PathBuf,
    /// Optional fields such as `shared:1` or `master:2`
    pub optional_fields: Vec<String>,
    /// Filesystem type
    pub fs_type: String,
    /// Mount source
    pub source: String,
}

impl MountInfo {
    /// Parse a single mountinfo line
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if the line is truncated or malformed
    pub fn parse_line(line: &str) -> Result<Self> {
        let malformed = |what: &str| Error::parse(format!("mountinfo: {what} in {line:?}"));

        let (head, tail) = line
            .split_once(" - ")
            .ok_or_else(|| malformed("missing separator"))?;

        let mut fields = head.split_ascii_whitespace();
        let mount_id = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| malformed("bad mount id"))?;
        let parent_id = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| malformed("bad parent id"))?;
        let _dev = fields.next().ok_or_else(|| malformed("missing device"))?;
        let root = fields.next().ok_or_else(|| malformed("missing root"))?;
        let mount_point = fields
            .next()
            .ok_or_else(|| malformed("missing mount point"))?;
        let _options = fields
            .next()
            .ok_or_else(|| malformed("missing mount options"))?;
        let optional_fields = fields.map(str::to_string).collect();

        let mut tail = tail.split_ascii_whitespace();
        let fs_type = tail
            .next()
            .ok_or_else(|| malformed("missing filesystem type"))?;
        let source = tail.next().unwrap_or_default();

        Ok(Self {
            mount_id,
            parent_id,
            root: PathBuf::from(unescape(root)),
            mount_point: PathBuf::from(unescape(mount_point)),
            optional_fields,
            fs_type: unescape(fs_type),
            source: unescape(source),
        })
    }

    /// Propagation type derived from the optional fields
    ///
    /// A mount that is both shared and a slave reports [`Propagation::Shared`].
    #[must_use]
    pub fn propagation(&self) -> Propagation {
        let has = |prefix: &str| self.optional_fields.iter().any(|f| f.starts_with(prefix));

        if has("shared:") {
            Propagation::Shared
        } else if has("master:") {
            Propagation::Slave
        } else if has("unbindable") {
            Propagation::Unbindable
        } else {
            Propagation::Private
        }
    }
}

/// Parse the full content of a mountinfo file
///
/// # Errors
/// Returns [`Error::Parse`] on the first malformed line
pub fn parse_mountinfo(content: &str) -> Result<Vec<MountInfo>> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(MountInfo::parse_line)
        .collect()
}

/// Read a mountinfo file such as `/proc/self/mountinfo`
///
/// # Errors
/// Returns error if the file cannot be read or parsed
pub fn read_mountinfo_from(path: &Path) -> Result<Vec<MountInfo>> {
    let content = fs::read_to_string(path)?;
    parse_mountinfo(&content)
}

/// Mount table of the calling thread's mount namespace
///
/// # Errors
/// Returns error if procfs is unavailable
pub fn read_mountinfo() -> Result<Vec<MountInfo>> {
    read_mountinfo_from(Path::new("/proc/thread-self/mountinfo"))
}

/// Propagation type of `/` in a parsed mount table
///
/// When `/` is stacked the topmost entry wins.
///
/// # Errors
/// Returns [`Error::Parse`] if the table has no `/` entry
pub fn root_propagation_in(mounts: &[MountInfo]) -> Result<Propagation> {
    mounts
        .iter()
        .rev()
        .find(|m| m.mount_point == Path::new("/"))
        .map(MountInfo::propagation)
        .ok_or_else(|| Error::parse("mountinfo: no entry for /"))
}

/// Propagation type of `/` in the calling thread's mount namespace
///
/// # Errors
/// Returns error if the mount table cannot be read
pub fn root_propagation() -> Result<Propagation> {
    root_propagation_in(&read_mountinfo()?)
}

/// Decode the `\ooo` octal escapes the kernel uses for whitespace and `\`
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, b| acc * 8 + u32::from(b - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
