//! Namespace selection

use std::fmt;
use std::str::FromStr;

use nix::sched::CloneFlags;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use toolbox_core::{Error, Result};

/// A namespace category that can be unshared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Mount namespace (`CLONE_NEWNS`)
    Mount,
    /// PID namespace (`CLONE_NEWPID`)
    Pid,
}

impl Namespace {
    /// Every supported category, in bit order
    pub const ALL: [Self; 2] = [Self::Mount, Self::Pid];

    /// Canonical lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mount => "mount",
            Self::Pid => "pid",
        }
    }

    /// Kernel flag passed to unshare(2)
    #[must_use]
    pub const fn clone_flag(self) -> CloneFlags {
        match self {
            Self::Mount => CloneFlags::CLONE_NEWNS,
            Self::Pid => CloneFlags::CLONE_NEWPID,
        }
    }

    /// Name of the kernel flag, as used in error messages
    #[must_use]
    pub const fn clone_flag_name(self) -> &'static str {
        match self {
            Self::Mount => "CLONE_NEWNS",
            Self::Pid => "CLONE_NEWPID",
        }
    }

    /// The single-bit [`NamespaceFlags`] for this category
    #[must_use]
    pub const fn flag(self) -> NamespaceFlags {
        match self {
            Self::Mount => NamespaceFlags::MOUNT,
            Self::Pid => NamespaceFlags::PID,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Namespace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mount" | "mnt" => Ok(Self::Mount),
            "pid" => Ok(Self::Pid),
            other => Err(Error::invalid_config(format!(
                "unknown namespace \"{other}\" (expected mount or pid)"
            ))),
        }
    }
}

/// Set of namespace categories to unshare
///
/// Only the bits of [`NamespaceFlags::ALL`] can be represented. Values built
/// with [`NamespaceFlags::from_bits`] reject anything else, so unshare never
/// sees a bit it does not know how to translate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NamespaceFlags(u32);

impl NamespaceFlags {
    /// Mount namespace flag
    pub const MOUNT: Self = Self(1 << 0);
    /// PID namespace flag
    pub const PID: Self = Self(1 << 1);

    /// All namespaces
    pub const ALL: Self = Self(Self::MOUNT.0 | Self::PID.0);
    /// No namespaces
    pub const EMPTY: Self = Self(0);

    /// Create from raw value, rejecting undefined bits
    #[must_use]
    pub const fn from_bits(bits: u32) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Create from raw value, silently dropping undefined bits
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Get raw value
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check if flag is set
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if no flag is set
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the selected categories
    pub fn iter(self) -> impl Iterator<Item = Namespace> {
        Namespace::ALL
            .into_iter()
            .filter(move |ns| self.contains(ns.flag()))
    }

    /// Names of the selected categories
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        self.iter().map(Namespace::name).collect()
    }

    /// Convert to clone flags for unshare(2)
    #[must_use]
    pub fn to_clone_flags(self) -> CloneFlags {
        self.iter()
            .fold(CloneFlags::empty(), |acc, ns| acc | ns.clone_flag())
    }

    /// Render the kernel flag word, e.g. `CLONE_NEWNS | CLONE_NEWPID`
    #[must_use]
    pub fn clone_flags_description(self) -> String {
        if self.is_empty() {
            return "0".to_string();
        }

        self.iter()
            .map(Namespace::clone_flag_name)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl From<Namespace> for NamespaceFlags {
    fn from(ns: Namespace) -> Self {
        ns.flag()
    }
}

impl FromIterator<Namespace> for NamespaceFlags {
    fn from_iter<I: IntoIterator<Item = Namespace>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, |acc, ns| acc | ns.flag())
    }
}

impl std::ops::BitOr for NamespaceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for NamespaceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for NamespaceFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for NamespaceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join(","))
    }
}

/// Parses a comma separated list such as `mount,pid`. `none` and the empty
/// string yield [`NamespaceFlags::EMPTY`].
impl FromStr for NamespaceFlags {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut flags = Self::EMPTY;
        for part in s.split(',').map(str::trim) {
            if part.is_empty() || part.eq_ignore_ascii_case("none") {
                continue;
            }
            flags |= part.parse::<Namespace>()?.flag();
        }
        Ok(flags)
    }
}

impl Serialize for NamespaceFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl<'de> Deserialize<'de> for NamespaceFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| name.parse::<Namespace>().map_err(de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_flags() {
        let flags = NamespaceFlags::MOUNT | NamespaceFlags::PID;

        assert!(flags.contains(NamespaceFlags::MOUNT));
        assert!(flags.contains(NamespaceFlags::PID));
        assert_eq!(flags, NamespaceFlags::ALL);
        assert!(NamespaceFlags::EMPTY.is_empty());
    }

    #[test]
    fn test_bit_values() {
        assert_eq!(NamespaceFlags::MOUNT.bits(), 1);
        assert_eq!(NamespaceFlags::PID.bits(), 2);
    }

    #[test]
    fn test_from_bits_rejects_unknown() {
        assert_eq!(NamespaceFlags::from_bits(0b11), Some(NamespaceFlags::ALL));
        assert_eq!(NamespaceFlags::from_bits(0), Some(NamespaceFlags::EMPTY));
        assert_eq!(NamespaceFlags::from_bits(0b100), None);
        assert_eq!(NamespaceFlags::from_bits(0b101), None);
    }

    #[test]
    fn test_from_bits_truncate() {
        assert_eq!(NamespaceFlags::from_bits_truncate(0b101), NamespaceFlags::MOUNT);
        assert_eq!(NamespaceFlags::from_bits_truncate(u32::MAX), NamespaceFlags::ALL);
    }

    #[test]
    fn test_clone_flags_conversion() {
        let flags = NamespaceFlags::ALL.to_clone_flags();
        assert!(flags.contains(CloneFlags::CLONE_NEWNS));
        assert!(flags.contains(CloneFlags::CLONE_NEWPID));
        assert!(!flags.contains(CloneFlags::CLONE_NEWNET));

        let flags = NamespaceFlags::PID.to_clone_flags();
        assert_eq!(flags, CloneFlags::CLONE_NEWPID);

        assert!(NamespaceFlags::EMPTY.to_clone_flags().is_empty());
    }

    #[test]
    fn test_clone_flags_description() {
        assert_eq!(
            NamespaceFlags::ALL.clone_flags_description(),
            "CLONE_NEWNS | CLONE_NEWPID"
        );
        assert_eq!(NamespaceFlags::MOUNT.clone_flags_description(), "CLONE_NEWNS");
        assert_eq!(NamespaceFlags::EMPTY.clone_flags_description(), "0");
    }

    #[test]
    fn test_parse() {
        assert_eq!("mount,pid".parse::<NamespaceFlags>().unwrap(), NamespaceFlags::ALL);
        assert_eq!(" mnt ".parse::<NamespaceFlags>().unwrap(), NamespaceFlags::MOUNT);
        assert_eq!("PID".parse::<NamespaceFlags>().unwrap(), NamespaceFlags::PID);
        assert_eq!("none".parse::<NamespaceFlags>().unwrap(), NamespaceFlags::EMPTY);
        assert_eq!("".parse::<NamespaceFlags>().unwrap(), NamespaceFlags::EMPTY);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "mount,net".parse::<NamespaceFlags>().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(err.to_string().contains("net"));
    }

    #[test]
    fn test_display() {
        assert_eq!(NamespaceFlags::ALL.to_string(), "mount,pid");
        assert_eq!(NamespaceFlags::EMPTY.to_string(), "none");
        assert_eq!(Namespace::Pid.to_string(), "pid");
    }

    #[test]
    fn test_from_iterator() {
        let flags: NamespaceFlags = [Namespace::Pid, Namespace::Pid].into_iter().collect();
        assert_eq!(flags, NamespaceFlags::PID);
        assert_eq!(flags.names(), vec!["pid"]);
    }
}
