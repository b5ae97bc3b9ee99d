//! Host interface versions and version predicates.
//!
//! A host version is a single integer in `MMmmpp` form: `110207` is 11.2.7 and
//! `120000` is 12.0.0. Ordering is plain integer ordering, so a version can be
//! compared against a threshold without decoding it.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`InterfaceVersion`] | Immutable version identifier |
//! | [`VersionPredicate`] | Applicability test used by registry variants |
//! | [`VersionOracle`] | Captures the running host version once |

pub mod oracle;

pub use oracle::{OracleState, VersionOracle};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// First interface version of the Midnight expansion (12.0.0).
pub const MIDNIGHT_THRESHOLD: InterfaceVersion = InterfaceVersion(120_000);

/// Oldest version the layer knows about. Used when the host cannot report one.
pub const DEFAULT_MINIMUM_KNOWN: InterfaceVersion = InterfaceVersion(100_000);

/// Host interface version identifier (`major * 10000 + minor * 100 + patch`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceVersion(u32);

impl InterfaceVersion {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build from components. Minor and patch are clamped to two digits and
    /// an oversized major saturates at `u32::MAX`.
    pub const fn from_parts(major: u32, minor: u32, patch: u32) -> Self {
        let minor = if minor > 99 { 99 } else { minor };
        let patch = if patch > 99 { 99 } else { patch };
        Self(major.saturating_mul(10_000).saturating_add(minor * 100 + patch))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        self.0 / 10_000
    }

    pub const fn minor(self) -> u32 {
        (self.0 / 100) % 100
    }

    pub const fn patch(self) -> u32 {
        self.0 % 100
    }
}

impl From<u32> for InterfaceVersion {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for InterfaceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid interface version '{0}' (expected e.g. 110207 or 11.2.7)")]
pub struct ParseVersionError(String);

impl FromStr for InterfaceVersion {
    type Err = ParseVersionError;

    /// Accepts the raw integer form (`110207`) or the dotted form (`11.2.7`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ParseVersionError(s.to_string());

        if !s.contains('.') {
            return s.parse::<u32>().map(Self).map_err(|_| invalid());
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(parts.iter()) {
            *slot = part.parse().map_err(|_| invalid())?;
        }
        if nums[1] > 99 || nums[2] > 99 {
            return Err(invalid());
        }
        nums[0]
            .checked_mul(10_000)
            .and_then(|v| v.checked_add(nums[1] * 100 + nums[2]))
            .map(Self)
            .ok_or_else(invalid)
    }
}

/// Which host versions a registered variant applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPredicate {
    /// Every version.
    Any,
    /// Half-open range: `min` inclusive, `max` exclusive. A missing bound is open.
    Range {
        min: Option<InterfaceVersion>,
        max: Option<InterfaceVersion>,
    },
    /// An explicit set of versions.
    Set(BTreeSet<InterfaceVersion>),
}

const VERSION_SPACE: u64 = u32::MAX as u64 + 1;

impl VersionPredicate {
    pub fn any() -> Self {
        Self::Any
    }

    /// Versions strictly below `threshold`.
    pub fn before(threshold: InterfaceVersion) -> Self {
        Self::Range {
            min: None,
            max: Some(threshold),
        }
    }

    /// Versions at or above `threshold`.
    pub fn at_least(threshold: InterfaceVersion) -> Self {
        Self::Range {
            min: Some(threshold),
            max: None,
        }
    }

    /// Versions in `[min, max)`.
    pub fn between(min: InterfaceVersion, max: InterfaceVersion) -> Self {
        Self::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn exactly(version: InterfaceVersion) -> Self {
        Self::Set(BTreeSet::from([version]))
    }

    pub fn one_of(versions: impl IntoIterator<Item = InterfaceVersion>) -> Self {
        Self::Set(versions.into_iter().collect())
    }

    pub fn matches(&self, version: InterfaceVersion) -> bool {
        match self {
            Self::Any => true,
            Self::Range { min, max } => {
                min.map_or(true, |m| version >= m) && max.map_or(true, |m| version < m)
            }
            Self::Set(set) => set.contains(&version),
        }
    }

    /// Number of versions this predicate admits. Smaller means more specific.
    pub fn span(&self) -> u64 {
        match self {
            Self::Any => VERSION_SPACE,
            Self::Range { min, max } => {
                let lo = min.map_or(0, |v| u64::from(v.raw()));
                let hi = max.map_or(VERSION_SPACE, |v| u64::from(v.raw()));
                hi.saturating_sub(lo)
            }
            Self::Set(set) => set.len() as u64,
        }
    }
}

impl fmt::Display for VersionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Range { min, max } => match (min, max) {
                (None, None) => f.write_str("any"),
                (Some(lo), None) => write!(f, ">= {}", lo),
                (None, Some(hi)) => write!(f, "< {}", hi),
                (Some(lo), Some(hi)) => write!(f, "[{}, {})", lo, hi),
            },
            Self::Set(set) => {
                let items: Vec<String> = set.iter().map(|v| v.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
        }
    }
}
