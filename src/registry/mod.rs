//! 能力注册表：按宿主版本登记并唯一解析各能力的实现
//!
//! Capability registry: version-scoped implementations per logical operation.
//!
//! Registration happens on a [`RegistryBuilder`] during the load phase.
//! [`RegistryBuilder::freeze`] turns it into an immutable [`CompatRegistry`],
//! so registering after resolution has started is impossible by construction.
//!
//! Resolution of `(capability, version)` is a pure function of the registry
//! contents:
//! 1. keep variants whose predicate matches the version;
//! 2. highest priority wins;
//! 3. then the narrowest predicate (smallest [`VersionPredicate::span`]);
//! 4. then registration order, per [`TieBreak`] (most recent by default).

mod key;
mod variant;

pub use key::CapabilityKey;
pub use variant::Variant;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;
use crate::host::HostFn;
use crate::version::{InterfaceVersion, VersionPredicate};

/// Final tie-break between equally prioritised, equally specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    MostRecent,
    FirstRegistered,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most_recent" | "most-recent" | "last" => Ok(TieBreak::MostRecent),
            "first_registered" | "first-registered" | "first" => Ok(TieBreak::FirstRegistered),
            other => Err(format!("unknown tie-break '{}'", other)),
        }
    }
}

/// Load-phase registry. Consumed by [`freeze`](Self::freeze).
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: BTreeMap<CapabilityKey, Vec<Variant>>,
    next_sequence: u64,
    tie_break: TieBreak,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tie_break(&mut self, tie_break: TieBreak) -> &mut Self {
        self.tie_break = tie_break;
        self
    }

    pub fn register(
        &mut self,
        key: impl Into<CapabilityKey>,
        predicate: VersionPredicate,
        implementation: HostFn,
        priority: i32,
    ) -> &mut Self {
        self.push(key.into(), predicate, implementation, priority, None)
    }

    /// Same as [`register`](Self::register), with a label shown in diagnostics.
    pub fn register_labeled(
        &mut self,
        key: impl Into<CapabilityKey>,
        label: impl Into<String>,
        predicate: VersionPredicate,
        implementation: HostFn,
        priority: i32,
    ) -> &mut Self {
        self.push(
            key.into(),
            predicate,
            implementation,
            priority,
            Some(label.into()),
        )
    }

    /// Register a pre/post pair split at `threshold`, both at priority 0.
    pub fn register_split(
        &mut self,
        key: impl Into<CapabilityKey>,
        threshold: InterfaceVersion,
        pre: HostFn,
        post: HostFn,
    ) -> &mut Self {
        let key = key.into();
        self.register(key.clone(), VersionPredicate::before(threshold), pre, 0);
        self.register(key, VersionPredicate::at_least(threshold), post, 0)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn freeze(self) -> CompatRegistry {
        tracing::debug!(
            capabilities = self.entries.len(),
            variants = self.len(),
            tie_break = ?self.tie_break,
            "compat registry frozen"
        );
        CompatRegistry {
            entries: self.entries,
            tie_break: self.tie_break,
        }
    }

    fn push(
        &mut self,
        key: CapabilityKey,
        predicate: VersionPredicate,
        implementation: HostFn,
        priority: i32,
        label: Option<String>,
    ) -> &mut Self {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        tracing::trace!(capability = %key, %predicate, priority, sequence, "variant registered");
        self.entries.entry(key).or_default().push(Variant::new(
            predicate,
            implementation,
            priority,
            sequence,
            label,
        ));
        self
    }
}

/// Frozen capability registry. Read-only for the rest of the process.
#[derive(Debug, Default)]
pub struct CompatRegistry {
    entries: BTreeMap<CapabilityKey, Vec<Variant>>,
    tie_break: TieBreak,
}

impl CompatRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn resolve(
        &self,
        key: &str,
        version: InterfaceVersion,
    ) -> Result<&Variant, ConfigurationError> {
        let variants = self
            .entries
            .get(key)
            .ok_or_else(|| ConfigurationError::UnknownCapability {
                capability: CapabilityKey::from(key.to_string()),
                hint: Some("register the capability before the registry is frozen".into()),
            })?;

        let chosen = variants
            .iter()
            .filter(|v| v.predicate().matches(version))
            .max_by(|a, b| self.rank(a, b))
            .ok_or_else(|| ConfigurationError::NoMatchingVariant {
                capability: CapabilityKey::from(key.to_string()),
                version,
                hint: Some(format!(
                    "registered predicates: {}",
                    variants
                        .iter()
                        .map(|v| v.predicate().to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            })?;

        tracing::trace!(capability = key, %version, sequence = chosen.sequence(), "resolved");
        Ok(chosen)
    }

    fn rank(&self, a: &Variant, b: &Variant) -> Ordering {
        a.priority()
            .cmp(&b.priority())
            .then_with(|| b.predicate().span().cmp(&a.predicate().span()))
            .then_with(|| match self.tie_break {
                TieBreak::MostRecent => a.sequence().cmp(&b.sequence()),
                TieBreak::FirstRegistered => b.sequence().cmp(&a.sequence()),
            })
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityKey> {
        self.entries.keys()
    }

    pub fn variants(&self, key: &str) -> &[Variant] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Capabilities that have no variant for `version`.
    pub fn coverage(&self, version: InterfaceVersion) -> Vec<CoverageGap> {
        self.entries
            .iter()
            .filter(|(_, variants)| !variants.iter().any(|v| v.predicate().matches(version)))
            .map(|(key, variants)| CoverageGap {
                capability: key.clone(),
                version,
                registered_variants: variants.len(),
            })
            .collect()
    }

    /// Check that every registered capability resolves at `version`.
    pub fn validate_coverage(&self, version: InterfaceVersion) -> Result<(), Vec<CoverageGap>> {
        let gaps = self.coverage(version);
        if gaps.is_empty() {
            Ok(())
        } else {
            Err(gaps)
        }
    }
}

/// A capability that cannot be resolved at some version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub capability: CapabilityKey,
    pub version: InterfaceVersion,
    pub registered_variants: usize,
}

impl fmt::Display for CoverageGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Capability '{}' has no variant for host version {} ({} registered)",
            self.capability, self.version, self.registered_variants
        )
    }
}
