//! Compatibility-layer settings.
//!
//! Settings come from code, YAML/JSON text or a file, and can be overridden
//! from the environment:
//! - `HOST_COMPAT_MIN_VERSION` (e.g. `100000` or `10.0.0`)
//! - `HOST_COMPAT_TIE_BREAK` (`most_recent` or `first_registered`)
//! - `HOST_COMPAT_PROBE_CACHE` (`0`/`false` disables the probe cache)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ErrorContext;
use crate::probe::DEFAULT_CACHE_CAPACITY;
use crate::registry::TieBreak;
use crate::version::{InterfaceVersion, DEFAULT_MINIMUM_KNOWN};
use crate::{Error, Result};

pub const ENV_MIN_VERSION: &str = "HOST_COMPAT_MIN_VERSION";
pub const ENV_TIE_BREAK: &str = "HOST_COMPAT_TIE_BREAK";
pub const ENV_PROBE_CACHE: &str = "HOST_COMPAT_PROBE_CACHE";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompatSettings {
    /// Reported when the host has no version query primitive.
    pub minimum_known_version: InterfaceVersion,
    pub tie_break: TieBreak,
    pub probe_cache: bool,
    pub probe_cache_capacity: usize,
    /// Let `version_call` run the other branch when the selected one is missing.
    pub cross_branch_fallback: bool,
}

impl Default for CompatSettings {
    fn default() -> Self {
        Self {
            minimum_known_version: DEFAULT_MINIMUM_KNOWN,
            tie_break: TieBreak::default(),
            probe_cache: true,
            probe_cache_capacity: DEFAULT_CACHE_CAPACITY,
            cross_branch_fallback: false,
        }
    }
}

impl CompatSettings {
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            other => Err(Error::settings_with_context(
                "unsupported settings file extension",
                ErrorContext::new()
                    .with_details(format!("{:?}", other))
                    .with_source(path.display().to_string()),
            )),
        }
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MIN_VERSION) {
            self.minimum_known_version = raw.parse::<InterfaceVersion>().map_err(|e| {
                Error::settings_with_context(
                    format!("{}", e),
                    ErrorContext::new()
                        .with_field_path("minimum_known_version")
                        .with_source(ENV_MIN_VERSION),
                )
            })?;
        }
        if let Some(raw) = lookup(ENV_TIE_BREAK) {
            self.tie_break = raw.parse::<TieBreak>().map_err(|e| {
                Error::settings_with_context(
                    e,
                    ErrorContext::new()
                        .with_field_path("tie_break")
                        .with_source(ENV_TIE_BREAK),
                )
            })?;
        }
        if let Some(raw) = lookup(ENV_PROBE_CACHE) {
            self.probe_cache = !matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off" | "no"
            );
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.probe_cache && self.probe_cache_capacity == 0 {
            return Err(Error::settings_with_context(
                "probe cache capacity must be at least 1 when caching is enabled",
                ErrorContext::new()
                    .with_field_path("probe_cache_capacity")
                    .with_details("0"),
            ));
        }
        Ok(())
    }

    /// Cache capacity handed to the feature probe; zero means disabled.
    pub fn effective_cache_capacity(&self) -> usize {
        if self.probe_cache {
            self.probe_cache_capacity
        } else {
            0
        }
    }
}
