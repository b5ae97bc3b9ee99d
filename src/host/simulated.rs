//! In-memory host used for tests, demos and embedding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::{Host, HostFn, HostValue, OpacityCheck, Surface, SurfacePath};
use crate::version::InterfaceVersion;

/// Object key that marks a simulated protected value.
pub const SECRET_MARKER: &str = "$secret";

/// Opacity check for [`SimulatedHost`]: a value is protected when it is an
/// object whose only key is [`SECRET_MARKER`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkerOpacity;

impl OpacityCheck for MarkerOpacity {
    fn is_secret(&self, value: &HostValue) -> bool {
        value
            .as_object()
            .map(|obj| obj.len() == 1 && obj.contains_key(SECRET_MARKER))
            .unwrap_or(false)
    }
}

/// A host whose globals can be defined (and removed) at any time, so that
/// lazily materialised surfaces can be simulated.
pub struct SimulatedHost {
    version: Option<InterfaceVersion>,
    opacity: Option<Arc<dyn OpacityCheck>>,
    globals: RwLock<BTreeMap<String, Surface>>,
    version_queries: AtomicUsize,
}

impl SimulatedHost {
    /// A bare host: no version primitive, no opacity primitive, no globals.
    pub fn new() -> Self {
        Self {
            version: None,
            opacity: None,
            globals: RwLock::new(BTreeMap::new()),
            version_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_version(mut self, version: InterfaceVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_opacity(mut self, check: Arc<dyn OpacityCheck>) -> Self {
        self.opacity = Some(check);
        self
    }

    /// Install [`MarkerOpacity`] as the opacity primitive.
    pub fn with_marker_opacity(self) -> Self {
        self.with_opacity(Arc::new(MarkerOpacity))
    }

    /// Wrap a value so that [`MarkerOpacity`] reports it as protected.
    pub fn secret(value: HostValue) -> HostValue {
        let mut obj = serde_json::Map::new();
        obj.insert(SECRET_MARKER.to_string(), value);
        HostValue::Object(obj)
    }

    pub fn define_function<F>(&self, path: impl Into<SurfacePath>, f: F)
    where
        F: Fn(&[HostValue]) -> Vec<HostValue> + Send + Sync + 'static,
    {
        self.define(path, Surface::Function(HostFn::new(f)));
    }

    pub fn define_field(&self, path: impl Into<SurfacePath>, value: HostValue) {
        self.define(path, Surface::Field(value));
    }

    /// Define a surface, creating intermediate tables as needed. A non-table
    /// intermediate is replaced by a table.
    pub fn define(&self, path: impl Into<SurfacePath>, surface: Surface) {
        let path = path.into();
        if !path.is_well_formed() {
            tracing::warn!(%path, "ignoring malformed surface path");
            return;
        }
        if let Ok(mut globals) = self.globals.write() {
            insert(&mut globals, path.segments(), surface);
        }
    }

    /// Remove a surface. Returns whether anything was removed.
    pub fn remove(&self, path: impl Into<SurfacePath>) -> bool {
        let path = path.into();
        match self.globals.write() {
            Ok(mut globals) => remove(&mut globals, path.segments()),
            Err(_) => false,
        }
    }

    /// How many times the version primitive has been queried.
    pub fn version_queries(&self) -> usize {
        self.version_queries.load(Ordering::SeqCst)
    }

    pub fn from_profile(profile: &HostProfile) -> Self {
        let mut host = Self::new();
        host.version = profile.interface_version;
        if profile.opacity_check {
            host = host.with_marker_opacity();
        }
        for path in &profile.functions {
            host.define_function(path.as_str(), |_| Vec::new());
        }
        for (path, value) in &profile.fields {
            host.define_field(path.as_str(), value.clone());
        }
        host
    }
}

impl Default for SimulatedHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for SimulatedHost {
    fn interface_version(&self) -> Option<InterfaceVersion> {
        self.version_queries.fetch_add(1, Ordering::SeqCst);
        self.version
    }

    fn opacity_check(&self) -> Option<Arc<dyn OpacityCheck>> {
        self.opacity.clone()
    }

    fn global(&self, name: &str) -> Option<Surface> {
        self.globals.read().ok()?.get(name).cloned()
    }
}

fn insert(map: &mut BTreeMap<String, Surface>, segments: &[String], surface: Surface) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.insert(head.clone(), surface);
        return;
    }
    let entry = map
        .entry(head.clone())
        .or_insert_with(|| Surface::Table(Arc::default()));
    if !matches!(entry, Surface::Table(_)) {
        *entry = Surface::Table(Arc::default());
    }
    if let Surface::Table(table) = entry {
        insert(Arc::make_mut(table), rest, surface);
    }
}

fn remove(map: &mut BTreeMap<String, Surface>, segments: &[String]) -> bool {
    let Some((head, rest)) = segments.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return map.remove(head).is_some();
    }
    match map.get_mut(head) {
        Some(Surface::Table(table)) => remove(Arc::make_mut(table), rest),
        _ => false,
    }
}

/// Declarative description of a simulated host, loadable from YAML.
///
/// ```yaml
/// interface_version: 120000
/// opacity_check: true
/// functions:
///   - C_UnitAuras.GetAuraDataByIndex
/// fields:
///   C_Constants.MaxLevel: 80
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostProfile {
    #[serde(default)]
    pub interface_version: Option<InterfaceVersion>,
    #[serde(default)]
    pub opacity_check: bool,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, HostValue>,
}

impl HostProfile {
    pub fn from_yaml_str(s: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_define_creates_tables() {
        let host = SimulatedHost::new();
        host.define_function("C_Spell.GetSpellInfo", |_| vec![json!("Fireball")]);
        host.define_function("C_Spell.GetSpellName", |_| vec![]);

        let Some(Surface::Table(table)) = host.global("C_Spell") else {
            panic!("expected table");
        };
        assert_eq!(table.len(), 2);
        match table.get("GetSpellInfo") {
            Some(Surface::Function(f)) => assert_eq!(f.invoke(&[]), vec![json!("Fireball")]),
            other => panic!("unexpected surface: {:?}", other),
        }
    }

    #[test]
    fn test_remove() {
        let host = SimulatedHost::new();
        host.define_field("C_Constants.MaxLevel", json!(80));
        assert!(host.remove("C_Constants.MaxLevel"));
        assert!(!host.remove("C_Constants.MaxLevel"));
        assert!(!host.remove("Nope.Nothing"));
    }

    #[test]
    fn test_marker_opacity() {
        let check = MarkerOpacity;
        assert!(check.is_secret(&SimulatedHost::secret(json!(42))));
        assert!(!check.is_secret(&json!({ "$secret": 1, "other": 2 })));
        assert!(!check.is_secret(&json!(42)));
    }

    #[test]
    fn test_profile_from_yaml() {
        let profile = HostProfile::from_yaml_str(
            r#"
interface_version: 110207
opacity_check: true
functions:
  - C_UnitAuras.GetAuraDataByIndex
fields:
  C_Constants.MaxLevel: 80
"#,
        )
        .unwrap();
        let host = SimulatedHost::from_profile(&profile);
        assert_eq!(host.interface_version(), Some(InterfaceVersion::new(110_207)));
        assert!(host.opacity_check().is_some());
        assert!(host.global("C_UnitAuras").is_some());
        assert!(host.global("C_Constants").is_some());
    }
}
