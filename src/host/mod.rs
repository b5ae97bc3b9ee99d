//! The host platform seam.
//!
//! Everything the compatibility layer needs from the host goes through the
//! [`Host`] trait: an optional version-query primitive, an optional
//! opacity-check primitive, and the global namespace of API surfaces.
//! Older hosts simply return `None` for primitives they lack.

mod path;
mod simulated;

pub use path::SurfacePath;
pub use simulated::{HostProfile, MarkerOpacity, SimulatedHost, SECRET_MARKER};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::version::InterfaceVersion;

/// Values crossing the host boundary.
pub type HostValue = serde_json::Value;

/// A host-callable function using the host calling convention: a slice of
/// arguments in, zero or more return values out.
#[derive(Clone)]
pub struct HostFn(Arc<dyn Fn(&[HostValue]) -> Vec<HostValue> + Send + Sync>);

impl HostFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[HostValue]) -> Vec<HostValue> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn invoke(&self, args: &[HostValue]) -> Vec<HostValue> {
        (self.0)(args)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HostFn(..)")
    }
}

/// A node in the host's API namespace.
#[derive(Debug, Clone)]
pub enum Surface {
    /// A namespace table such as `C_ClassTalents`.
    Table(Arc<BTreeMap<String, Surface>>),
    Function(HostFn),
    /// A plain data field. Exists, but is not callable.
    Field(HostValue),
}

/// Kind of a surface node, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Table,
    Function,
    Field,
}

impl Surface {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Surface::Table(_) => SurfaceKind::Table,
            Surface::Function(_) => SurfaceKind::Function,
            Surface::Field(_) => SurfaceKind::Field,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Surface::Function(_))
    }

    /// Child lookup. Only tables have children.
    pub fn child(&self, name: &str) -> Option<&Surface> {
        match self {
            Surface::Table(table) => table.get(name),
            _ => None,
        }
    }
}

/// The host's opacity-check primitive. Its own answer is never protected.
pub trait OpacityCheck: Send + Sync {
    fn is_secret(&self, value: &HostValue) -> bool;
}

/// The host platform as seen by the compatibility layer.
pub trait Host: Send + Sync {
    /// Version-query primitive. `None` when the host predates it.
    fn interface_version(&self) -> Option<InterfaceVersion>;

    /// Opacity-check primitive. `None` when the host has no protected values.
    fn opacity_check(&self) -> Option<Arc<dyn OpacityCheck>>;

    /// Look up a top-level name in the host's global namespace.
    fn global(&self, name: &str) -> Option<Surface>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_surface_child_lookup() {
        let mut inner = BTreeMap::new();
        inner.insert(
            "GetAuraDataByIndex".to_string(),
            Surface::Function(HostFn::new(|_| vec![])),
        );
        let table = Surface::Table(Arc::new(inner));
        assert!(table
            .child("GetAuraDataByIndex")
            .map(Surface::is_callable)
            .unwrap_or(false));
        assert!(table.child("Missing").is_none());
        assert!(Surface::Field(json!(1)).child("x").is_none());
    }

    #[test]
    fn test_host_fn_forwards_multiple_returns() {
        let f = HostFn::new(|args| vec![args[0].clone(), json!(args.len())]);
        assert_eq!(f.invoke(&[json!("a"), json!("b")]), vec![json!("a"), json!(2)]);
    }
}
