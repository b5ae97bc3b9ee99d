//! Environment absence is absorbed at the boundary and never surfaces as an error.

use host_compat::{
    Compat, CompatSettings, FeatureProbe, InterfaceVersion, SecretValueGuard, SimulatedHost,
    SurfacePath, VersionOracle,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_old_host_without_primitives() {
    let compat = Compat::builder(Arc::new(SimulatedHost::new()))
        .settings(CompatSettings {
            minimum_known_version: InterfaceVersion::new(30_403),
            ..CompatSettings::default()
        })
        .build()
        .unwrap();

    assert_eq!(compat.interface_version().raw(), 30_403);
    assert!(compat.oracle().used_fallback());
    assert!(!compat.is_midnight_or_later());
    assert!(!compat.is_secret_value(&SimulatedHost::secret(json!(1))));
    assert!(!compat.has("C_ClassTalents.GetActiveSpecOverride"));
}

#[test]
fn test_has_three_level_path() {
    let host = Arc::new(SimulatedHost::new());
    let probe = FeatureProbe::new(host.clone());
    let path = SurfacePath::from(["A", "B", "C"]);

    assert!(!probe.has(&path));
    host.define_field("A.Other", json!(true));
    assert!(!probe.has(&path));
    host.define_field("A.B.C", json!("not a function"));
    assert!(!probe.has(&path));
    host.define_function("A.B.C", |_| vec![]);
    assert!(probe.has(&path));
}

#[test]
fn test_lazily_loaded_library_is_discovered() {
    let host = Arc::new(SimulatedHost::new().with_version(InterfaceVersion::new(120_000)));
    let compat = Compat::builder(host.clone()).build().unwrap();

    assert!(!compat.has("LibCustomGlow.PixelGlow_Start"));
    host.define_function("LibCustomGlow.PixelGlow_Start", |_| vec![]);
    assert!(compat.has("LibCustomGlow.PixelGlow_Start"));
}

#[test]
fn test_components_usable_standalone() {
    let host = Arc::new(
        SimulatedHost::new()
            .with_version(InterfaceVersion::new(119_999))
            .with_marker_opacity(),
    );
    let oracle = VersionOracle::new(host.clone());
    let guard = SecretValueGuard::from_host(host.as_ref());

    assert!(!oracle.is_midnight_or_later());
    assert!(oracle.is_at_least(InterfaceVersion::from_parts(11, 99, 99)));
    assert!(guard.is_secret(&SimulatedHost::secret(json!("name"))));
    assert_eq!(host.version_queries(), 1);
}
