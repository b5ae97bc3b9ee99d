//! # host-compat
//!
//! 宿主脚本 API 的版本兼容层：版本探测、能力分派与受保护值守卫。
//!
//! Version-aware compatibility layer for host scripting APIs.
//!
//! Feature modules call into a host platform whose API changes between major
//! versions: functions get renamed, return shapes change, and newer hosts can
//! return protected values that calling code must not read. This crate keeps
//! that knowledge in one place instead of scattering version checks across
//! every call site.
//!
//! ## Key Components
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`version`] | Interface versions, predicates and the one-shot [`VersionOracle`] |
//! | [`guard`] | [`SecretValueGuard`], the only path to protected values |
//! | [`probe`] | [`FeatureProbe`], existence checks over nested host surfaces |
//! | [`registry`] | [`CompatRegistry`], version-scoped capability variants |
//! | [`dispatch`] | [`Dispatcher`], `version_call` and `call` |
//! | [`host`] | The [`Host`] seam and an in-memory [`SimulatedHost`] |
//! | [`config`] | [`CompatSettings`] loaded from YAML/JSON and env |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use host_compat::{Compat, HostFn, InterfaceVersion, SimulatedHost, MIDNIGHT_THRESHOLD};
//! use serde_json::json;
//!
//! let host = Arc::new(SimulatedHost::new().with_version(InterfaceVersion::new(110_207)));
//!
//! let compat = Compat::builder(host)
//!     .register_with(|reg| {
//!         reg.register_split(
//!             "GetAura",
//!             MIDNIGHT_THRESHOLD,
//!             HostFn::new(|_| vec![json!("legacy")]),
//!             HostFn::new(|_| vec![json!("aura-data")]),
//!         );
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert!(!compat.is_midnight_or_later());
//! let first = compat.call("GetAura", &[]).unwrap().remove(0);
//! assert_eq!(first.plain(), Some(json!("legacy")));
//! ```

pub mod compat;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod guard;
pub mod host;
pub mod probe;
pub mod registry;
pub mod version;

pub use compat::{Compat, CompatBuilder};
pub use config::CompatSettings;
pub use dispatch::Dispatcher;
pub use error::{ConfigurationError, Error, ErrorContext};
pub use guard::{Guarded, SecretValue, SecretValueGuard};
pub use host::{Host, HostFn, HostValue, OpacityCheck, SimulatedHost, Surface, SurfacePath};
pub use probe::FeatureProbe;
pub use registry::{CapabilityKey, CompatRegistry, RegistryBuilder, TieBreak, Variant};
pub use version::{InterfaceVersion, VersionOracle, VersionPredicate, MIDNIGHT_THRESHOLD};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
