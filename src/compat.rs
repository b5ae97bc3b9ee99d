//! The public call surface consumed by feature modules.

use std::sync::Arc;

use crate::config::CompatSettings;
use crate::dispatch::Dispatcher;
use crate::error::ConfigurationError;
use crate::guard::{Guarded, SecretValueGuard};
use crate::host::{Host, HostFn, HostValue, SurfacePath};
use crate::probe::FeatureProbe;
use crate::registry::{CapabilityKey, CompatRegistry, RegistryBuilder};
use crate::version::{InterfaceVersion, VersionOracle, VersionPredicate};
use crate::Result;

/// Version oracle, secret guard, feature probe and dispatcher for one host.
///
/// Built once by [`CompatBuilder`] at load time and shared by reference.
#[derive(Debug)]
pub struct Compat {
    oracle: Arc<VersionOracle>,
    guard: Arc<SecretValueGuard>,
    probe: FeatureProbe,
    dispatcher: Dispatcher,
}

impl Compat {
    pub fn builder(host: Arc<dyn Host>) -> CompatBuilder {
        CompatBuilder::new(host)
    }

    pub fn interface_version(&self) -> InterfaceVersion {
        self.oracle.get_version()
    }

    pub fn is_at_least(&self, threshold: InterfaceVersion) -> bool {
        self.oracle.is_at_least(threshold)
    }

    pub fn is_midnight_or_later(&self) -> bool {
        self.oracle.is_midnight_or_later()
    }

    pub fn version_call<A, R, P, Q>(
        &self,
        pre: Option<P>,
        post: Option<Q>,
        args: A,
    ) -> std::result::Result<R, ConfigurationError>
    where
        P: FnOnce(A) -> R,
        Q: FnOnce(A) -> R,
    {
        self.dispatcher.version_call(pre, post, args)
    }

    /// Every return value comes back classified; protected ones are only
    /// reachable through [`Guarded::unwrap_or`] and friends.
    pub fn call(
        &self,
        key: &str,
        args: &[HostValue],
    ) -> std::result::Result<Vec<Guarded>, ConfigurationError> {
        self.dispatcher.call(key, args)
    }

    /// Raw host values, protected or not. Prefer [`call`](Self::call).
    pub fn call_unguarded(
        &self,
        key: &str,
        args: &[HostValue],
    ) -> std::result::Result<Vec<HostValue>, ConfigurationError> {
        self.dispatcher.call_unguarded(key, args)
    }

    pub fn is_secret_value(&self, value: &HostValue) -> bool {
        self.guard.is_secret(value)
    }

    pub fn safe_unwrap(&self, value: HostValue, fallback: HostValue) -> HostValue {
        self.guard.safe_unwrap(value, fallback)
    }

    pub fn has(&self, path: impl Into<SurfacePath>) -> bool {
        self.probe.has(path)
    }

    pub fn oracle(&self) -> &VersionOracle {
        &self.oracle
    }

    pub fn guard(&self) -> &SecretValueGuard {
        &self.guard
    }

    pub fn probe(&self) -> &FeatureProbe {
        &self.probe
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn registry(&self) -> &CompatRegistry {
        self.dispatcher.registry()
    }
}

/// Load-phase builder for [`Compat`]. All registration happens here.
pub struct CompatBuilder {
    host: Arc<dyn Host>,
    settings: CompatSettings,
    registry: RegistryBuilder,
    fixed_version: Option<InterfaceVersion>,
}

impl CompatBuilder {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            host,
            settings: CompatSettings::default(),
            registry: RegistryBuilder::new(),
            fixed_version: None,
        }
    }

    pub fn settings(mut self, settings: CompatSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Pin the version instead of querying the host. Intended for tests.
    pub fn fixed_version(mut self, version: InterfaceVersion) -> Self {
        self.fixed_version = Some(version);
        self
    }

    pub fn register(
        mut self,
        key: impl Into<CapabilityKey>,
        predicate: VersionPredicate,
        implementation: HostFn,
        priority: i32,
    ) -> Self {
        self.registry.register(key, predicate, implementation, priority);
        self
    }

    /// Hand the registry builder to a feature module's load function.
    pub fn register_with<F>(mut self, load: F) -> Self
    where
        F: FnOnce(&mut RegistryBuilder),
    {
        load(&mut self.registry);
        self
    }

    pub fn build(self) -> Result<Compat> {
        self.settings.validate()?;

        let oracle = Arc::new(match self.fixed_version {
            Some(version) => VersionOracle::fixed(version),
            None => VersionOracle::with_minimum_known(
                self.host.clone(),
                self.settings.minimum_known_version,
            ),
        });
        let guard = Arc::new(SecretValueGuard::from_host(self.host.as_ref()));
        let probe = FeatureProbe::with_cache_capacity(
            self.host.clone(),
            self.settings.effective_cache_capacity(),
        );

        let mut registry = self.registry;
        registry.tie_break(self.settings.tie_break);
        let registry = Arc::new(registry.freeze());

        let dispatcher = Dispatcher::new(oracle.clone(), registry, guard.clone())
            .with_cross_branch_fallback(self.settings.cross_branch_fallback);
        Ok(Compat {
            oracle,
            guard,
            probe,
            dispatcher,
        })
    }
}
