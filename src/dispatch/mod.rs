//! Dispatcher: the call-forwarding entry point used by feature modules.
//!
//! Two forms are offered:
//! - [`Dispatcher::version_call`]: the common two-variant shorthand. Exactly
//!   one branch is chosen from the cached host version and invoked once; its
//!   result is returned unmodified (use a tuple for multiple values).
//! - [`Dispatcher::call`]: the general form, resolving a registered capability
//!   through the [`CompatRegistry`] at the cached host version. Every return
//!   value comes back classified by the [`SecretValueGuard`]; the raw form is
//!   [`Dispatcher::call_unguarded`].
//!
//! The only failure is [`ConfigurationError`]. Host-environment absence never
//! reaches this layer as an error.

use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::guard::{Guarded, SecretValueGuard};
use crate::host::HostValue;
use crate::registry::CompatRegistry;
use crate::version::{InterfaceVersion, VersionOracle, MIDNIGHT_THRESHOLD};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    oracle: Arc<VersionOracle>,
    registry: Arc<CompatRegistry>,
    guard: Arc<SecretValueGuard>,
    cross_branch_fallback: bool,
}

impl Dispatcher {
    pub fn new(
        oracle: Arc<VersionOracle>,
        registry: Arc<CompatRegistry>,
        guard: Arc<SecretValueGuard>,
    ) -> Self {
        Self {
            oracle,
            registry,
            guard,
            cross_branch_fallback: false,
        }
    }

    /// Let `version_call` run the other branch when the selected one is
    /// missing. Off by default: a missing branch is a configuration error.
    pub fn with_cross_branch_fallback(mut self, enable: bool) -> Self {
        self.cross_branch_fallback = enable;
        self
    }

    pub fn version(&self) -> InterfaceVersion {
        self.oracle.get_version()
    }

    pub fn registry(&self) -> &CompatRegistry {
        &self.registry
    }

    /// Invoke `post` at or after the Midnight threshold, `pre` before it.
    ///
    /// Fails when the selected branch is `None`, unless cross-branch fallback
    /// is enabled, in which case it fails only when both are `None`.
    pub fn version_call<A, R, P, Q>(
        &self,
        pre: Option<P>,
        post: Option<Q>,
        args: A,
    ) -> Result<R, ConfigurationError>
    where
        P: FnOnce(A) -> R,
        Q: FnOnce(A) -> R,
    {
        self.version_call_at(MIDNIGHT_THRESHOLD, pre, post, args)
    }

    /// [`version_call`](Self::version_call) with an explicit threshold.
    pub fn version_call_at<A, R, P, Q>(
        &self,
        threshold: InterfaceVersion,
        pre: Option<P>,
        post: Option<Q>,
        args: A,
    ) -> Result<R, ConfigurationError>
    where
        P: FnOnce(A) -> R,
        Q: FnOnce(A) -> R,
    {
        let post_selected = self.oracle.is_at_least(threshold);
        match (post_selected, pre, post) {
            (true, _, Some(post)) => Ok(post(args)),
            (false, Some(pre), _) => Ok(pre(args)),
            (true, Some(pre), None) if self.cross_branch_fallback => {
                tracing::warn!(
                    %threshold,
                    "no post-threshold implementation supplied; using pre-threshold one"
                );
                Ok(pre(args))
            }
            (false, None, Some(post)) if self.cross_branch_fallback => {
                tracing::warn!(
                    %threshold,
                    "no pre-threshold implementation supplied; using post-threshold one"
                );
                Ok(post(args))
            }
            (true, _, None) => Err(ConfigurationError::NotCallable {
                site: format!("version_call (post-threshold branch, >= {})", threshold),
            }),
            (false, None, _) => Err(ConfigurationError::NotCallable {
                site: format!("version_call (pre-threshold branch, < {})", threshold),
            }),
        }
    }

    /// Infallible shorthand when both branches are present.
    pub fn branch<A, R>(
        &self,
        pre: impl FnOnce(A) -> R,
        post: impl FnOnce(A) -> R,
        args: A,
    ) -> R {
        if self.oracle.is_midnight_or_later() {
            post(args)
        } else {
            pre(args)
        }
    }

    /// Resolve `key` at the current host version, invoke it, and pass every
    /// return value through the secret-value guard.
    pub fn call(
        &self,
        key: &str,
        args: &[HostValue],
    ) -> Result<Vec<Guarded>, ConfigurationError> {
        self.call_unguarded(key, args).map(|values| self.guard.classify_all(values))
    }

    /// Like [`call`](Self::call), but returns the host values untouched.
    /// Protected values come back readable; callers own that risk.
    pub fn call_unguarded(
        &self,
        key: &str,
        args: &[HostValue],
    ) -> Result<Vec<HostValue>, ConfigurationError> {
        let variant = self.registry.resolve(key, self.version())?;
        Ok(variant.invoke(args))
    }

    /// Like [`call`](Self::call), but when no variant covers the running
    /// version, `fallback` is invoked with the same arguments instead.
    ///
    /// An unregistered capability is still an error.
    pub fn call_or<F>(
        &self,
        key: &str,
        args: &[HostValue],
        fallback: F,
    ) -> Result<Vec<Guarded>, ConfigurationError>
    where
        F: FnOnce(&[HostValue]) -> Vec<HostValue>,
    {
        match self.call(key, args) {
            Err(ConfigurationError::NoMatchingVariant { version, .. }) => {
                tracing::debug!(
                    capability = key,
                    %version,
                    "no variant for host version; using caller fallback"
                );
                Ok(self.guard.classify_all(fallback(args)))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostFn, MarkerOpacity, SimulatedHost};
    use crate::registry::RegistryBuilder;
    use crate::version::VersionPredicate;
    use serde_json::json;
    use std::cell::Cell;

    fn dispatcher_at(version: u32, registry: RegistryBuilder) -> Dispatcher {
        Dispatcher::new(
            Arc::new(VersionOracle::fixed(InterfaceVersion::new(version))),
            Arc::new(registry.freeze()),
            Arc::new(SecretValueGuard::new(Some(Arc::new(MarkerOpacity)))),
        )
    }

    fn plain_values(values: Vec<Guarded>) -> Vec<HostValue> {
        values
            .into_iter()
            .map(|g| g.plain().expect("value should be readable"))
            .collect()
    }

    #[test]
    fn test_version_call_invokes_exactly_one_branch() {
        for (version, expect_post) in [(119_999, false), (120_000, true)] {
            let pre_calls = Cell::new(0);
            let post_calls = Cell::new(0);
            let dispatcher = dispatcher_at(version, RegistryBuilder::new());

            let result = dispatcher
                .version_call(
                    Some(|(a, b): (i32, i32)| {
                        pre_calls.set(pre_calls.get() + 1);
                        (a + b, "pre")
                    }),
                    Some(|(a, b): (i32, i32)| {
                        post_calls.set(post_calls.get() + 1);
                        (a * b, "post")
                    }),
                    (2, 5),
                )
                .unwrap();

            if expect_post {
                assert_eq!(result, (10, "post"));
                assert_eq!((pre_calls.get(), post_calls.get()), (0, 1));
            } else {
                assert_eq!(result, (7, "pre"));
                assert_eq!((pre_calls.get(), post_calls.get()), (1, 0));
            }
        }
    }

    #[test]
    fn test_version_call_missing_selected_branch_is_an_error() {
        let pre_calls = Cell::new(0);
        let dispatcher = dispatcher_at(120_000, RegistryBuilder::new());
        let err = dispatcher
            .version_call(
                Some(|x: i32| {
                    pre_calls.set(pre_calls.get() + 1);
                    x + 1
                }),
                None::<fn(i32) -> i32>,
                1,
            )
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NotCallable { .. }));
        assert!(err.to_string().contains("post-threshold"));
        assert_eq!(pre_calls.get(), 0);

        let dispatcher = dispatcher_at(110_207, RegistryBuilder::new());
        let err = dispatcher
            .version_call(None::<fn(i32) -> i32>, Some(|x: i32| x * 2), 1)
            .unwrap_err();
        assert!(err.to_string().contains("pre-threshold"));
    }

    #[test]
    fn test_version_call_cross_branch_fallback_is_opt_in() {
        let dispatcher =
            dispatcher_at(120_000, RegistryBuilder::new()).with_cross_branch_fallback(true);
        let result = dispatcher
            .version_call(Some(|x: i32| x + 1), None::<fn(i32) -> i32>, 1)
            .unwrap();
        assert_eq!(result, 2);
    }

    #[test]
    fn test_version_call_without_implementations() {
        for fallback in [false, true] {
            let dispatcher = dispatcher_at(110_207, RegistryBuilder::new())
                .with_cross_branch_fallback(fallback);
            let err = dispatcher
                .version_call(None::<fn(()) -> ()>, None::<fn(()) -> ()>, ())
                .unwrap_err();
            assert!(matches!(err, ConfigurationError::NotCallable { .. }));
        }
    }

    #[test]
    fn test_branch_with_explicit_threshold() {
        let dispatcher = dispatcher_at(110_207, RegistryBuilder::new());
        let picked = dispatcher
            .version_call_at(
                InterfaceVersion::new(110_200),
                Some(|_: ()| "old"),
                Some(|_: ()| "new"),
                (),
            )
            .unwrap();
        assert_eq!(picked, "new");
        assert_eq!(dispatcher.branch(|_: ()| "old", |_: ()| "new", ()), "old");
    }

    #[test]
    fn test_call_forwards_multiple_returns() {
        let mut registry = RegistryBuilder::new();
        registry.register(
            "GetAuraByIndex",
            VersionPredicate::any(),
            HostFn::new(|args| vec![json!("Renew"), args[0].clone(), json!(null)]),
            0,
        );
        let dispatcher = dispatcher_at(110_207, registry);
        let out = dispatcher.call("GetAuraByIndex", &[json!(3)]).unwrap();
        assert_eq!(plain_values(out), vec![json!("Renew"), json!(3), json!(null)]);
    }

    #[test]
    fn test_call_classifies_secret_returns() {
        let mut registry = RegistryBuilder::new();
        registry.register(
            "UnitHealth",
            VersionPredicate::any(),
            HostFn::new(|_| vec![SimulatedHost::secret(json!(9000)), json!("player")]),
            0,
        );
        let dispatcher = dispatcher_at(120_000, registry);
        let out = dispatcher.call("UnitHealth", &[]).unwrap();
        assert!(matches!(out[0], Guarded::Secret(_)));
        assert!(matches!(out[1], Guarded::Plain(_)));
        let values: Vec<HostValue> = out.into_iter().map(|g| g.unwrap_or(json!(0))).collect();
        assert_eq!(values, vec![json!(0), json!("player")]);

        let raw = dispatcher.call_unguarded("UnitHealth", &[]).unwrap();
        assert_eq!(raw[0], SimulatedHost::secret(json!(9000)));
    }

    #[test]
    fn test_call_or_only_covers_missing_variant() {
        let mut registry = RegistryBuilder::new();
        registry.register(
            "GetOverrideSpell",
            VersionPredicate::before(MIDNIGHT_THRESHOLD),
            HostFn::new(|_| vec![json!(1)]),
            0,
        );
        let dispatcher = dispatcher_at(120_000, registry);
        let out = dispatcher
            .call_or("GetOverrideSpell", &[json!(133)], |args| args.to_vec())
            .unwrap();
        assert_eq!(plain_values(out), vec![json!(133)]);

        let err = dispatcher
            .call_or("Unregistered", &[], |args| args.to_vec())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownCapability { .. }));
    }
}
