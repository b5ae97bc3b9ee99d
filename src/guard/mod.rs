//! Secret-value guard.
//!
//! Newer hosts can hand back protected values that calling code must not read,
//! format or compute with. This module is the single audited path for touching
//! such values: a value is either classified into [`Guarded`] or unwrapped
//! with a fallback. [`SecretValue`] has no accessor, no `Display`, no `Deref`
//! and no `Serialize`, so misuse is a compile error rather than a host crash.
//!
//! On hosts without an opacity primitive nothing is ever secret.

use std::fmt;
use std::sync::Arc;

use crate::host::{Host, HostValue, OpacityCheck};

/// A protected host value. Only the guard's fallback operations consume it.
pub struct SecretValue(HostValue);

impl SecretValue {
    // Never exposes the inner value.
    fn discard(self) {
        drop(self.0);
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(<redacted>)")
    }
}

/// A host value after classification.
#[derive(Debug)]
pub enum Guarded {
    Plain(HostValue),
    Secret(SecretValue),
}

impl Guarded {
    pub fn is_secret(&self) -> bool {
        matches!(self, Guarded::Secret(_))
    }

    pub fn unwrap_or(self, fallback: HostValue) -> HostValue {
        match self {
            Guarded::Plain(v) => v,
            Guarded::Secret(s) => {
                s.discard();
                fallback
            }
        }
    }

    pub fn unwrap_or_else<F: FnOnce() -> HostValue>(self, fallback: F) -> HostValue {
        match self {
            Guarded::Plain(v) => v,
            Guarded::Secret(s) => {
                s.discard();
                fallback()
            }
        }
    }

    /// The value, if it is readable.
    pub fn plain(self) -> Option<HostValue> {
        match self {
            Guarded::Plain(v) => Some(v),
            Guarded::Secret(_) => None,
        }
    }
}

/// Classifies and safely unwraps host values.
#[derive(Clone)]
pub struct SecretValueGuard {
    check: Option<Arc<dyn OpacityCheck>>,
}

impl SecretValueGuard {
    pub fn new(check: Option<Arc<dyn OpacityCheck>>) -> Self {
        Self { check }
    }

    pub fn from_host(host: &dyn Host) -> Self {
        let check = host.opacity_check();
        if check.is_none() {
            tracing::debug!("host has no opacity primitive; no value will be treated as secret");
        }
        Self::new(check)
    }

    /// A guard for hosts that predate protected values.
    pub fn disabled() -> Self {
        Self { check: None }
    }

    pub fn has_opacity_primitive(&self) -> bool {
        self.check.is_some()
    }

    pub fn is_secret(&self, value: &HostValue) -> bool {
        self.check
            .as_ref()
            .map(|c| c.is_secret(value))
            .unwrap_or(false)
    }

    pub fn safe_unwrap(&self, value: HostValue, fallback: HostValue) -> HostValue {
        self.classify(value).unwrap_or(fallback)
    }

    pub fn classify(&self, value: HostValue) -> Guarded {
        if self.is_secret(&value) {
            Guarded::Secret(SecretValue(value))
        } else {
            Guarded::Plain(value)
        }
    }

    pub fn classify_all(&self, values: Vec<HostValue>) -> Vec<Guarded> {
        values.into_iter().map(|v| self.classify(v)).collect()
    }
}

impl fmt::Debug for SecretValueGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValueGuard")
            .field("opacity_primitive", &self.has_opacity_primitive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MarkerOpacity, SimulatedHost};
    use serde_json::json;

    fn active_guard() -> SecretValueGuard {
        SecretValueGuard::new(Some(Arc::new(MarkerOpacity)))
    }

    #[test]
    fn test_ordinary_values_are_not_secret() {
        let guard = active_guard();
        for v in [json!(null), json!(3), json!("text"), json!([1, 2]), json!({"a": 1})] {
            assert!(!guard.is_secret(&v));
        }
    }

    #[test]
    fn test_absent_primitive_never_reports_secret() {
        let guard = SecretValueGuard::from_host(&SimulatedHost::new());
        assert!(!guard.has_opacity_primitive());
        assert!(!guard.is_secret(&SimulatedHost::secret(json!(5))));
    }

    #[test]
    fn test_safe_unwrap() {
        let guard = active_guard();
        assert_eq!(guard.safe_unwrap(json!(7), json!(0)), json!(7));
        assert_eq!(
            guard.safe_unwrap(SimulatedHost::secret(json!(7)), json!(0)),
            json!(0)
        );
    }

    #[test]
    fn test_classify_and_redaction() {
        let guard = active_guard();
        let classified = guard.classify_all(vec![json!("Buff"), SimulatedHost::secret(json!(12))]);
        assert!(!classified[0].is_secret());
        assert!(classified[1].is_secret());
        assert_eq!(format!("{:?}", classified[1]), "Secret(SecretValue(<redacted>))");

        let mut iter = classified.into_iter();
        assert_eq!(iter.next().and_then(Guarded::plain), Some(json!("Buff")));
        assert_eq!(iter.next().map(|g| g.unwrap_or_else(|| json!(-1))), Some(json!(-1)));
    }
}
