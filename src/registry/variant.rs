use crate::host::{HostFn, HostValue};
use crate::version::VersionPredicate;

/// One version-scoped implementation of a capability.
#[derive(Debug, Clone)]
pub struct Variant {
    predicate: VersionPredicate,
    implementation: HostFn,
    priority: i32,
    sequence: u64,
    label: Option<String>,
}

impl Variant {
    pub(crate) fn new(
        predicate: VersionPredicate,
        implementation: HostFn,
        priority: i32,
        sequence: u64,
        label: Option<String>,
    ) -> Self {
        Self {
            predicate,
            implementation,
            priority,
            sequence,
            label,
        }
    }

    pub fn predicate(&self) -> &VersionPredicate {
        &self.predicate
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Registration order across the whole registry, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn implementation(&self) -> &HostFn {
        &self.implementation
    }

    pub fn invoke(&self, args: &[HostValue]) -> Vec<HostValue> {
        self.implementation.invoke(args)
    }
}
