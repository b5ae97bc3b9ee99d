use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Stable name of a logical operation whose implementation varies by host
/// version, e.g. `"GetAuraByIndex"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityKey(Cow<'static, str>);

impl CapabilityKey {
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for CapabilityKey {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}

impl From<String> for CapabilityKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl Borrow<str> for CapabilityKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CapabilityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
