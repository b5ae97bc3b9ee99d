//! One-shot capture of the running host version.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use super::{InterfaceVersion, DEFAULT_MINIMUM_KNOWN, MIDNIGHT_THRESHOLD};
use crate::host::Host;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Capture {
    version: InterfaceVersion,
    used_fallback: bool,
}

/// Lifecycle of an oracle. `Cached` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleState {
    Uninitialized,
    Cached,
}

/// Queries the host for its interface version exactly once and answers every
/// later comparison from the cached value.
///
/// The oracle is an explicit instance rather than ambient state: construct one
/// per host and share it by reference. Tests use [`VersionOracle::fixed`].
pub struct VersionOracle {
    host: Option<Arc<dyn Host>>,
    minimum_known: InterfaceVersion,
    cached: OnceCell<Capture>,
}

impl VersionOracle {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self::with_minimum_known(host, DEFAULT_MINIMUM_KNOWN)
    }

    /// `minimum_known` is reported when the host has no version primitive.
    pub fn with_minimum_known(host: Arc<dyn Host>, minimum_known: InterfaceVersion) -> Self {
        Self {
            host: Some(host),
            minimum_known,
            cached: OnceCell::new(),
        }
    }

    /// An oracle that is already cached at `version` and never touches a host.
    pub fn fixed(version: InterfaceVersion) -> Self {
        Self {
            host: None,
            minimum_known: version,
            cached: OnceCell::with_value(Capture {
                version,
                used_fallback: false,
            }),
        }
    }

    pub fn get_version(&self) -> InterfaceVersion {
        self.capture().version
    }

    pub fn is_at_least(&self, threshold: InterfaceVersion) -> bool {
        self.get_version() >= threshold
    }

    pub fn is_midnight_or_later(&self) -> bool {
        self.is_at_least(MIDNIGHT_THRESHOLD)
    }

    /// Whether the captured version came from the configured minimum rather
    /// than the host. Forces capture.
    pub fn used_fallback(&self) -> bool {
        self.capture().used_fallback
    }

    pub fn state(&self) -> OracleState {
        if self.cached.get().is_some() {
            OracleState::Cached
        } else {
            OracleState::Uninitialized
        }
    }

    pub fn minimum_known(&self) -> InterfaceVersion {
        self.minimum_known
    }

    fn capture(&self) -> Capture {
        *self.cached.get_or_init(|| {
            let reported = self.host.as_ref().and_then(|h| h.interface_version());
            match reported {
                Some(version) => {
                    tracing::debug!(%version, "captured host interface version");
                    Capture {
                        version,
                        used_fallback: false,
                    }
                }
                None => {
                    tracing::warn!(
                        fallback = %self.minimum_known,
                        "host has no version query primitive; assuming minimum known version"
                    );
                    Capture {
                        version: self.minimum_known,
                        used_fallback: true,
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for VersionOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionOracle")
            .field("minimum_known", &self.minimum_known)
            .field("cached", &self.cached.get().map(|c| c.version))
            .finish()
    }
}
