use thiserror::Error;

use crate::registry::CapabilityKey;
use crate::version::InterfaceVersion;

/// Structured error context for settings and load-phase failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Settings key that caused the error (e.g., "probe_cache_capacity")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "settings_loader", "env")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A missing code path in the compatibility layer or in one of its consumers.
///
/// This is the only failure allowed to propagate out of dispatch. It is never
/// retried and never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("No variant of '{capability}' covers host version {version}{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    NoMatchingVariant {
        capability: CapabilityKey,
        version: InterfaceVersion,
        hint: Option<String>,
    },

    #[error("Capability '{capability}' was never registered{}", .hint.as_ref().map(|h| format!("\n Hint: {}", h)).unwrap_or_default())]
    UnknownCapability {
        capability: CapabilityKey,
        hint: Option<String>,
    },

    #[error("No callable implementation supplied to {site}")]
    NotCallable { site: String },
}

impl ConfigurationError {
    /// Attach an actionable hint to the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        let hint_val = Some(hint.into());
        match self {
            ConfigurationError::NoMatchingVariant { ref mut hint, .. } => *hint = hint_val,
            ConfigurationError::UnknownCapability { ref mut hint, .. } => *hint = hint_val,
            ConfigurationError::NotCallable { .. } => (),
        }
        self
    }

    /// The capability involved, if the error is tied to one.
    pub fn capability(&self) -> Option<&CapabilityKey> {
        match self {
            ConfigurationError::NoMatchingVariant { capability, .. }
            | ConfigurationError::UnknownCapability { capability, .. } => Some(capability),
            ConfigurationError::NotCallable { .. } => None,
        }
    }
}

/// Unified error type for the compatibility layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Settings error: {message}{}", format_context(.context))]
    Settings {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new settings error with structured context
    pub fn settings_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Settings {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Settings { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Returns the configuration error, if this is one.
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Error::Configuration(e) => Some(e),
            _ => None,
        }
    }
}
