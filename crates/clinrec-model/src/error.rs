use thiserror::Error;

/// Failure reported by an external lookup provider (schema, predicate index,
/// vocabulary sets, translation tables). Propagated as-is; the core never retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{resource} lookup failed: {message}")]
    Unavailable { resource: String, message: String },
    #[error("{resource} is malformed: {message}")]
    Malformed { resource: String, message: String },
}

impl LookupError {
    pub fn unavailable(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn malformed(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Identifier of the resource whose lookup failed.
    pub fn resource(&self) -> &str {
        match self {
            Self::Unavailable { resource, .. } | Self::Malformed { resource, .. } => resource,
        }
    }
}
