//! Error types for hydration.

use clinrec_filter::FilterError;
use thiserror::Error;

/// A record-scoped hydration failure. Sibling records are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrationError {
    /// A raw value could not be coerced into the declared leaf kind.
    ///
    /// The offending value is kept for callers that may show it; it is not part of
    /// the message.
    #[error("cannot read value at {path} as {kind}")]
    Type {
        path: String,
        kind: &'static str,
        value: String,
    },

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl HydrationError {
    pub(crate) fn type_mismatch(path: &str, kind: &'static str, value: &str) -> Self {
        Self::Type {
            path: path.to_string(),
            kind,
            value: value.to_string(),
        }
    }

    /// Path of the field that failed, when the failure is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Type { path, .. } => Some(path),
            Self::Filter(_) => None,
        }
    }
}
