//! Error types for predicate evaluation.

use clinrec_model::PredicateKind;
use clinrec_terminology::TerminologyError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The caller supplied a modifier, comparator or value the predicate kind
    /// does not support.
    #[error("invalid {kind} predicate '{code}': {reason}")]
    PredicateConfig {
        code: String,
        kind: PredicateKind,
        reason: String,
    },

    /// Membership could not be determined.
    #[error("cannot determine membership: {0}")]
    Terminology(#[from] TerminologyError),
}

impl FilterError {
    pub(crate) fn config(code: &str, kind: PredicateKind, reason: impl Into<String>) -> Self {
        Self::PredicateConfig {
            code: code.to_string(),
            kind,
            reason: reason.into(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::PredicateConfig { .. })
    }
}
