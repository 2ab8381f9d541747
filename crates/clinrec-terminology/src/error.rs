//! Error types for terminology resolution.

use clinrec_model::LookupError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TerminologyError {
    /// A vocabulary set composes itself, directly or through other sets.
    #[error("circular vocabulary reference: {}", .chain.join(" -> "))]
    VocabularyCycle { reference: String, chain: Vec<String> },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl TerminologyError {
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::VocabularyCycle { .. })
    }
}
