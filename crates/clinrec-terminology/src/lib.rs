//! Terminology resolution: vocabulary membership and code translation.
//!
//! - [`VocabularyValidator`] checks `(system, code)` membership in a vocabulary
//!   set, expanding composed sets concurrently.
//! - [`CodeTranslator`] maps source codes to target codes through translation
//!   tables, with wildcard fallback for bare codes.
//!
//! Both read their resources through provider traits and never mutate them.

#![deny(unsafe_code)]

pub mod error;
pub mod provider;
pub mod translator;
pub mod validator;

use std::sync::Arc;

pub use error::TerminologyError;
pub use provider::{
    InMemoryTranslationTables, InMemoryVocabularySets, TranslationTableProvider,
    VocabularySetProvider,
};
pub use translator::CodeTranslator;
pub use validator::VocabularyValidator;

/// The validator and translator pair shared by hydration and filtering.
#[derive(Debug, Clone)]
pub struct TerminologyResolver {
    pub validator: VocabularyValidator,
    pub translator: CodeTranslator,
}

impl TerminologyResolver {
    pub fn new(
        sets: Arc<dyn VocabularySetProvider>,
        tables: Arc<dyn TranslationTableProvider>,
    ) -> Self {
        Self {
            validator: VocabularyValidator::new(sets),
            translator: CodeTranslator::new(tables),
        }
    }

    /// A resolver with no vocabulary sets and no translation tables.
    pub fn empty() -> Self {
        Self::new(
            Arc::new(InMemoryVocabularySets::new()),
            Arc::new(InMemoryTranslationTables::default()),
        )
    }
}
