//! Code translation through translation tables.

use std::sync::Arc;

use clinrec_model::TranslationResult;
use tracing::{debug, warn};

use crate::error::TerminologyError;
use crate::provider::TranslationTableProvider;

/// Maps source codes to target codes using tables selected by target vocabulary.
#[derive(Clone)]
pub struct CodeTranslator {
    tables: Arc<dyn TranslationTableProvider>,
}

impl CodeTranslator {
    pub fn new(tables: Arc<dyn TranslationTableProvider>) -> Self {
        Self { tables }
    }

    /// Identifiers of the tables declared to target `vocabulary`.
    pub fn tables_for(&self, vocabulary: &str) -> Result<Vec<String>, TerminologyError> {
        Ok(self.tables.tables_for_target(vocabulary)?)
    }

    /// Translate `code` using the first applicable table in `table_refs`.
    ///
    /// Within a table a direct entry wins; otherwise, for bare codes only
    /// (`is_code_kind`), the table's wildcard entry applies. An entry marked
    /// `unmatched` or `disjoint` ends the search in that table. `Ok(None)` means the
    /// code is untranslatable and should pass through unchanged.
    pub fn translate(
        &self,
        table_refs: &[String],
        system: Option<&str>,
        code: &str,
        is_code_kind: bool,
    ) -> Result<Option<TranslationResult>, TerminologyError> {
        for table_ref in table_refs {
            let Some(table) = self.tables.table(table_ref)? else {
                warn!(table = %table_ref, "translation table not found");
                continue;
            };
            if let Some(entry) = table.find(system, code) {
                if entry.equivalence.is_mapping() {
                    debug!(table = %table.id, target = %entry.target_code, "direct translation");
                    return Ok(Some(TranslationResult::from_entry(&table.id, entry)));
                }
                debug!(table = %table.id, equivalence = ?entry.equivalence, "explicitly unmapped");
                continue;
            }
            if is_code_kind
                && let Some(wildcard) = &table.wildcard
                && wildcard.equivalence.is_mapping()
            {
                debug!(table = %table.id, target = %wildcard.target_code, "wildcard translation");
                return Ok(Some(TranslationResult::from_wildcard(&table.id, wildcard)));
            }
        }
        Ok(None)
    }

    /// Translate through every table targeting `vocabulary`.
    pub fn translate_into(
        &self,
        vocabulary: &str,
        system: Option<&str>,
        code: &str,
        is_code_kind: bool,
    ) -> Result<Option<TranslationResult>, TerminologyError> {
        let table_refs = self.tables_for(vocabulary)?;
        if table_refs.is_empty() {
            return Ok(None);
        }
        self.translate(&table_refs, system, code, is_code_kind)
    }
}

impl std::fmt::Debug for CodeTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeTranslator").finish_non_exhaustive()
    }
}
