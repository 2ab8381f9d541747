//! Lookup contracts for vocabulary sets and translation tables.
//!
//! Providers own caching, refresh and remote access; the resolvers treat each
//! call as one blocking lookup and never retry.

use std::collections::BTreeMap;
use std::sync::Arc;

use clinrec_model::{LookupError, TranslationTable, VocabularySet};

/// Resolves a vocabulary identifier / URL to its set.
pub trait VocabularySetProvider: Send + Sync {
    fn vocabulary_set(&self, reference: &str) -> Result<Option<Arc<VocabularySet>>, LookupError>;
}

/// Resolves translation tables by identifier and by target vocabulary.
pub trait TranslationTableProvider: Send + Sync {
    fn table(&self, id: &str) -> Result<Option<Arc<TranslationTable>>, LookupError>;

    /// Identifiers of the tables whose declared target is `vocabulary`, in load order.
    fn tables_for_target(&self, vocabulary: &str) -> Result<Vec<String>, LookupError>;
}

/// Vocabulary sets held in memory, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVocabularySets {
    sets: BTreeMap<String, Arc<VocabularySet>>,
}

impl InMemoryVocabularySets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, set: VocabularySet) {
        self.sets.insert(set.url.clone(), Arc::new(set));
    }

    #[must_use]
    pub fn with(mut self, set: VocabularySet) -> Self {
        self.insert(set);
        self
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl FromIterator<VocabularySet> for InMemoryVocabularySets {
    fn from_iter<I: IntoIterator<Item = VocabularySet>>(iter: I) -> Self {
        let mut sets = Self::new();
        for set in iter {
            sets.insert(set);
        }
        sets
    }
}

impl VocabularySetProvider for InMemoryVocabularySets {
    fn vocabulary_set(&self, reference: &str) -> Result<Option<Arc<VocabularySet>>, LookupError> {
        Ok(self.sets.get(reference.trim()).cloned())
    }
}

/// Translation tables held in memory, with the target → table index built once.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranslationTables {
    tables: BTreeMap<String, Arc<TranslationTable>>,
    by_target: BTreeMap<String, Vec<String>>,
}

impl InMemoryTranslationTables {
    pub fn new(tables: Vec<TranslationTable>) -> Self {
        let mut index = Self::default();
        for table in tables {
            let ids = index.by_target.entry(table.target.clone()).or_default();
            if !ids.contains(&table.id) {
                ids.push(table.id.clone());
            }
            index.tables.insert(table.id.clone(), Arc::new(table));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TranslationTableProvider for InMemoryTranslationTables {
    fn table(&self, id: &str) -> Result<Option<Arc<TranslationTable>>, LookupError> {
        Ok(self.tables.get(id).cloned())
    }

    fn tables_for_target(&self, vocabulary: &str) -> Result<Vec<String>, LookupError> {
        Ok(self
            .by_target
            .get(vocabulary.trim())
            .cloned()
            .unwrap_or_default())
    }
}
