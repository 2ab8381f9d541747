//! Per-path metadata shared read-only by hydration and filtering.
//!
//! A [`PathDescriptor`] merges two independent sources: the controlled vocabulary
//! bound to a coded field (from the schema) and the predicate codes that apply at
//! the path (from the predicate index). A [`PathIndex`] is built once and passed
//! explicitly; rebuilding means constructing a new index and swapping the `Arc`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::LookupError;
use crate::lookup::normalize_key;
use crate::predicate::PredicateKind;
use crate::provider::{PredicateIndexProvider, SchemaProvider};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PathDescriptor {
    /// Bound controlled-vocabulary identifier, if the field is coded.
    pub vocabulary: Option<String>,
    /// Predicate code → predicate kind.
    pub predicates: BTreeMap<String, PredicateKind>,
}

impl PathDescriptor {
    pub fn kind_of(&self, code: &str) -> Option<PredicateKind> {
        self.predicates.get(&normalize_key(code)).copied()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PathIndex {
    paths: BTreeMap<String, PathDescriptor>,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the descriptors for one record type from its schema and predicate index.
    pub fn build(
        record_type: &str,
        schemas: &dyn SchemaProvider,
        predicates: &dyn PredicateIndexProvider,
    ) -> Result<Self, LookupError> {
        let mut index = Self::new();
        index.extend_from(record_type, schemas, predicates)?;
        Ok(index)
    }

    /// Merge the descriptors of another record type into this index.
    pub fn extend_from(
        &mut self,
        record_type: &str,
        schemas: &dyn SchemaProvider,
        predicates: &dyn PredicateIndexProvider,
    ) -> Result<(), LookupError> {
        let schema = schemas
            .record_schema(record_type)?
            .ok_or_else(|| LookupError::unavailable(record_type, "no schema for record type"))?;
        schema.walk(|path, field| {
            if let Some(vocabulary) = &field.binding {
                self.bind_vocabulary(path, vocabulary);
            }
        });
        for (path, codes) in predicates.predicate_index(record_type)? {
            for (code, kind) in codes {
                self.add_predicate(&path, &code, kind);
            }
        }
        Ok(())
    }

    pub fn bind_vocabulary(&mut self, path: &str, vocabulary: &str) {
        self.paths.entry(normalize_key(path)).or_default().vocabulary =
            Some(vocabulary.to_string());
    }

    pub fn add_predicate(&mut self, path: &str, code: &str, kind: PredicateKind) {
        self.paths
            .entry(normalize_key(path))
            .or_default()
            .predicates
            .insert(normalize_key(code), kind);
    }

    pub fn descriptor(&self, path: &str) -> Option<&PathDescriptor> {
        self.paths.get(&normalize_key(path))
    }

    pub fn vocabulary(&self, path: &str) -> Option<&str> {
        self.descriptor(path)
            .and_then(|descriptor| descriptor.vocabulary.as_deref())
    }

    /// Kind of predicate `code` at `path`, when the pair is declared indexable.
    pub fn predicate_kind(&self, path: &str, code: &str) -> Option<PredicateKind> {
        self.descriptor(path)
            .and_then(|descriptor| descriptor.kind_of(code))
    }

    pub fn paths(&self) -> impl Iterator<Item = (&str, &PathDescriptor)> {
        self.paths
            .iter()
            .map(|(path, descriptor)| (path.as_str(), descriptor))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
