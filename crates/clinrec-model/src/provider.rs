//! Schema and predicate-definition lookup contracts, with in-memory providers.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::lookup::normalize_key;
use crate::predicate::PredicateKind;
use crate::schema::RecordSchema;

/// Path → predicate code → predicate kind, for one record type.
pub type PredicateMap = BTreeMap<String, BTreeMap<String, PredicateKind>>;

/// Supplies the field shape of a record type.
pub trait SchemaProvider: Send + Sync {
    fn record_schema(&self, record_type: &str) -> Result<Option<Arc<RecordSchema>>, LookupError>;
}

/// Supplies the predicate definitions applicable to a record type.
pub trait PredicateIndexProvider: Send + Sync {
    fn predicate_index(&self, record_type: &str) -> Result<PredicateMap, LookupError>;
}

/// Schemas held in memory, keyed by lower-cased record type.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemas {
    by_type: BTreeMap<String, Arc<RecordSchema>>,
}

impl InMemorySchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, schema: RecordSchema) {
        self.by_type
            .insert(normalize_key(&schema.record_type), Arc::new(schema));
    }

    #[must_use]
    pub fn with(mut self, schema: RecordSchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.by_type
            .values()
            .map(|schema| schema.record_type.as_str())
    }
}

impl FromIterator<RecordSchema> for InMemorySchemas {
    fn from_iter<I: IntoIterator<Item = RecordSchema>>(iter: I) -> Self {
        let mut schemas = Self::new();
        for schema in iter {
            schemas.insert(schema);
        }
        schemas
    }
}

impl SchemaProvider for InMemorySchemas {
    fn record_schema(&self, record_type: &str) -> Result<Option<Arc<RecordSchema>>, LookupError> {
        Ok(self.by_type.get(&normalize_key(record_type)).cloned())
    }
}

/// One predicate definition: a code of a given kind evaluated at one or more paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateDefinition {
    pub code: String,
    pub kind: PredicateKind,
    pub record_type: String,
    /// Paths starting with the record type, e.g. `Patient.birthDate`.
    pub paths: Vec<String>,
}

impl PredicateDefinition {
    pub fn new(code: &str, kind: PredicateKind, record_type: &str, paths: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            kind,
            record_type: record_type.to_string(),
            paths: paths.iter().map(|path| (*path).to_string()).collect(),
        }
    }
}

/// Predicate definitions held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPredicateIndex {
    definitions: Vec<PredicateDefinition>,
}

impl InMemoryPredicateIndex {
    pub fn new(definitions: Vec<PredicateDefinition>) -> Self {
        Self { definitions }
    }

    pub fn definitions(&self) -> &[PredicateDefinition] {
        &self.definitions
    }
}

impl PredicateIndexProvider for InMemoryPredicateIndex {
    fn predicate_index(&self, record_type: &str) -> Result<PredicateMap, LookupError> {
        let mut map = PredicateMap::new();
        for definition in &self.definitions {
            if !definition.record_type.eq_ignore_ascii_case(record_type) {
                continue;
            }
            for path in &definition.paths {
                map.entry(normalize_key(path))
                    .or_default()
                    .insert(normalize_key(&definition.code), definition.kind);
            }
        }
        Ok(map)
    }
}
