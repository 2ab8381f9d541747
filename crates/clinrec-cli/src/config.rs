//! `clinrec.toml` loading and resource resolution.
//!
//! ```toml
//! [resources]
//! schemas = "schemas.json"
//! predicates = "predicates.json"
//! vocabularies = "vocabularies.json"
//! translations = "translations.json"
//!
//! [layout]
//! record_id_column = "subject"
//!
//! [hydration]
//! translation = "disabled"
//! ```
//!
//! Relative resource paths are resolved against the directory of the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clinrec_model::{
    HydrationOptions, InMemoryPredicateIndex, InMemorySchemas, PathIndex, PredicateDefinition,
    RecordSchema, RowLayout, SchemaProvider, TranslationTable, VocabularySet,
};
use clinrec_terminology::{
    InMemoryTranslationTables, InMemoryVocabularySets, TerminologyResolver, TranslationTableProvider,
    VocabularySetProvider,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClinrecConfig {
    pub resources: ResourcePaths,
    #[serde(default)]
    pub layout: RowLayout,
    #[serde(default)]
    pub hydration: HydrationOptions,
}

/// JSON resource files. Only `schemas` is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePaths {
    pub schemas: PathBuf,
    #[serde(default)]
    pub predicates: Option<PathBuf>,
    #[serde(default)]
    pub vocabularies: Option<PathBuf>,
    #[serde(default)]
    pub translations: Option<PathBuf>,
}

impl ClinrecConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&text).with_context(|| format!("parse config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resources.resolve_against(base);
        Ok(config)
    }
}

impl ResourcePaths {
    fn resolve_against(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.schemas);
        for path in [
            &mut self.predicates,
            &mut self.vocabularies,
            &mut self.translations,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }
}

/// Everything a command needs, loaded once from the config's resource files.
#[derive(Debug)]
pub struct Resources {
    pub schemas: InMemorySchemas,
    pub predicates: InMemoryPredicateIndex,
    pub vocabularies: Arc<InMemoryVocabularySets>,
    pub translations: Arc<InMemoryTranslationTables>,
    pub layout: RowLayout,
    pub hydration: HydrationOptions,
}

impl Resources {
    pub fn load(config: &ClinrecConfig) -> Result<Self> {
        let paths = &config.resources;
        let schemas: Vec<RecordSchema> = read_json(&paths.schemas)?;
        let predicates: Vec<PredicateDefinition> = read_optional_json(paths.predicates.as_deref())?;
        let vocabularies: Vec<VocabularySet> = read_optional_json(paths.vocabularies.as_deref())?;
        let translations: Vec<TranslationTable> =
            read_optional_json(paths.translations.as_deref())?;
        debug!(
            schemas = schemas.len(),
            predicates = predicates.len(),
            vocabularies = vocabularies.len(),
            translations = translations.len(),
            "loaded resources"
        );
        Ok(Self {
            schemas: schemas.into_iter().collect(),
            predicates: InMemoryPredicateIndex::new(predicates),
            vocabularies: Arc::new(vocabularies.into_iter().collect()),
            translations: Arc::new(InMemoryTranslationTables::new(translations)),
            layout: config.layout.clone(),
            hydration: config.hydration.clone(),
        })
    }

    pub fn terminology(&self) -> TerminologyResolver {
        TerminologyResolver::new(
            Arc::clone(&self.vocabularies) as Arc<dyn VocabularySetProvider>,
            Arc::clone(&self.translations) as Arc<dyn TranslationTableProvider>,
        )
    }

    pub fn schema(&self, record_type: &str) -> Result<Arc<RecordSchema>> {
        self.schemas
            .record_schema(record_type)?
            .with_context(|| format!("no schema for record type '{record_type}'"))
    }

    pub fn path_index(&self, record_type: &str) -> Result<PathIndex> {
        PathIndex::build(record_type, &self.schemas, &self.predicates)
            .with_context(|| format!("build path index for '{record_type}'"))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read resource {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse resource {}", path.display()))
}

fn read_optional_json<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Vec::new()),
    }
}
