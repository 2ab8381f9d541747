//! Data model for reconstructing nested clinical records from flattened rows.
//!
//! - **row**: raw rows, row entries and the per-record path index
//! - **schema**: schema descriptors walked by the hydrator
//! - **path**: per-path vocabulary bindings and predicate kinds
//! - **predicate**: caller predicates and evaluation outcomes
//! - **terminology**: codings, vocabulary sets, translation tables
//! - **value**: hydrated document values
//! - **provider**: schema / predicate-index lookup contracts

#![deny(unsafe_code)]

pub mod error;
pub mod lookup;
pub mod options;
pub mod path;
pub mod predicate;
pub mod provider;
pub mod row;
pub mod schema;
pub mod terminology;
pub mod value;

pub use error::LookupError;
pub use options::{HydrationOptions, RowLayout, TranslationMode};
pub use path::{PathDescriptor, PathIndex};
pub use predicate::{EvaluationOutcome, Predicate, PredicateKind};
pub use provider::{
    InMemoryPredicateIndex, InMemorySchemas, PredicateDefinition, PredicateIndexProvider,
    PredicateMap, SchemaProvider,
};
pub use row::{RawRow, RecordIndex, RowEntry};
pub use schema::{FieldDef, FieldType, RecordSchema};
pub use terminology::{
    Coding, Equivalence, TranslationEntry, TranslationResult, TranslationTable, ValidationResult,
    VocabularySet, WildcardTarget,
};
pub use value::{DateValue, Quantity, Value};
