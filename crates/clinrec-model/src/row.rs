//! Row-level model: raw relational rows and the per-record path index built from them.
//!
//! A [`RecordIndex`] maps a hierarchical path (dot-separated, lower-cased, no array
//! brackets) to the ordered [`RowEntry`] list for one logical record. Each entry
//! carries a local identity and the identity of the entry it hangs under at the
//! immediate parent path (empty when it attaches directly to its structural owner).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::lookup::normalize_key;

/// One relational row as delivered by a row source: ordered `(column, value)` cells.
///
/// Null cells are represented as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub cells: Vec<(String, Option<String>)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell; builder style for tests and in-memory sources.
    #[must_use]
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.cells.push((column.to_string(), Some(value.to_string())));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.cells.push((column.into(), value));
    }

    /// Value of the first cell whose column matches `column` case-insensitively.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(column))
            .and_then(|(_, value)| value.as_deref())
    }
}

/// One relational row mapped to one node instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowEntry {
    pub local_id: String,
    /// Empty when the node attaches directly under its structural owner.
    pub parent_id: String,
    /// Attribute values keyed by lower-cased attribute name. Never holds identity
    /// or path metadata.
    pub fields: BTreeMap<String, String>,
}

impl RowEntry {
    pub fn new(local_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            parent_id: parent_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(normalize_key(name), value.to_string());
        self
    }

    /// Case-insensitive field access.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&normalize_key(name)).map(String::as_str)
    }

    /// Whether this entry hangs under the given parent identity.
    pub fn attaches_to(&self, parent_id: &str) -> bool {
        self.parent_id.is_empty() || self.parent_id == parent_id
    }
}

/// Per-record mapping from hierarchical path to ordered row entries.
///
/// Mutated only while rows are being indexed; hydration takes it by shared reference.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    record_id: String,
    paths: BTreeMap<String, Vec<RowEntry>>,
    positions: HashMap<String, HashMap<String, usize>>,
}

impl RecordIndex {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            ..Self::default()
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Return the entry for `(path, local_id)`, creating it when absent.
    ///
    /// Re-encountering an existing pair never duplicates it. A blank stored parent
    /// identity is filled in from a later non-blank one.
    pub fn entry_mut(&mut self, path: &str, local_id: &str, parent_id: &str) -> &mut RowEntry {
        let path = normalize_key(path);
        let entries = self.paths.entry(path.clone()).or_default();
        let positions = self.positions.entry(path).or_default();
        let position = match positions.get(local_id) {
            Some(position) => *position,
            None => {
                entries.push(RowEntry::new(local_id, parent_id));
                positions.insert(local_id.to_string(), entries.len() - 1);
                entries.len() - 1
            }
        };
        let entry = &mut entries[position];
        if entry.parent_id.is_empty() && !parent_id.is_empty() {
            entry.parent_id = parent_id.to_string();
        }
        entry
    }

    /// Merge one attribute value into the entry at `(path, local_id)`; last write wins.
    pub fn merge_field(
        &mut self,
        path: &str,
        local_id: &str,
        parent_id: &str,
        name: &str,
        value: &str,
    ) {
        self.entry_mut(path, local_id, parent_id)
            .fields
            .insert(normalize_key(name), value.to_string());
    }

    /// All entries recorded at `path`, in insertion order.
    pub fn entries(&self, path: &str) -> &[RowEntry] {
        self.paths
            .get(&normalize_key(path))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries at `path` that attach under `parent_id`.
    pub fn attached<'a>(
        &'a self,
        path: &str,
        parent_id: &'a str,
    ) -> impl Iterator<Item = &'a RowEntry> + 'a {
        self.entries(path)
            .iter()
            .filter(move |entry| entry.attaches_to(parent_id))
    }

    pub fn contains_path(&self, path: &str) -> bool {
        !self.entries(path).is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Total number of entries across all paths.
    pub fn len(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
