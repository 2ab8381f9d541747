//! Terminology resources: codings, vocabulary sets and translation tables.
//!
//! These are owned by external caches; the core only borrows them for the duration
//! of one resolution call.
//!
//! - A **VocabularySet** is a named set of `(system, code)` pairs that may also
//!   include other sets by reference (set union).
//! - A **TranslationTable** maps `(source system, source code)` to a target code,
//!   with at most one wildcard entry matching any source code.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A coded value: optional system plus code, with optional display text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: Option<&str>, code: &str) -> Self {
        Self {
            system: system.filter(|s| !s.is_empty()).map(String::from),
            code: code.to_string(),
            display: None,
        }
    }

    #[must_use]
    pub fn with_display(mut self, display: &str) -> Self {
        self.display = Some(display.to_string());
        self
    }

    /// Identity used for duplicate suppression: `(system, code)`.
    pub fn key(&self) -> (Option<&str>, &str) {
        (self.system.as_deref(), self.code.as_str())
    }

    /// Parse `system|code`, `|code` or bare `code`.
    pub fn parse_token(raw: &str) -> Self {
        match raw.split_once('|') {
            Some((system, code)) => Self::new(Some(system), code),
            None => Self::new(None, raw),
        }
    }
}

impl fmt::Display for Coding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.system {
            Some(system) => write!(f, "{system}|{}", self.code),
            None => write!(f, "{}", self.code),
        }
    }
}

/// A named set of `(system, code)` pairs, optionally composed of other sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySet {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Codes by system. Codes without a system are stored under `""`.
    #[serde(default)]
    pub codes: BTreeMap<String, BTreeSet<String>>,
    /// References to composed vocabulary sets.
    #[serde(default)]
    pub includes: Vec<String>,
}

impl VocabularySet {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_code(mut self, system: &str, code: &str) -> Self {
        self.add_code(system, code);
        self
    }

    #[must_use]
    pub fn including(mut self, url: &str) -> Self {
        self.includes.push(url.to_string());
        self
    }

    pub fn add_code(&mut self, system: &str, code: &str) {
        self.codes
            .entry(system.to_string())
            .or_default()
            .insert(code.to_string());
    }

    /// Direct membership. A coding without a system matches the code in any system.
    pub fn contains(&self, system: Option<&str>, code: &str) -> bool {
        match system.filter(|s| !s.is_empty()) {
            Some(system) => self
                .codes
                .get(system)
                .is_some_and(|codes| codes.contains(code)),
            None => self.codes.values().any(|codes| codes.contains(code)),
        }
    }

    pub fn is_composed(&self) -> bool {
        !self.includes.is_empty()
    }

    /// Number of directly listed codes.
    pub fn code_count(&self) -> usize {
        self.codes.values().map(BTreeSet::len).sum()
    }
}

/// ConceptMap-style relationship between a source and a target code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equivalence {
    #[default]
    Equivalent,
    Equal,
    Wider,
    Narrower,
    Inexact,
    RelatedTo,
    Unmatched,
    Disjoint,
}

impl Equivalence {
    /// Whether an entry with this equivalence yields a usable target code.
    pub fn is_mapping(self) -> bool {
        !matches!(self, Self::Unmatched | Self::Disjoint)
    }
}

/// One source → target row of a translation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_system: Option<String>,
    pub source_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_system: Option<String>,
    pub target_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_display: Option<String>,
    #[serde(default)]
    pub equivalence: Equivalence,
}

impl TranslationEntry {
    pub fn new(source_code: &str, target_code: &str) -> Self {
        Self {
            source_system: None,
            source_code: source_code.to_string(),
            target_system: None,
            target_code: target_code.to_string(),
            target_display: None,
            equivalence: Equivalence::default(),
        }
    }

    /// Source match: codes equal and, when both sides carry a system, systems equal.
    pub fn matches(&self, system: Option<&str>, code: &str) -> bool {
        if self.source_code != code {
            return false;
        }
        match (self.source_system.as_deref(), system) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        }
    }
}

/// Target used for any source code without a direct entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WildcardTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_system: Option<String>,
    pub target_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_display: Option<String>,
    #[serde(default)]
    pub equivalence: Equivalence,
}

/// A named source → target code table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationTable {
    pub id: String,
    /// Source vocabulary identifier, informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Target vocabulary identifier; drives table selection.
    pub target: String,
    #[serde(default)]
    pub entries: Vec<TranslationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wildcard: Option<WildcardTarget>,
}

impl TranslationTable {
    pub fn new(id: &str, target: &str) -> Self {
        Self {
            id: id.to_string(),
            source: None,
            target: target.to_string(),
            entries: Vec::new(),
            wildcard: None,
        }
    }

    #[must_use]
    pub fn with_entry(mut self, entry: TranslationEntry) -> Self {
        self.entries.push(entry);
        self
    }

    #[must_use]
    pub fn with_wildcard(mut self, target_code: &str) -> Self {
        self.wildcard = Some(WildcardTarget {
            target_system: None,
            target_code: target_code.to_string(),
            target_display: None,
            equivalence: Equivalence::Inexact,
        });
        self
    }

    /// First direct entry for the source code.
    pub fn find(&self, system: Option<&str>, code: &str) -> Option<&TranslationEntry> {
        self.entries.iter().find(|entry| entry.matches(system, code))
    }
}

/// Outcome of a successful translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationResult {
    pub table: String,
    pub target_system: Option<String>,
    pub target_code: String,
    pub target_display: Option<String>,
    pub equivalence: Equivalence,
    /// Produced by the table's wildcard entry.
    pub wildcard: bool,
}

impl TranslationResult {
    pub fn from_entry(table: &str, entry: &TranslationEntry) -> Self {
        Self {
            table: table.to_string(),
            target_system: entry.target_system.clone(),
            target_code: entry.target_code.clone(),
            target_display: entry.target_display.clone(),
            equivalence: entry.equivalence,
            wildcard: false,
        }
    }

    pub fn from_wildcard(table: &str, wildcard: &WildcardTarget) -> Self {
        Self {
            table: table.to_string(),
            target_system: wildcard.target_system.clone(),
            target_code: wildcard.target_code.clone(),
            target_display: wildcard.target_display.clone(),
            equivalence: wildcard.equivalence,
            wildcard: true,
        }
    }
}

/// Outcome of a vocabulary membership check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Vocabulary set in which the code was found.
    pub matched_in: Option<String>,
    /// Set when membership could not be established (e.g. unknown vocabulary).
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn member_of(url: &str) -> Self {
        Self {
            valid: true,
            matched_in: Some(url.to_string()),
            message: None,
        }
    }

    pub fn not_member() -> Self {
        Self {
            valid: false,
            matched_in: None,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            matched_in: None,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.valid && self.message.is_some()
    }
}
