//! Configuration options for row indexing and hydration.

use serde::{Deserialize, Serialize};

/// Names of the reserved metadata columns carried by every raw row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowLayout {
    pub local_id_column: String,
    pub parent_id_column: String,
    pub path_column: String,
    pub record_id_column: String,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            local_id_column: "_local_id".to_string(),
            parent_id_column: "_parent_id".to_string(),
            path_column: "_path".to_string(),
            record_id_column: "_record_id".to_string(),
        }
    }
}

impl RowLayout {
    /// Whether `column` is one of the reserved metadata columns.
    pub fn is_reserved(&self, column: &str) -> bool {
        let column = column.trim();
        [
            &self.local_id_column,
            &self.parent_id_column,
            &self.path_column,
            &self.record_id_column,
        ]
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(column))
    }
}

/// Whether coded leaves are run through code translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// Translate coded leaves through tables targeting the bound vocabulary.
    #[default]
    Enabled,
    /// Keep recorded codes as they are.
    Disabled,
}

/// Options controlling hydration behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrationOptions {
    pub translation: TranslationMode,

    /// Suppress duplicate `(system, code)` pairs within one array-valued coding field.
    pub dedupe_codings: bool,
}

impl Default for HydrationOptions {
    fn default() -> Self {
        Self {
            translation: TranslationMode::Enabled,
            dedupe_codings: true,
        }
    }
}

impl HydrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_translation(mut self, mode: TranslationMode) -> Self {
        self.translation = mode;
        self
    }

    #[must_use]
    pub fn with_dedupe_codings(mut self, enable: bool) -> Self {
        self.dedupe_codings = enable;
        self
    }
}
