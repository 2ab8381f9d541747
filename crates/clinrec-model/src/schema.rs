//! Schema descriptors for target record types.
//!
//! A [`RecordSchema`] enumerates the named, typed fields of one record type so the
//! hydrator can walk any shape generically. Descriptors are plain data, loaded
//! once per record type and shared read-only.
//!
//! ## JSON form
//!
//! ```json
//! {
//!   "recordType": "Observation",
//!   "fields": [
//!     { "name": "status", "kind": "code", "coded": true, "binding": "http://example.org/vs/status" },
//!     { "name": "category", "kind": "composite", "array": true, "fields": [
//!         { "name": "coding", "kind": "coding", "array": true },
//!         { "name": "text", "kind": "string" }
//!     ]}
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::lookup::{join_path, normalize_key};

/// Declared kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldType {
    String,
    /// Bare code from a controlled vocabulary.
    Code,
    Uri,
    Boolean,
    Integer,
    /// Arbitrary-precision number; the textual form is preserved.
    Decimal,
    Date,
    DateTime,
    /// system + code + display pair.
    Coding,
    /// value + unit + system + code.
    Quantity,
    /// Record-shaped field with named sub-fields.
    Composite { fields: Vec<FieldDef> },
}

impl FieldType {
    /// Scalar kinds read straight from a single attribute value.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Self::Coding | Self::Quantity | Self::Composite { .. })
    }

    /// Scalars plus the coded-pair and quantity leaf types.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Composite { .. })
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// Wildcard translation fallback is only meaningful for bare codes.
    pub fn is_code_kind(&self) -> bool {
        matches!(self, Self::Code)
    }

    pub fn composite_fields(&self) -> Option<&[FieldDef]> {
        match self {
            Self::Composite { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Code => "code",
            Self::Uri => "uri",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Coding => "coding",
            Self::Quantity => "quantity",
            Self::Composite { .. } => "composite",
        }
    }
}

/// One named field of a record or composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Repeating field.
    #[serde(default)]
    pub array: bool,
    /// Coded leaf: values are run through code translation before assignment.
    #[serde(default)]
    pub coded: bool,
    /// Bound controlled-vocabulary identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            array: false,
            coded: false,
            binding: None,
        }
    }

    pub fn composite(name: &str, fields: Vec<FieldDef>) -> Self {
        Self::new(name, FieldType::Composite { fields })
    }

    #[must_use]
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    #[must_use]
    pub fn coded(mut self) -> Self {
        self.coded = true;
        self
    }

    #[must_use]
    pub fn bound_to(mut self, vocabulary: &str) -> Self {
        self.binding = Some(vocabulary.to_string());
        self
    }

    /// Index key of this field's name.
    pub fn key(&self) -> String {
        normalize_key(&self.name)
    }
}

/// Field shape of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSchema {
    pub record_type: String,
    pub fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn new(record_type: &str, fields: Vec<FieldDef>) -> Self {
        Self {
            record_type: record_type.to_string(),
            fields,
        }
    }

    /// Path of the record root in a [`crate::RecordIndex`].
    pub fn root_path(&self) -> String {
        normalize_key(&self.record_type)
    }

    /// Visit every field with its full path, depth first.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(&str, &'a FieldDef)) {
        fn descend<'a>(
            parent: &str,
            fields: &'a [FieldDef],
            visit: &mut dyn FnMut(&str, &'a FieldDef),
        ) {
            for field in fields {
                let path = join_path(parent, &field.name);
                visit(&path, field);
                if let Some(children) = field.field_type.composite_fields() {
                    descend(&path, children, visit);
                }
            }
        }
        descend(&self.root_path(), &self.fields, &mut visit);
    }
}
