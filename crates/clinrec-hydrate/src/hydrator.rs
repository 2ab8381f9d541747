//! Schema-directed record hydration.
//!
//! The hydrator walks a [`RecordSchema`] depth first, keyed by the current path
//! and the identity of the entry being populated, and fills each field from the
//! [`RecordIndex`]. Filtering is interleaved with population:
//!
//! - a composite instance first receives its direct attributes (leaf, coding
//!   and quantity fields), then its own predicates are checked against it; a
//!   failure stops before any nested composite is populated;
//! - an array passes when it is empty or at least one element passed, and keeps
//!   every element it constructed;
//! - leaves are coerced to their declared kind, coded leaves are translated
//!   through the tables targeting their bound vocabulary, and leaf predicates are
//!   checked after population.
//!
//! A `(path, parent identity)` pair is populated at most once per call.

use std::collections::BTreeMap;
use std::sync::Arc;

use clinrec_filter::FilterEngine;
use clinrec_model::lookup::join_path;
use clinrec_model::{
    Coding, EvaluationOutcome, FieldDef, FieldType, HydrationOptions, PathIndex, Predicate,
    RecordIndex, RecordSchema, RowEntry, TranslationMode, Value,
};
use clinrec_terminology::{CodeTranslator, TerminologyResolver};
use tracing::{debug, debug_span};

use crate::context::{Diagnostic, DiagnosticKind, HydrationContext};
use crate::error::HydrationError;
use crate::leaf::{assemble_coding, assemble_quantity, coerce_scalar, dedupe_codings};

/// Populated value and outcome for one field.
type Populated = (Option<Value>, EvaluationOutcome);

/// Result of hydrating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydration {
    pub record_id: String,
    /// `None` when the record has no entry at its root path.
    pub value: Option<Value>,
    pub outcome: EvaluationOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

impl Hydration {
    /// The populated document, only when the record passed every applicable filter.
    pub fn into_document(self) -> Option<Value> {
        if self.outcome.passed { self.value } else { None }
    }

    pub fn passed(&self) -> bool {
        self.outcome.passed
    }
}

/// Rebuilds nested documents from row indexes.
#[derive(Debug, Clone)]
pub struct Hydrator {
    paths: Arc<PathIndex>,
    filter: FilterEngine,
    translator: CodeTranslator,
    options: HydrationOptions,
}

impl Hydrator {
    pub fn new(paths: Arc<PathIndex>, terminology: TerminologyResolver) -> Self {
        let TerminologyResolver {
            validator,
            translator,
        } = terminology;
        Self {
            filter: FilterEngine::new(Arc::clone(&paths), validator),
            paths,
            translator,
            options: HydrationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: HydrationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &HydrationOptions {
        &self.options
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    /// Hydrate one record and decide whether it passes `predicates`.
    ///
    /// Errors are scoped to this record: a leaf that cannot be coerced to its
    /// declared kind, a predicate the engine cannot apply, or a vocabulary whose
    /// membership cannot be determined.
    pub fn hydrate(
        &self,
        schema: &RecordSchema,
        index: &RecordIndex,
        predicates: &[Predicate],
    ) -> Result<Hydration, HydrationError> {
        let span = debug_span!("hydrate", record = index.record_id(), record_type = %schema.record_type);
        let _enter = span.enter();

        self.filter.check_predicates(predicates)?;
        let mut ctx = HydrationContext::new(index, predicates);
        let root_path = schema.root_path();

        let entries = index.entries(&root_path);
        let Some(root) = entries.first() else {
            debug!("record has no root entry");
            return Ok(Hydration {
                record_id: index.record_id().to_string(),
                value: None,
                outcome: EvaluationOutcome::nothing_to_filter(),
                diagnostics: ctx.into_diagnostics(),
            });
        };
        if entries.len() > 1 {
            ctx.diagnose(
                &root_path,
                DiagnosticKind::ExtraEntries,
                format!("{} root entries; using '{}'", entries.len(), root.local_id),
            );
        }
        ctx.begin(&root_path, &root.parent_id);

        let (members, outcome) = self.composite(&mut ctx, &root_path, &schema.fields, root)?;
        debug!(passed = outcome.passed, reason = %outcome.reason, "record hydrated");
        Ok(Hydration {
            record_id: index.record_id().to_string(),
            value: Some(Value::Object(members)),
            outcome,
            diagnostics: ctx.into_diagnostics(),
        })
    }

    /// Populate one composite instance from `entry`.
    fn composite(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        fields: &[FieldDef],
        entry: &RowEntry,
    ) -> Result<(BTreeMap<String, Value>, EvaluationOutcome), HydrationError> {
        let mut members = BTreeMap::new();

        for field in fields.iter().filter(|field| field.field_type.is_leaf()) {
            let (value, outcome) = self.field(ctx, path, entry, field)?;
            if let Some(value) = value {
                members.insert(field.name.clone(), value);
            }
            if !outcome.passed {
                return Ok((members, outcome));
            }
        }

        if self.filter.is_filtered(path, ctx.predicates) {
            let current = Value::Object(members.clone());
            let outcome = self.filter.evaluate_all(path, Some(&current), ctx.predicates)?;
            if !outcome.passed {
                return Ok((members, outcome));
            }
        }

        for field in fields.iter().filter(|field| !field.field_type.is_leaf()) {
            let (value, outcome) = self.field(ctx, path, entry, field)?;
            if let Some(value) = value {
                members.insert(field.name.clone(), value);
            }
            if !outcome.passed {
                return Ok((members, outcome));
            }
        }
        Ok((members, EvaluationOutcome::pass(format!("{path}: populated"))))
    }

    /// Populate `field` of the composite instance `owner` at `parent_path`.
    fn field(
        &self,
        ctx: &mut HydrationContext<'_>,
        parent_path: &str,
        owner: &RowEntry,
        field: &FieldDef,
    ) -> Result<Populated, HydrationError> {
        let path = join_path(parent_path, &field.name);
        if !ctx.begin(&path, &owner.local_id) {
            return Ok((None, EvaluationOutcome::pass(format!("{path}: already processed"))));
        }
        match &field.field_type {
            FieldType::Composite { fields } => self.nested(ctx, &path, owner, field, fields),
            FieldType::Coding => self.coding(ctx, &path, owner, field),
            FieldType::Quantity => self.quantity(ctx, &path, owner, field),
            scalar => self.scalar(ctx, &path, owner, field, scalar),
        }
    }

    fn nested(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        owner: &RowEntry,
        field: &FieldDef,
        fields: &[FieldDef],
    ) -> Result<Populated, HydrationError> {
        let index = ctx.index;
        let entries: Vec<&RowEntry> = index.attached(path, &owner.local_id).collect();
        if entries.is_empty() {
            return Ok((None, EvaluationOutcome::nothing_to_filter()));
        }

        if !field.array {
            let entry = entries[0];
            if entries.len() > 1 {
                ctx.diagnose(
                    path,
                    DiagnosticKind::ExtraEntries,
                    format!(
                        "{} entries for single-valued field; using '{}'",
                        entries.len(),
                        entry.local_id
                    ),
                );
            }
            let (members, outcome) = self.composite(ctx, path, fields, entry)?;
            let value = (!members.is_empty()).then_some(Value::Object(members));
            return Ok((value, outcome));
        }

        let mut elements = Vec::with_capacity(entries.len());
        let mut first_failure = None;
        let mut any_passed = false;
        for entry in entries {
            let (members, outcome) = self.composite(ctx, path, fields, entry)?;
            elements.push(Value::Object(members));
            if outcome.passed {
                any_passed = true;
            } else if first_failure.is_none() {
                first_failure = Some(outcome);
            }
        }
        let outcome = match first_failure {
            Some(failure) if !any_passed => EvaluationOutcome::fail(format!(
                "{path}: no element passed ({})",
                failure.reason
            )),
            _ => EvaluationOutcome::pass(format!("{path}: {} element(s)", elements.len())),
        };
        Ok((Some(Value::Array(elements)), outcome))
    }

    fn scalar(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        owner: &RowEntry,
        field: &FieldDef,
        field_type: &FieldType,
    ) -> Result<Populated, HydrationError> {
        let index = ctx.index;
        let key = field.key();
        let mut raw: Vec<&str> = owner.field(&key).into_iter().collect();
        if field.array || raw.is_empty() {
            raw.extend(
                index
                    .attached(path, &owner.local_id)
                    .filter_map(|entry| entry.field(&key)),
            );
        }
        if raw.is_empty() {
            return Ok((None, EvaluationOutcome::nothing_to_filter()));
        }
        if !field.array {
            keep_first(ctx, path, &mut raw);
        }

        let mut values = Vec::with_capacity(raw.len());
        for text in raw {
            let value = coerce_scalar(path, field_type, text)?;
            values.push(self.translate_scalar(ctx, path, field, value));
        }
        let value = if field.array {
            Value::Array(values)
        } else {
            values.swap_remove(0)
        };
        self.finish_leaf(ctx, path, value)
    }

    fn coding(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        owner: &RowEntry,
        field: &FieldDef,
    ) -> Result<Populated, HydrationError> {
        let own: Vec<Coding> = ctx
            .index
            .attached(path, &owner.local_id)
            .filter_map(|entry| assemble_coding(&entry.fields, ""))
            .collect();
        let mut codings = if own.is_empty() {
            assemble_coding(&owner.fields, &field.key())
                .into_iter()
                .collect()
        } else {
            own
        };
        if codings.is_empty() {
            return Ok((None, EvaluationOutcome::nothing_to_filter()));
        }
        if !field.array {
            keep_first(ctx, path, &mut codings);
        }

        codings = codings
            .into_iter()
            .map(|coding| self.translate_coding(ctx, path, field, coding))
            .collect();
        let value = if field.array {
            if self.options.dedupe_codings {
                codings = dedupe_codings(codings);
            }
            Value::Array(codings.into_iter().map(Value::Coding).collect())
        } else {
            Value::Coding(codings.swap_remove(0))
        };
        self.finish_leaf(ctx, path, value)
    }

    fn quantity(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        owner: &RowEntry,
        field: &FieldDef,
    ) -> Result<Populated, HydrationError> {
        let own: Vec<Value> = ctx
            .index
            .attached(path, &owner.local_id)
            .filter_map(|entry| assemble_quantity(&entry.fields, ""))
            .map(Value::Quantity)
            .collect();
        let mut quantities = if own.is_empty() {
            assemble_quantity(&owner.fields, &field.key())
                .map(Value::Quantity)
                .into_iter()
                .collect()
        } else {
            own
        };
        if quantities.is_empty() {
            return Ok((None, EvaluationOutcome::nothing_to_filter()));
        }
        if !field.array {
            keep_first(ctx, path, &mut quantities);
        }
        let value = if field.array {
            Value::Array(quantities)
        } else {
            quantities.swap_remove(0)
        };
        self.finish_leaf(ctx, path, value)
    }

    fn finish_leaf(
        &self,
        ctx: &HydrationContext<'_>,
        path: &str,
        value: Value,
    ) -> Result<Populated, HydrationError> {
        let outcome = self.filter.evaluate_all(path, Some(&value), ctx.predicates)?;
        Ok((Some(value), outcome))
    }

    fn translation_vocabulary(&self, path: &str, field: &FieldDef) -> Option<&str> {
        if !field.coded || self.options.translation == TranslationMode::Disabled {
            return None;
        }
        self.paths.vocabulary(path)
    }

    fn translate_scalar(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        field: &FieldDef,
        value: Value,
    ) -> Value {
        let Some(vocabulary) = self.translation_vocabulary(path, field) else {
            return value;
        };
        let (code, rebuild): (String, fn(String) -> Value) = match value {
            Value::Code(code) => (code, Value::Code),
            Value::String(code) => (code, Value::String),
            Value::Uri(code) => (code, Value::Uri),
            other => return other,
        };
        match self.translator.translate_into(
            vocabulary,
            None,
            &code,
            field.field_type.is_code_kind(),
        ) {
            Ok(Some(result)) => rebuild(result.target_code),
            Ok(None) => rebuild(code),
            Err(error) => {
                ctx.diagnose(path, DiagnosticKind::TranslationFailed, error.to_string());
                rebuild(code)
            }
        }
    }

    fn translate_coding(
        &self,
        ctx: &mut HydrationContext<'_>,
        path: &str,
        field: &FieldDef,
        mut coding: Coding,
    ) -> Coding {
        let Some(vocabulary) = self.translation_vocabulary(path, field) else {
            return coding;
        };
        match self.translator.translate_into(
            vocabulary,
            coding.system.as_deref(),
            &coding.code,
            field.field_type.is_code_kind(),
        ) {
            Ok(Some(result)) => {
                coding.code = result.target_code;
                if result.target_system.is_some() {
                    coding.system = result.target_system;
                }
                if result.target_display.is_some() {
                    coding.display = result.target_display;
                }
                coding
            }
            Ok(None) => coding,
            Err(error) => {
                ctx.diagnose(path, DiagnosticKind::TranslationFailed, error.to_string());
                coding
            }
        }
    }
}

/// Drop all but the first value of a single-valued field, recording the loss.
fn keep_first<T>(ctx: &mut HydrationContext<'_>, path: &str, values: &mut Vec<T>) {
    if values.len() > 1 {
        ctx.diagnose(
            path,
            DiagnosticKind::ExtraEntries,
            format!(
                "{} values for single-valued field; using the first",
                values.len()
            ),
        );
        values.truncate(1);
    }
}
