//! Command pipelines over loaded [`Resources`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clinrec_hydrate::{BatchReport, Hydrator};
use clinrec_index::{CsvRowSource, RowIndexBuilder, RowMappingError};
use clinrec_model::{Coding, Predicate, TranslationResult, ValidationResult};
use tracing::{debug, info, info_span};

use crate::config::Resources;
use crate::logging::redact_value;

#[derive(Debug)]
pub struct HydrateResult {
    pub record_type: String,
    pub rows: PathBuf,
    pub report: BatchReport,
    /// Rows or columns skipped while building the row index.
    pub row_errors: Vec<RowMappingError>,
}

impl HydrateResult {
    pub fn has_errors(&self) -> bool {
        self.report.has_failures()
    }

    /// Kept documents as a JSON array, in record id order.
    pub fn documents_json(&self) -> Result<serde_json::Value> {
        let documents = self
            .report
            .documents()
            .map(|(_, document)| serde_json::to_value(document))
            .collect::<Result<Vec<_>, _>>()
            .context("serialize documents")?;
        Ok(serde_json::Value::Array(documents))
    }
}

/// Parse `code[:modifier]=value` filter arguments.
pub fn parse_predicates(raw: &[String]) -> Result<Vec<Predicate>> {
    raw.iter()
        .map(|text| {
            text.parse::<Predicate>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid filter '{text}'"))
        })
        .collect()
}

pub fn hydrate_rows(
    resources: &Resources,
    rows: &Path,
    record_type: &str,
    predicates: &[Predicate],
) -> Result<HydrateResult> {
    let span = info_span!("hydrate", record_type, rows = %rows.display());
    let _enter = span.enter();

    let schema = resources.schema(record_type)?;
    let paths = Arc::new(resources.path_index(record_type)?);
    let hydrator =
        Hydrator::new(paths, resources.terminology()).with_options(resources.hydration.clone());

    let start = Instant::now();
    let batch = RowIndexBuilder::new()
        .with_layout(resources.layout.clone())
        .build_from(&CsvRowSource::new(rows))
        .context("read rows")?;
    info!(
        records = batch.len(),
        skipped_rows = batch.skipped_rows(),
        elapsed_ms = start.elapsed().as_millis(),
        "row index built"
    );

    let report = hydrator
        .hydrate_batch(&schema, &batch, predicates)
        .context("hydrate records")?;
    for hydration in &report.discarded {
        debug!(record = %hydration.record_id, reason = %hydration.outcome.reason, "record filtered out");
    }
    Ok(HydrateResult {
        record_type: schema.record_type.clone(),
        rows: rows.to_path_buf(),
        report,
        row_errors: batch.errors,
    })
}

pub fn check_code(resources: &Resources, vocabulary: &str, code: &str) -> Result<ValidationResult> {
    let coding = Coding::parse_token(code);
    debug!(vocabulary, code = redact_value(code), "checking membership");
    resources
        .terminology()
        .validator
        .validate(vocabulary, &coding)
        .with_context(|| format!("validate against '{vocabulary}'"))
}

/// Translate `code` through the tables targeting `vocabulary`. `bare` marks the
/// code as a bare code leaf, which enables wildcard fallback.
pub fn translate_code(
    resources: &Resources,
    vocabulary: &str,
    code: &str,
    bare: bool,
) -> Result<Option<TranslationResult>> {
    let coding = Coding::parse_token(code);
    debug!(vocabulary, code = redact_value(code), bare, "translating");
    resources
        .terminology()
        .translator
        .translate_into(vocabulary, coding.system.as_deref(), &coding.code, bare)
        .with_context(|| format!("translate into '{vocabulary}'"))
}
