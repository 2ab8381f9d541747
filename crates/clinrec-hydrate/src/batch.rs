//! Batch hydration over a [`RowIndexBatch`].

use clinrec_index::RowIndexBatch;
use clinrec_model::{Predicate, RecordSchema, Value};
use tracing::{info, info_span, warn};

use crate::error::HydrationError;
use crate::hydrator::{Hydration, Hydrator};

/// A record that could not be hydrated.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub record_id: String,
    pub error: HydrationError,
}

/// Outcome of hydrating every record in a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Records that passed every applicable predicate, in record id order.
    pub kept: Vec<Hydration>,
    /// Records filtered out.
    pub discarded: Vec<Hydration>,
    pub failed: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.kept.len() + self.discarded.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Documents of the kept records.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.kept.iter().filter_map(|hydration| {
            hydration
                .value
                .as_ref()
                .map(|value| (hydration.record_id.as_str(), value))
        })
    }
}

impl Hydrator {
    /// Hydrate every record of `batch`.
    ///
    /// Predicates are checked once up front; a predicate the engine cannot apply
    /// fails the whole call. Any other error is recorded against its record and
    /// the remaining records are still processed.
    pub fn hydrate_batch(
        &self,
        schema: &RecordSchema,
        batch: &RowIndexBatch,
        predicates: &[Predicate],
    ) -> Result<BatchReport, HydrationError> {
        let span = info_span!("hydrate_batch", record_type = %schema.record_type, records = batch.len());
        let _enter = span.enter();

        self.filter().check_predicates(predicates)?;
        let mut report = BatchReport::default();
        for (record_id, index) in &batch.records {
            match self.hydrate(schema, index, predicates) {
                Ok(hydration) if hydration.passed() => report.kept.push(hydration),
                Ok(hydration) => report.discarded.push(hydration),
                Err(error) => {
                    warn!(record = %record_id, %error, "record failed");
                    report.failed.push(RecordFailure {
                        record_id: record_id.clone(),
                        error,
                    });
                }
            }
        }
        info!(
            kept = report.kept.len(),
            discarded = report.discarded.len(),
            failed = report.failed.len(),
            "batch hydrated"
        );
        Ok(report)
    }
}
