//! Row index construction.
//!
//! Every raw row carries a block of reserved metadata columns (local identity,
//! parent identity, path, record identity) and a block of dynamic columns. The
//! builder groups rows by record identity and merges each row into the
//! [`RecordIndex`] of its record, expanding dotted / array-indexed column names
//! into synthetic intermediate entries.

use std::collections::BTreeMap;

use clinrec_model::{RawRow, RecordIndex, RowLayout};
use tracing::{debug, warn};

use crate::column::ColumnPath;
use crate::error::{RowMappingError, RowSourceError};
use crate::source::RowSource;

/// Indexes keyed by record identity, plus the per-row errors met on the way.
#[derive(Debug, Clone, Default)]
pub struct RowIndexBatch {
    pub records: BTreeMap<String, RecordIndex>,
    pub errors: Vec<RowMappingError>,
}

impl RowIndexBatch {
    pub fn record(&self, record_id: &str) -> Option<&RecordIndex> {
        self.records.get(record_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of rows dropped entirely because of metadata errors.
    pub fn skipped_rows(&self) -> usize {
        self.errors.iter().filter(|error| error.skips_row()).count()
    }
}

/// Row metadata extracted from the reserved column block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowMeta<'a> {
    local_id: &'a str,
    parent_id: &'a str,
    path: &'a str,
    record_id: &'a str,
}

/// Builds per-record indexes from raw rows.
#[derive(Debug, Clone, Default)]
pub struct RowIndexBuilder {
    layout: RowLayout,
}

impl RowIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_layout(mut self, layout: RowLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn layout(&self) -> &RowLayout {
        &self.layout
    }

    /// Index every row. Rows with broken metadata are skipped and reported.
    pub fn build<I>(&self, rows: I) -> RowIndexBatch
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut batch = RowIndexBatch::default();
        let mut row_count = 0usize;
        for (idx, row) in rows.into_iter().enumerate() {
            row_count += 1;
            self.index_row(idx + 1, &row, &mut batch);
        }
        debug!(
            rows = row_count,
            records = batch.records.len(),
            errors = batch.errors.len(),
            "built row index"
        );
        batch
    }

    /// Read all rows from `source` and index them.
    pub fn build_from(&self, source: &dyn RowSource) -> Result<RowIndexBatch, RowSourceError> {
        Ok(self.build(source.rows()?))
    }

    /// Merge one row into the batch. `row_number` is 1-based and only used for reporting.
    pub fn index_row(&self, row_number: usize, row: &RawRow, batch: &mut RowIndexBatch) {
        let meta = match self.extract_meta(row_number, row) {
            Ok(meta) => meta,
            Err(error) => {
                warn!(row = row_number, %error, "skipping row with invalid metadata");
                batch.errors.push(error);
                return;
            }
        };

        let index = batch
            .records
            .entry(meta.record_id.to_string())
            .or_insert_with(|| RecordIndex::new(meta.record_id));
        index.entry_mut(meta.path, meta.local_id, meta.parent_id);
        let scope = index
            .entries(meta.path)
            .first()
            .filter(|primary| primary.local_id != meta.local_id)
            .map(|_| meta.local_id);

        for (column, value) in &row.cells {
            if self.layout.is_reserved(column) {
                continue;
            }
            let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            let parsed = match ColumnPath::parse(column) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    let error = RowMappingError::MalformedColumn {
                        row: row_number,
                        column: column.clone(),
                        reason,
                    };
                    warn!(row = row_number, %error, "skipping malformed column");
                    batch.errors.push(error);
                    continue;
                }
            };
            match parsed.expand(meta.path, meta.local_id, scope) {
                None => index.merge_field(meta.path, meta.local_id, meta.parent_id, column, value),
                Some(expansion) => {
                    for step in &expansion.steps {
                        index.entry_mut(&step.path, &step.local_id, &step.parent_id);
                    }
                    if let Some(terminal) = expansion.terminal() {
                        index.merge_field(
                            &terminal.path,
                            &terminal.local_id,
                            &terminal.parent_id,
                            &expansion.field,
                            value,
                        );
                    }
                }
            }
        }
    }

    fn extract_meta<'a>(
        &self,
        row_number: usize,
        row: &'a RawRow,
    ) -> Result<RowMeta<'a>, RowMappingError> {
        let required = |column: &str| {
            row.get(column)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| RowMappingError::MissingColumn {
                    row: row_number,
                    column: column.to_string(),
                })
        };
        Ok(RowMeta {
            local_id: required(&self.layout.local_id_column)?,
            parent_id: row
                .get(&self.layout.parent_id_column)
                .map(str::trim)
                .unwrap_or_default(),
            path: required(&self.layout.path_column)?,
            record_id: required(&self.layout.record_id_column)?,
        })
    }
}

/// Index rows with the default reserved-column layout.
pub fn build_index<I>(rows: I) -> RowIndexBatch
where
    I: IntoIterator<Item = RawRow>,
{
    RowIndexBuilder::new().build(rows)
}
