//! Row indexing for clinical record reconstruction.
//!
//! Turns flattened relational rows (one row per node, with synthetic path and
//! parent/child identifiers) into a per-record [`RecordIndex`] mapping each
//! hierarchical path to its ordered row entries.
//!
//! [`RecordIndex`]: clinrec_model::RecordIndex

#![deny(unsafe_code)]

pub mod builder;
pub mod column;
pub mod error;
pub mod source;

pub use builder::{RowIndexBatch, RowIndexBuilder, build_index};
pub use column::{ColumnPath, ColumnSegment, Expansion, SyntheticStep, segment_identity};
pub use error::{RowMappingError, RowSourceError};
#[cfg(feature = "polars")]
pub use source::DataFrameRowSource;
pub use source::{CsvRowSource, RowSource, read_csv_rows};
