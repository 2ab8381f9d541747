//! Row sources: the relational side of the index builder.
//!
//! Query construction and execution live elsewhere; a source only hands over
//! already-materialized rows as ordered `(column, value)` cells.

use std::io::Read;
use std::path::{Path, PathBuf};

use clinrec_model::RawRow;
use csv::ReaderBuilder;

use crate::error::RowSourceError;

/// Supplies raw rows to the index builder.
pub trait RowSource {
    fn rows(&self) -> Result<Vec<RawRow>, RowSourceError>;
}

impl RowSource for Vec<RawRow> {
    fn rows(&self) -> Result<Vec<RawRow>, RowSourceError> {
        Ok(self.clone())
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Read headed CSV text into raw rows. Empty cells become nulls; short records
/// are padded with nulls.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        let mut row = RawRow::new();
        for (idx, header) in headers.iter().enumerate() {
            row.push(header.clone(), record.get(idx).and_then(normalize_cell));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// CSV file with a single header row naming the reserved and dynamic columns.
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for CsvRowSource {
    fn rows(&self) -> Result<Vec<RawRow>, RowSourceError> {
        let file = std::fs::File::open(&self.path).map_err(|e| RowSourceError::Csv {
            path: self.path.clone(),
            source: csv::Error::from(e),
        })?;
        read_csv_rows(file).map_err(|source| RowSourceError::Csv {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(feature = "polars")]
pub use frame::{DataFrameRowSource, any_to_string};

#[cfg(feature = "polars")]
mod frame {
    use clinrec_model::RawRow;
    use polars::prelude::{AnyValue, DataFrame};

    use super::RowSource;
    use crate::error::RowSourceError;

    /// Converts a Polars `AnyValue` to its textual cell form; `Null` becomes empty.
    pub fn any_to_string(value: AnyValue<'_>) -> String {
        match value {
            AnyValue::Null => String::new(),
            AnyValue::Int8(v) => v.to_string(),
            AnyValue::Int16(v) => v.to_string(),
            AnyValue::Int32(v) => v.to_string(),
            AnyValue::Int64(v) => v.to_string(),
            AnyValue::UInt8(v) => v.to_string(),
            AnyValue::UInt16(v) => v.to_string(),
            AnyValue::UInt32(v) => v.to_string(),
            AnyValue::UInt64(v) => v.to_string(),
            AnyValue::Float32(v) => f64::from(v).to_string(),
            AnyValue::Float64(v) => v.to_string(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            AnyValue::Boolean(b) => b.to_string(),
            other => other.to_string(),
        }
    }

    /// Rows of an in-memory Polars frame, one raw row per frame row.
    #[derive(Debug, Clone, Copy)]
    pub struct DataFrameRowSource<'a> {
        frame: &'a DataFrame,
    }

    impl<'a> DataFrameRowSource<'a> {
        pub fn new(frame: &'a DataFrame) -> Self {
            Self { frame }
        }
    }

    impl RowSource for DataFrameRowSource<'_> {
        fn rows(&self) -> Result<Vec<RawRow>, RowSourceError> {
            let names = self.frame.get_column_names_owned();
            let mut columns = Vec::with_capacity(names.len());
            for name in &names {
                let column =
                    self.frame
                        .column(name.as_str())
                        .map_err(|e| RowSourceError::DataFrame {
                            column: name.to_string(),
                            message: e.to_string(),
                        })?;
                columns.push((name.to_string(), column));
            }
            let mut rows = Vec::with_capacity(self.frame.height());
            for idx in 0..self.frame.height() {
                let mut row = RawRow::new();
                for (name, column) in &columns {
                    let text = any_to_string(column.get(idx).unwrap_or(AnyValue::Null));
                    let value = if text.trim().is_empty() {
                        None
                    } else {
                        Some(text)
                    };
                    row.push(name.clone(), value);
                }
                rows.push(row);
            }
            Ok(rows)
        }
    }
}
