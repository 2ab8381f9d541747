//! Reconstruction of nested clinical records from flattened row indexes.
//!
//! A [`Hydrator`] walks a record schema over a [`clinrec_model::RecordIndex`],
//! coercing leaves, translating coded values and applying predicates while the
//! document is being built. [`Hydrator::hydrate_batch`] runs it over every
//! record of a row index batch and sorts the results into kept, discarded and
//! failed records.

#![deny(unsafe_code)]

mod batch;
mod context;
mod error;
mod hydrator;
mod leaf;

pub use batch::{BatchReport, RecordFailure};
pub use context::{Diagnostic, DiagnosticKind};
pub use error::HydrationError;
pub use hydrator::{Hydration, Hydrator};
pub use leaf::{assemble_coding, assemble_quantity, coerce_scalar, dedupe_codings};
