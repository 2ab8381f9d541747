//! Per-record hydration state.

use std::collections::HashSet;
use std::fmt;

use clinrec_model::{Predicate, RecordIndex};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Code translation lookup failed; the original code was kept.
    TranslationFailed,
    /// A single-valued field had more than one entry; only the first was used.
    ExtraEntries,
}

/// A non-fatal observation made while hydrating one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// State owned by one top-level hydration call.
pub(crate) struct HydrationContext<'a> {
    pub(crate) index: &'a RecordIndex,
    pub(crate) predicates: &'a [Predicate],
    processed: HashSet<(String, String)>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> HydrationContext<'a> {
    pub(crate) fn new(index: &'a RecordIndex, predicates: &'a [Predicate]) -> Self {
        Self {
            index,
            predicates,
            processed: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Mark `(path, parent_id)` as processed; `false` if it already was.
    pub(crate) fn begin(&mut self, path: &str, parent_id: &str) -> bool {
        self.processed
            .insert((path.to_string(), parent_id.to_string()))
    }

    pub(crate) fn diagnose(&mut self, path: &str, kind: DiagnosticKind, message: String) {
        match kind {
            DiagnosticKind::TranslationFailed => {
                warn!(record = self.index.record_id(), path, %message, "translation failed");
            }
            DiagnosticKind::ExtraEntries => {
                debug!(record = self.index.record_id(), path, %message, "extra entries ignored");
            }
        }
        self.diagnostics.push(Diagnostic {
            path: path.to_string(),
            kind,
            message,
        });
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
