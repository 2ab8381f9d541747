//! Predicate dispatch.
//!
//! A predicate applies at a path only when the path index declares its code
//! there; the declared kind selects the evaluator. Anything undeclared, absent or
//! of a kind without an evaluator passes.

use std::sync::Arc;

use clinrec_model::{EvaluationOutcome, PathIndex, Predicate, PredicateKind, Value};
use clinrec_terminology::VocabularyValidator;
use tracing::trace;

use crate::error::FilterError;
use crate::{date, text, token};

#[derive(Debug, Clone)]
pub struct FilterEngine {
    paths: Arc<PathIndex>,
    validator: VocabularyValidator,
}

impl FilterEngine {
    pub fn new(paths: Arc<PathIndex>, validator: VocabularyValidator) -> Self {
        Self { paths, validator }
    }

    pub fn paths(&self) -> &PathIndex {
        &self.paths
    }

    pub fn validator(&self) -> &VocabularyValidator {
        &self.validator
    }

    /// Predicates declared at `path`, with their kinds.
    pub fn bound_at<'p>(
        &self,
        path: &str,
        predicates: &'p [Predicate],
    ) -> Vec<(&'p Predicate, PredicateKind)> {
        predicates
            .iter()
            .filter_map(|predicate| {
                self.paths
                    .predicate_kind(path, &predicate.code)
                    .map(|kind| (predicate, kind))
            })
            .collect()
    }

    /// Whether any of `predicates` is declared at `path`.
    pub fn is_filtered(&self, path: &str, predicates: &[Predicate]) -> bool {
        predicates
            .iter()
            .any(|predicate| self.paths.predicate_kind(path, &predicate.code).is_some())
    }

    /// Evaluate one predicate against the value populated at `path`.
    pub fn evaluate(
        &self,
        path: &str,
        value: Option<&Value>,
        predicate: &Predicate,
    ) -> Result<EvaluationOutcome, FilterError> {
        let Some(kind) = self.paths.predicate_kind(path, &predicate.code) else {
            return Ok(EvaluationOutcome::pass(format!(
                "{}: not indexed at {path}",
                predicate.code
            )));
        };
        self.evaluate_as(path, kind, value, predicate)
    }

    /// Evaluate every predicate declared at `path`; all must pass.
    pub fn evaluate_all(
        &self,
        path: &str,
        value: Option<&Value>,
        predicates: &[Predicate],
    ) -> Result<EvaluationOutcome, FilterError> {
        let bound = self.bound_at(path, predicates);
        if bound.is_empty() {
            return Ok(EvaluationOutcome::nothing_to_filter());
        }
        let mut reasons = Vec::with_capacity(bound.len());
        for (predicate, kind) in bound {
            let outcome = self.evaluate_as(path, kind, value, predicate)?;
            if !outcome.passed {
                return Ok(outcome);
            }
            reasons.push(outcome.reason);
        }
        Ok(EvaluationOutcome::pass(reasons.join("; ")))
    }

    /// Surface modifier, comparator and value mistakes before any data is read.
    pub fn check_predicates(&self, predicates: &[Predicate]) -> Result<(), FilterError> {
        for predicate in predicates {
            for (_, descriptor) in self.paths.paths() {
                match descriptor.kind_of(&predicate.code) {
                    Some(PredicateKind::Token) => {
                        token::TokenMode::parse(predicate)?;
                    }
                    Some(PredicateKind::Date) => {
                        date::parse(predicate)?;
                    }
                    Some(PredicateKind::String) => {
                        text::StringMode::parse(predicate)?;
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn evaluate_as(
        &self,
        path: &str,
        kind: PredicateKind,
        value: Option<&Value>,
        predicate: &Predicate,
    ) -> Result<EvaluationOutcome, FilterError> {
        let Some(value) = value else {
            return Ok(EvaluationOutcome::nothing_to_filter());
        };
        let outcome = match kind {
            PredicateKind::Token => token::evaluate(
                &self.validator,
                self.paths.vocabulary(path),
                value,
                predicate,
            )?,
            PredicateKind::Date => date::evaluate(value, predicate)?,
            PredicateKind::String => text::evaluate(value, predicate)?,
            other => EvaluationOutcome::pass(format!(
                "{}: {other} predicates are not evaluated",
                predicate.code
            )),
        };
        trace!(path, code = %predicate.code, passed = outcome.passed, "evaluated predicate");
        Ok(outcome)
    }
}
