//! Token predicates: coded-value matching, literal or through a vocabulary.

use clinrec_model::{Coding, EvaluationOutcome, Predicate, PredicateKind, Value};
use clinrec_terminology::VocabularyValidator;

use crate::error::FilterError;

/// How a token predicate is applied, derived from its modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Match against the bound vocabulary, or literally when none is bound.
    Match,
    /// Negated [`TokenMode::Match`].
    Not,
    /// Membership in the vocabulary named by the predicate value.
    In,
    /// Negated [`TokenMode::In`].
    NotIn,
}

impl TokenMode {
    pub fn parse(predicate: &Predicate) -> Result<Self, FilterError> {
        match predicate.modifier.trim().to_lowercase().as_str() {
            "" => Ok(Self::Match),
            "not" => Ok(Self::Not),
            "in" => Ok(Self::In),
            "not-in" => Ok(Self::NotIn),
            other => Err(FilterError::config(
                &predicate.code,
                PredicateKind::Token,
                format!("unsupported modifier '{other}'"),
            )),
        }
    }

    fn negated(self) -> bool {
        matches!(self, Self::Not | Self::NotIn)
    }
}

/// Literal token syntax: `system|code`, `|code` (no system) or `code` (any system).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLiteral<'a> {
    system: Option<&'a str>,
    code: &'a str,
    system_given: bool,
}

impl<'a> TokenLiteral<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.trim().split_once('|') {
            Some((system, code)) => Self {
                system: Some(system.trim()).filter(|s| !s.is_empty()),
                code: code.trim(),
                system_given: true,
            },
            None => Self {
                system: None,
                code: raw.trim(),
                system_given: false,
            },
        }
    }

    pub fn matches(&self, coding: &Coding) -> bool {
        if coding.code != self.code {
            return false;
        }
        if !self.system_given {
            return true;
        }
        coding.system.as_deref() == self.system
    }
}

/// Every `(system, code)` pair carried by a populated value.
///
/// Codings and bare code/string/uri leaves count directly; arrays contribute each
/// element; a composite contributes the codings and codes of its direct members.
pub fn codings_in(value: &Value, out: &mut Vec<Coding>) {
    match value {
        Value::Coding(coding) => out.push(coding.clone()),
        Value::Code(code) | Value::String(code) | Value::Uri(code) => {
            out.push(Coding::new(None, code));
        }
        Value::Array(items) => items.iter().for_each(|item| codings_in(item, out)),
        Value::Object(members) => {
            for member in members.values() {
                match member {
                    Value::Coding(_) | Value::Code(_) => codings_in(member, out),
                    Value::Array(items) => items
                        .iter()
                        .filter(|item| matches!(item, Value::Coding(_) | Value::Code(_)))
                        .for_each(|item| codings_in(item, out)),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

pub fn evaluate(
    validator: &VocabularyValidator,
    bound_vocabulary: Option<&str>,
    value: &Value,
    predicate: &Predicate,
) -> Result<EvaluationOutcome, FilterError> {
    let mode = TokenMode::parse(predicate)?;
    let mut codings = Vec::new();
    codings_in(value, &mut codings);

    let (matched, detail) = match (mode, bound_vocabulary) {
        (TokenMode::In | TokenMode::NotIn, _) => {
            let vocabulary = predicate.value.trim();
            if vocabulary.is_empty() {
                return Err(FilterError::config(
                    &predicate.code,
                    PredicateKind::Token,
                    "':in' requires a vocabulary reference",
                ));
            }
            member_of(validator, vocabulary, &codings)?
        }
        (_, Some(vocabulary)) => member_of(validator, vocabulary, &codings)?,
        (_, None) => {
            let literal = TokenLiteral::parse(&predicate.value);
            let matched = codings.iter().any(|coding| literal.matches(coding));
            (matched, format!("literal '{}'", predicate.value.trim()))
        }
    };

    let passed = matched != mode.negated();
    let reason = format!(
        "{}: {} {detail}",
        predicate.code,
        if matched { "matched" } else { "did not match" }
    );
    Ok(if passed {
        EvaluationOutcome::pass(reason)
    } else {
        EvaluationOutcome::fail(reason)
    })
}

fn member_of(
    validator: &VocabularyValidator,
    vocabulary: &str,
    codings: &[Coding],
) -> Result<(bool, String), FilterError> {
    if codings.is_empty() {
        return Ok((false, format!("vocabulary '{vocabulary}' (no codes)")));
    }
    let result = validator.validate_any(vocabulary, codings)?;
    let detail = match &result.message {
        Some(message) => format!("vocabulary '{vocabulary}' ({message})"),
        None => format!("vocabulary '{vocabulary}'"),
    };
    Ok((result.valid, detail))
}
