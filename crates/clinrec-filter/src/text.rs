//! String predicates.

use clinrec_model::{EvaluationOutcome, Predicate, PredicateKind, Value};

use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMode {
    /// Case-insensitive substring containment (default).
    Contains,
    /// Whole-value, case-sensitive equality.
    Exact,
}

impl StringMode {
    pub fn parse(predicate: &Predicate) -> Result<Self, FilterError> {
        match predicate.modifier.trim().to_lowercase().as_str() {
            "" | "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            other => Err(FilterError::config(
                &predicate.code,
                PredicateKind::String,
                format!("unsupported modifier '{other}'"),
            )),
        }
    }
}

fn texts_in(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| texts_in(item, out)),
        Value::Object(members) => members.values().for_each(|member| texts_in(member, out)),
        Value::Coding(coding) => {
            out.push(coding.code.clone());
            out.extend(coding.display.clone());
        }
        Value::Quantity(_) => {}
        scalar => out.extend(scalar.as_text().map(std::borrow::Cow::into_owned)),
    }
}

pub fn evaluate(value: &Value, predicate: &Predicate) -> Result<EvaluationOutcome, FilterError> {
    let mode = StringMode::parse(predicate)?;
    let needle = predicate.value.trim();
    let needle_lower = needle.to_lowercase();
    let mut texts = Vec::new();
    texts_in(value, &mut texts);

    let matched = texts.iter().any(|text| match mode {
        StringMode::Contains => text.to_lowercase().contains(&needle_lower),
        StringMode::Exact => text == needle,
    });
    if matched {
        Ok(EvaluationOutcome::pass(format!(
            "{}: text matches '{needle}'",
            predicate.code
        )))
    } else {
        Ok(EvaluationOutcome::fail(format!(
            "{}: no text matching '{needle}'",
            predicate.code
        )))
    }
}
