//! Date predicates: calendar-date comparison, time of day ignored.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use clinrec_model::{DateValue, EvaluationOutcome, Predicate, PredicateKind, Value};

use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparator {
    #[default]
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::Ge => "ge",
            Self::Le => "le",
        }
    }

    pub fn matches(self, field: NaiveDate, target: NaiveDate) -> bool {
        match self {
            Self::Eq => field == target,
            Self::Gt => field > target,
            Self::Lt => field < target,
            Self::Ge => field >= target,
            Self::Le => field <= target,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "eq" => Ok(Self::Eq),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            "ge" => Ok(Self::Ge),
            "le" => Ok(Self::Le),
            other => Err(format!("unsupported comparator '{other}'")),
        }
    }
}

/// Comparator and target date of a date predicate.
///
/// The comparator comes from the modifier or, when the modifier is empty, from a
/// two-letter prefix on the value (`ge1990-01-01`).
pub fn parse(predicate: &Predicate) -> Result<(Comparator, NaiveDate), FilterError> {
    let config = |reason: String| FilterError::config(&predicate.code, PredicateKind::Date, reason);
    let raw = predicate.value.trim();
    let (comparator, date_text) = if predicate.modifier.trim().is_empty() {
        split_prefix(raw).map_err(config)?
    } else {
        (predicate.modifier.parse().map_err(config)?, raw)
    };
    let target = DateValue::parse(date_text)
        .and_then(|date| date.first_day())
        .ok_or_else(|| config(format!("'{date_text}' is not a date")))?;
    Ok((comparator, target))
}

fn split_prefix(raw: &str) -> Result<(Comparator, &str), String> {
    let prefix: String = raw.chars().take(2).collect();
    if prefix.len() == 2 && prefix.chars().all(|ch| ch.is_ascii_alphabetic()) {
        Ok((prefix.parse()?, &raw[2..]))
    } else {
        Ok((Comparator::Eq, raw))
    }
}

/// Calendar dates carried by a populated value: date leaves, date-like text,
/// array elements and the direct members of a composite.
fn dates_in(value: &Value, out: &mut Vec<NaiveDate>) {
    match value {
        Value::Date(date) => out.extend(date.first_day()),
        Value::String(text) => out.extend(DateValue::parse(text).and_then(|d| d.first_day())),
        Value::Array(items) => items.iter().for_each(|item| dates_in(item, out)),
        Value::Object(members) => members.values().for_each(|member| match member {
            Value::Date(_) | Value::String(_) => dates_in(member, out),
            _ => {}
        }),
        _ => {}
    }
}

pub fn evaluate(value: &Value, predicate: &Predicate) -> Result<EvaluationOutcome, FilterError> {
    let (comparator, target) = parse(predicate)?;
    let mut dates = Vec::new();
    dates_in(value, &mut dates);
    if dates.is_empty() {
        return Ok(EvaluationOutcome::fail(format!(
            "{}: no date value to compare",
            predicate.code
        )));
    }
    if dates.iter().any(|date| comparator.matches(*date, target)) {
        Ok(EvaluationOutcome::pass(format!(
            "{}: date {comparator} {target}",
            predicate.code
        )))
    } else {
        Ok(EvaluationOutcome::fail(format!(
            "{}: no date {comparator} {target}",
            predicate.code
        )))
    }
}
