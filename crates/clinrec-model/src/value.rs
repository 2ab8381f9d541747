//! Hydrated document values.
//!
//! [`Value`] is the populated form of a schema field. It serializes to plain JSON:
//! scalars as JSON scalars (decimals keep their textual form), codings and
//! quantities as objects, composites as objects with sorted keys.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::terminology::Coding;

/// Date or date-time leaf value, preserving the precision it was recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateValue {
    Year(i32),
    YearMonth { year: i32, month: u32 },
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl DateValue {
    /// Parse the record date representation.
    ///
    /// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, ISO 8601 date-times with or without
    /// seconds, fractional seconds or offset, and the space-separated relational
    /// timestamp form `YYYY-MM-DD HH:MM:SS`. Offsets are dropped; the wall-clock
    /// value as written is kept.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(Self::DateTime(dt.naive_local()));
        }
        for format in [
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Self::DateTime(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Some(Self::Date(date));
        }
        parse_partial(trimmed)
    }

    /// Calendar date used for comparisons; partial dates resolve to their first day.
    pub fn first_day(&self) -> Option<NaiveDate> {
        match self {
            Self::Year(year) => NaiveDate::from_ymd_opt(*year, 1, 1),
            Self::YearMonth { year, month } => NaiveDate::from_ymd_opt(*year, *month, 1),
            Self::Date(date) => Some(*date),
            Self::DateTime(dt) => Some(dt.date()),
        }
    }

    /// Drop the time-of-day part, if any.
    #[must_use]
    pub fn to_date_precision(self) -> Self {
        match self {
            Self::DateTime(dt) => Self::Date(dt.date()),
            other => other,
        }
    }

    pub fn to_iso8601(&self) -> String {
        match self {
            Self::Year(year) => format!("{year:04}"),
            Self::YearMonth { year, month } => format!("{year:04}-{month:02}"),
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

fn parse_partial(value: &str) -> Option<DateValue> {
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|ch| ch.is_ascii_digit());
    match value.split_once('-') {
        None if value.len() == 4 && all_digits(value) => value.parse().ok().map(DateValue::Year),
        Some((year, month)) if year.len() == 4 && month.len() == 2 => {
            if !all_digits(year) || !all_digits(month) {
                return None;
            }
            let year: i32 = year.parse().ok()?;
            let month: u32 = month.parse().ok()?;
            if !(1..=12).contains(&month) {
                return None;
            }
            Some(DateValue::YearMonth { year, month })
        }
        _ => None,
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

/// Quantity leaf assembled from `value`, `unit`, `system` and `code` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Quantity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Quantity {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.unit.is_none() && self.system.is_none() && self.code.is_none()
    }
}

/// A populated field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Code(String),
    Uri(String),
    Boolean(bool),
    Integer(i64),
    /// Original textual form of an arbitrary-precision number.
    Decimal(String),
    Date(DateValue),
    Coding(Coding),
    Quantity(Quantity),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Textual form of a scalar leaf; `None` for structured values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) | Self::Code(s) | Self::Uri(s) | Self::Decimal(s) => {
                Some(Cow::Borrowed(s))
            }
            Self::Boolean(b) => Some(Cow::Owned(b.to_string())),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Date(date) => Some(Cow::Owned(date.to_iso8601())),
            Self::Coding(_) | Self::Quantity(_) | Self::Array(_) | Self::Object(_) => None,
        }
    }

    /// Member of an object value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Object(map) => map.get(name),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_coding(&self) -> Option<&Coding> {
        match self {
            Self::Coding(coding) => Some(coding),
            _ => None,
        }
    }
}
