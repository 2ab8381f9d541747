//! Leaf coercion and coded-pair / quantity assembly.

use std::collections::{BTreeMap, HashSet};

use clinrec_model::{Coding, DateValue, FieldType, Quantity, Value};

use crate::error::HydrationError;

/// Coerce one raw attribute value into a scalar leaf of the declared kind.
pub fn coerce_scalar(
    path: &str,
    field_type: &FieldType,
    raw: &str,
) -> Result<Value, HydrationError> {
    let mismatch = || HydrationError::type_mismatch(path, field_type.name(), raw);
    let value = match field_type {
        FieldType::String => Value::String(raw.to_string()),
        FieldType::Code => Value::Code(raw.to_string()),
        FieldType::Uri => Value::Uri(raw.to_string()),
        FieldType::Boolean => Value::Boolean(parse_boolean(raw).ok_or_else(mismatch)?),
        FieldType::Integer => Value::Integer(raw.trim().parse().map_err(|_| mismatch())?),
        FieldType::Decimal => {
            let trimmed = raw.trim();
            if !is_decimal_literal(trimmed) {
                return Err(mismatch());
            }
            Value::Decimal(trimmed.to_string())
        }
        FieldType::Date => Value::Date(
            DateValue::parse(raw)
                .ok_or_else(mismatch)?
                .to_date_precision(),
        ),
        FieldType::DateTime => Value::Date(DateValue::parse(raw).ok_or_else(mismatch)?),
        FieldType::Coding | FieldType::Quantity | FieldType::Composite { .. } => {
            return Err(mismatch());
        }
    };
    Ok(value)
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "t" | "1" | "y" | "yes" => Some(true),
        "false" | "f" | "0" | "n" | "no" => Some(false),
        _ => None,
    }
}

/// Plain decimal notation: optional sign, digits with at most one point, optional
/// exponent.
fn is_decimal_literal(value: &str) -> bool {
    let unsigned = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = |s: &str| s.chars().all(|ch| ch.is_ascii_digit());
    let mantissa_ok = !(whole.is_empty() && fraction.is_empty()) && digits(whole) && digits(fraction);
    let exponent_ok = exponent.is_none_or(|exp| {
        let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        !exp.is_empty() && digits(exp)
    });
    mantissa_ok && exponent_ok
}

/// Value of the attribute named `suffix` under `prefix`.
///
/// `prefix` is the owning field's key when the parts sit on the parent entry
/// (`coding_code`, `codingcode`) and empty when they sit on the field's own
/// entry (`code`). An exact remainder wins over a suffix match. Keys that merely
/// start with `prefix` (`statusreason_code` for `status`) never match.
pub fn part<'e>(fields: &'e BTreeMap<String, String>, prefix: &str, suffix: &str) -> Option<&'e str> {
    let mut fallback = None;
    for (key, value) in fields {
        let Some(rest) = key.strip_prefix(prefix) else {
            continue;
        };
        if rest == suffix {
            return Some(value);
        }
        if !prefix.is_empty() && !rest.starts_with(['_', '.']) {
            continue;
        }
        let rest = rest.trim_start_matches(['_', '.']);
        if rest == suffix {
            return Some(value);
        }
        let separated = rest.ends_with(&format!("_{suffix}")) || rest.ends_with(&format!(".{suffix}"));
        if fallback.is_none() && separated {
            fallback = Some(value.as_str());
        }
    }
    fallback
}

/// Assemble a coding from `system` / `code` / `display` parts; `None` without a code.
pub fn assemble_coding(fields: &BTreeMap<String, String>, prefix: &str) -> Option<Coding> {
    let code = part(fields, prefix, "code")?;
    let mut coding = Coding::new(part(fields, prefix, "system"), code);
    if let Some(display) = part(fields, prefix, "display") {
        coding = coding.with_display(display);
    }
    Some(coding)
}

/// Assemble a quantity from `value` / `unit` / `system` / `code` parts; `None` when
/// none is present.
pub fn assemble_quantity(fields: &BTreeMap<String, String>, prefix: &str) -> Option<Quantity> {
    let quantity = Quantity {
        value: part(fields, prefix, "value").map(String::from),
        unit: part(fields, prefix, "unit").map(String::from),
        system: part(fields, prefix, "system").map(String::from),
        code: part(fields, prefix, "code").map(String::from),
    };
    (!quantity.is_empty()).then_some(quantity)
}

/// Drop codings whose `(system, code)` was already seen, keeping first occurrences.
pub fn dedupe_codings(codings: Vec<Coding>) -> Vec<Coding> {
    let mut seen = HashSet::new();
    codings
        .into_iter()
        .filter(|coding| seen.insert((coding.system.clone(), coding.code.clone())))
        .collect()
}
