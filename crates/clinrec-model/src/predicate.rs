use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a predicate as declared by the predicate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateKind {
    Token,
    Date,
    String,
    Number,
    Quantity,
    Reference,
    Uri,
    Composite,
    Special,
}

impl PredicateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Date => "date",
            Self::String => "string",
            Self::Number => "number",
            Self::Quantity => "quantity",
            Self::Reference => "reference",
            Self::Uri => "uri",
            Self::Composite => "composite",
            Self::Special => "special",
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredicateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(Self::Token),
            "date" => Ok(Self::Date),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "quantity" => Ok(Self::Quantity),
            "reference" => Ok(Self::Reference),
            "uri" => Ok(Self::Uri),
            "composite" => Ok(Self::Composite),
            "special" => Ok(Self::Special),
            _ => Err(format!("Unknown predicate kind: {s}")),
        }
    }
}

/// A caller-supplied filter criterion, bound to paths through its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub code: String,
    #[serde(default)]
    pub modifier: String,
    pub value: String,
}

impl Predicate {
    pub fn new(code: &str, value: &str) -> Self {
        Self {
            code: code.to_string(),
            modifier: String::new(),
            value: value.to_string(),
        }
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: &str) -> Self {
        self.modifier = modifier.to_string();
        self
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier.is_empty() {
            write!(f, "{}={}", self.code, self.value)
        } else {
            write!(f, "{}:{}={}", self.code, self.modifier, self.value)
        }
    }
}

impl FromStr for Predicate {
    type Err = String;

    /// Parse `code=value` or `code:modifier=value`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected code[:modifier]=value, got '{s}'"))?;
        let (code, modifier) = match key.split_once(':') {
            Some((code, modifier)) => (code.trim(), modifier.trim()),
            None => (key.trim(), ""),
        };
        if code.is_empty() {
            return Err(format!("predicate code is empty in '{s}'"));
        }
        Ok(Self::new(code, value.trim()).with_modifier(modifier))
    }
}

/// Pass/fail result of a hydration or filter step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationOutcome {
    pub passed: bool,
    pub reason: String,
}

impl EvaluationOutcome {
    pub fn pass(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            reason: reason.into(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }

    /// Nothing to filter: absent node or no applicable predicate.
    pub fn nothing_to_filter() -> Self {
        Self::pass("nothing to filter")
    }
}
