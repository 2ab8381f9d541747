//! Dynamic column names and their decomposition into synthetic entries.
//!
//! A dynamic column is either a plain attribute name (`gender`) or a dotted,
//! optionally array-indexed chain (`category[1].coding[0].code`). Chains expand
//! into one synthetic entry per segment. Identities follow a positional scheme:
//!
//! | segment | first in chain | later in chain |
//! |---|---|---|
//! | indexed `name[i]` | `i+1` | `parent_i+1` |
//! | plain `name` | `1` | `parent_1` |
//!
//! When several rows at the same path carry chains, only the first of them uses
//! the bare scheme; chains under any later owner start from that owner's
//! identity (`owner_i+1`), so sibling owners never share a synthetic entry.
//!
//! A plain final segment names the attribute stored on the last synthetic entry;
//! an indexed final segment yields a terminal entry whose attribute key is the
//! segment name itself.

use std::fmt;

use clinrec_model::lookup::{join_path, normalize_key};

/// One segment of a dynamic column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSegment {
    pub name: String,
    pub index: Option<usize>,
}

impl fmt::Display for ColumnSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Parsed dynamic column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPath {
    segments: Vec<ColumnSegment>,
}

impl ColumnPath {
    /// Parse a column name. Fails on empty segments, unbalanced brackets and
    /// non-numeric indexes.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim().trim_matches('\u{feff}');
        if trimmed.is_empty() {
            return Err("empty column name".to_string());
        }
        let segments = trimmed
            .split('.')
            .map(parse_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[ColumnSegment] {
        &self.segments
    }

    /// A single non-indexed segment: merged directly into the row's own entry.
    pub fn is_simple(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].index.is_none()
    }

    /// Expand the chain under a row at `row_path` identified by `row_local_id`.
    /// A `scope` prefixes every synthetic identity in the chain.
    ///
    /// Returns `None` for simple columns, which need no synthetic entries.
    pub fn expand(
        &self,
        row_path: &str,
        row_local_id: &str,
        scope: Option<&str>,
    ) -> Option<Expansion> {
        if self.is_simple() {
            return None;
        }
        let (last, chain) = self.segments.split_last()?;
        let mut steps = Vec::with_capacity(self.segments.len());
        let mut path = normalize_key(row_path);
        let mut parent_id = row_local_id.to_string();
        let mut running: Option<String> = scope.map(str::to_string);

        let indexed_tail = last.index.is_some();
        let walked = if indexed_tail {
            &self.segments[..]
        } else {
            chain
        };
        for segment in walked {
            path = join_path(&path, &segment.name);
            let local_id = segment_identity(running.as_deref(), segment.index);
            steps.push(SyntheticStep {
                path: path.clone(),
                local_id: local_id.clone(),
                parent_id: std::mem::replace(&mut parent_id, local_id.clone()),
            });
            running = Some(local_id);
        }

        Some(Expansion {
            steps,
            field: normalize_key(&last.name),
        })
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Synthetic identity for one segment given the running identity of the chain.
pub fn segment_identity(running: Option<&str>, index: Option<usize>) -> String {
    let position = index.map_or(1, |index| index + 1);
    match running {
        None => position.to_string(),
        Some(parent) => format!("{parent}_{position}"),
    }
}

/// One synthetic entry produced by a column chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticStep {
    pub path: String,
    pub local_id: String,
    pub parent_id: String,
}

/// Synthetic entries for one dynamic column, plus the attribute key to store on
/// the last of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub steps: Vec<SyntheticStep>,
    pub field: String,
}

impl Expansion {
    /// The entry that receives the attribute value.
    pub fn terminal(&self) -> Option<&SyntheticStep> {
        self.steps.last()
    }
}

fn parse_segment(raw: &str) -> Result<ColumnSegment, String> {
    let segment = raw.trim();
    if segment.is_empty() {
        return Err("empty path segment".to_string());
    }
    let Some(open) = segment.find('[') else {
        if segment.contains(']') {
            return Err(format!("unbalanced ']' in segment '{segment}'"));
        }
        return Ok(ColumnSegment {
            name: segment.to_string(),
            index: None,
        });
    };
    let name = segment[..open].trim();
    if name.is_empty() {
        return Err(format!("missing name before '[' in segment '{segment}'"));
    }
    let Some(inner) = segment[open + 1..].strip_suffix(']') else {
        return Err(format!("unbalanced '[' in segment '{segment}'"));
    };
    if inner.contains('[') || inner.contains(']') {
        return Err(format!("nested brackets in segment '{segment}'"));
    }
    let index = inner
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("non-numeric index '{inner}' in segment '{segment}'"))?;
    Ok(ColumnSegment {
        name: name.to_string(),
        index: Some(index),
    })
}
