//! Structural comparison of parsed JSON values
//!
//! [`compare`] walks two values side by side and reports the first point where
//! they diverge. Mismatches are data, not errors: the result is `None` when the
//! values are equal and a human-readable message otherwise. Every message ends
//! with `context=<path>`, where the path is the caller's context followed by the
//! `[index]` / `["key"]` accessors leading to the differing node.

use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Kind of a JSON value as seen by the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    Sequence,
    Mapping,
    /// A value the comparator has no rule for
    Other(&'static str),
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) => Self::of_number(n),
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Sequence,
            Value::Object(_) => ValueKind::Mapping,
        }
    }

    fn of_number(n: &Number) -> Self {
        if n.is_i64() || n.is_u64() {
            ValueKind::Int
        } else if n.is_f64() {
            ValueKind::Float
        } else {
            ValueKind::Other("number")
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Sequence => "sequence",
            ValueKind::Mapping => "mapping",
            ValueKind::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Compare two values, returning a description of the first mismatch.
///
/// The walk always follows the left operand, so the wording of a mismatch
/// depends on argument order, but whether a mismatch is reported does not.
/// Floats are compared exactly.
pub fn compare(left: &Value, right: &Value, context: &str) -> Option<String> {
    let kind = ValueKind::of(left);
    let right_kind = ValueKind::of(right);
    if kind != right_kind {
        return Some(format!(
            "obj1({}) and obj2({}) are different types, so cannot be compared, context={}",
            kind, right_kind, context
        ));
    }

    match (kind, left, right) {
        (ValueKind::Null, _, _) => None,
        (ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::String, _, _) => {
            compare_scalars(left, right, kind, context)
        }
        (ValueKind::Sequence, Value::Array(l), Value::Array(r)) => compare_sequences(l, r, context),
        (ValueKind::Mapping, Value::Object(l), Value::Object(r)) => compare_mappings(l, r, context),
        _ => Some(format!(
            "comparison of {} type is not supported, context={}",
            kind, context
        )),
    }
}

fn compare_scalars(left: &Value, right: &Value, kind: ValueKind, context: &str) -> Option<String> {
    if left == right {
        return None;
    }
    Some(format!(
        "obj1={} and obj2={} are different (type={}), context={}",
        display_scalar(left),
        display_scalar(right),
        kind,
        context
    ))
}

// Strings are shown without JSON quoting
fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_sequences(left: &[Value], right: &[Value], context: &str) -> Option<String> {
    for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let next = format!("{}[{}]", context, index);
        if let Some(mismatch) = compare(l, r, &next) {
            return Some(mismatch);
        }
    }

    if left.len() != right.len() {
        return Some(format!(
            "left and right side {} comparison have different sizes {} != {}, context={}",
            ValueKind::Sequence,
            left.len(),
            right.len(),
            context
        ));
    }
    None
}

fn compare_mappings(
    left: &Map<String, Value>,
    right: &Map<String, Value>,
    context: &str,
) -> Option<String> {
    let mut left_keys: Vec<&String> = left.keys().collect();
    let mut right_keys: Vec<&String> = right.keys().collect();
    left_keys.sort();
    right_keys.sort();

    let shared = left_keys.len().min(right_keys.len());
    for key in &left_keys[..shared] {
        let Some(right_value) = right.get(key.as_str()) else {
            return Some(format!(
                "right side does not contain key={} (has {:?}) that left side does, context={}",
                key, right_keys, context
            ));
        };
        let next = format!("{}[\"{}\"]", context, key);
        if let Some(mismatch) = compare(&left[key.as_str()], right_value, &next) {
            return Some(mismatch);
        }
    }

    if left_keys.len() != right_keys.len() {
        return Some(format!(
            "left and right side {} comparison have different number of keys {} != {}, context={}",
            ValueKind::Mapping,
            left_keys.len(),
            right_keys.len(),
            context
        ));
    }
    None
}

/// Compare two text files line by line.
///
/// Returns `false` at the first differing line or when one file has more
/// lines than the other.
pub fn compare_files(path1: &Path, path2: &Path) -> Result<bool> {
    let mut lines1 = BufReader::new(File::open(path1)?).lines();
    let mut lines2 = BufReader::new(File::open(path2)?).lines();

    let mut line_number = 0usize;
    loop {
        line_number += 1;
        match (lines1.next().transpose()?, lines2.next().transpose()?) {
            (None, None) => return Ok(true),
            (Some(line1), Some(line2)) => {
                if line1 != line2 {
                    debug!("Diff line {}:", line_number);
                    debug!("\tFile 1: {}", line1);
                    debug!("\tFile 2: {}", line2);
                    return Ok(false);
                }
            }
            (Some(_), None) | (None, Some(_)) => {
                debug!(
                    "{} and {} differ in length at line {}",
                    path1.display(),
                    path2.display(),
                    line_number
                );
                return Ok(false);
            }
        }
    }
}
