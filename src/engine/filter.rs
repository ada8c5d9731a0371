//! Filter Evaluator
//!
//! Compiles a WHERE clause into a predicate over one entry. The clause is a
//! recursive tagged tree; it is parsed once into a closed sum type with
//! strict structural validation, then evaluated by pattern matching with no
//! mutation and no further checks.

use crate::dataset::{DatasetKind, Entry, Field};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::parse_field_ref;
use serde_json::Value;

/// Numeric comparison operator (exact IEEE comparison, no epsilon)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
}

/// A wildcard pattern for the IS filter. `*` is only legal at the edges.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchPattern {
    /// No wildcard: exact equality
    Exact(String),
    /// Trailing `*`: prefix match
    Prefix(String),
    /// Leading `*`: suffix match
    Suffix(String),
    /// Leading and trailing `*`: substring containment
    Contains(String),
}

impl MatchPattern {
    /// Parse a raw pattern, rejecting any `*` in a non-edge position
    pub fn parse(raw: &str) -> EngineResult<Self> {
        let front = raw.starts_with('*');
        let back = raw.ends_with('*');
        let inner = match (front, back) {
            // covers "*" and "**" as well, whose inner part is empty
            (true, true) => {
                if raw.len() <= 2 {
                    ""
                } else {
                    &raw[1..raw.len() - 1]
                }
            }
            (true, false) => &raw[1..],
            (false, true) => &raw[..raw.len() - 1],
            (false, false) => raw,
        };
        if inner.contains('*') {
            return Err(EngineError::validation(format!(
                "wildcard in {:?} is only allowed as the first or last character",
                raw
            )));
        }
        let inner = inner.to_string();
        Ok(match (front, back) {
            (true, true) => Self::Contains(inner),
            (true, false) => Self::Suffix(inner),
            (false, true) => Self::Prefix(inner),
            (false, false) => Self::Exact(inner),
        })
    }

    /// Whether a field value matches this pattern
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Exact(s) => value == s,
            Self::Prefix(s) => value.starts_with(s.as_str()),
            Self::Suffix(s) => value.ends_with(s.as_str()),
            Self::Contains(s) => value.contains(s.as_str()),
        }
    }
}

/// A compiled WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// The empty object `{}`: accepts everything
    All,
    /// AND over one or more children
    And(Vec<FilterExpr>),
    /// OR over one or more children
    Or(Vec<FilterExpr>),
    /// Logical negation of a single child
    Not(Box<FilterExpr>),
    /// Numeric comparison against a registered numeric field
    Compare {
        op: CompareOp,
        field: Field,
        value: f64,
    },
    /// Wildcard match against a registered textual field
    Match { field: Field, pattern: MatchPattern },
}

impl FilterExpr {
    /// Parse and validate a raw WHERE clause for the given dataset.
    ///
    /// Every field reference must name `dataset_id` and be registered for
    /// `kind`; structural violations are validation errors before any entry
    /// is scanned.
    pub fn parse(raw: &Value, kind: DatasetKind, dataset_id: &str) -> EngineResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::validation("filter must be an object"))?;
        if obj.is_empty() {
            return Ok(Self::All);
        }
        if obj.len() != 1 {
            return Err(EngineError::validation(
                "filter object must have exactly one key",
            ));
        }
        let (key, inner) = obj
            .iter()
            .next()
            .ok_or_else(|| EngineError::validation("filter object must have exactly one key"))?;

        match key.as_str() {
            "AND" | "OR" => {
                let children = inner.as_array().ok_or_else(|| {
                    EngineError::validation(format!("{} operand must be an array", key))
                })?;
                if children.is_empty() {
                    return Err(EngineError::validation(format!(
                        "{} operand must be a non-empty array",
                        key
                    )));
                }
                let compiled = children
                    .iter()
                    .map(|c| Self::parse(c, kind, dataset_id))
                    .collect::<EngineResult<Vec<_>>>()?;
                Ok(if key == "AND" {
                    Self::And(compiled)
                } else {
                    Self::Or(compiled)
                })
            }
            "NOT" => {
                let child = Self::parse(inner, kind, dataset_id)?;
                Ok(Self::Not(Box::new(child)))
            }
            "GT" | "LT" | "EQ" => {
                let op = match key.as_str() {
                    "GT" => CompareOp::Gt,
                    "LT" => CompareOp::Lt,
                    _ => CompareOp::Eq,
                };
                let (field, value) = parse_comparison_body(key, inner, kind, dataset_id)?;
                let value = value.as_f64().ok_or_else(|| {
                    EngineError::validation(format!("{} comparison value must be a number", key))
                })?;
                if !field.is_numeric() {
                    return Err(EngineError::validation(format!(
                        "{} requires a numeric field, got {:?}",
                        key,
                        field.name()
                    )));
                }
                Ok(Self::Compare { op, field, value })
            }
            "IS" => {
                let (field, value) = parse_comparison_body(key, inner, kind, dataset_id)?;
                let raw_pattern = value.as_str().ok_or_else(|| {
                    EngineError::validation("IS comparison value must be a string")
                })?;
                if field.is_numeric() {
                    return Err(EngineError::validation(format!(
                        "IS requires a textual field, got {:?}",
                        field.name()
                    )));
                }
                let pattern = MatchPattern::parse(raw_pattern)?;
                Ok(Self::Match { field, pattern })
            }
            other => Err(EngineError::validation(format!(
                "unrecognized filter key {:?}",
                other
            ))),
        }
    }

    /// Whether an entry satisfies this filter
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::And(children) => children.iter().all(|c| c.matches(entry)),
            Self::Or(children) => children.iter().any(|c| c.matches(entry)),
            Self::Not(child) => !child.matches(entry),
            Self::Compare { op, field, value } => {
                entry.number(*field).is_some_and(|v| match op {
                    CompareOp::Gt => v > *value,
                    CompareOp::Lt => v < *value,
                    CompareOp::Eq => v == *value,
                })
            }
            Self::Match { field, pattern } => {
                entry.text(*field).is_some_and(|s| pattern.matches(s))
            }
        }
    }
}

/// Validate the inner object of a comparison: exactly one key of the form
/// `<id>_<field>`, returning the parsed field and the raw value.
fn parse_comparison_body<'a>(
    op: &str,
    inner: &'a Value,
    kind: DatasetKind,
    dataset_id: &str,
) -> EngineResult<(Field, &'a Value)> {
    let obj = inner.as_object().ok_or_else(|| {
        EngineError::validation(format!("{} operand must be an object", op))
    })?;
    if obj.len() != 1 {
        return Err(EngineError::validation(format!(
            "{} operand must have exactly one key",
            op
        )));
    }
    let (key, value) = obj
        .iter()
        .next()
        .ok_or_else(|| EngineError::validation(format!("{} operand must have exactly one key", op)))?;
    let field = parse_field_ref(key, kind, dataset_id)?;
    Ok((field, value))
}
