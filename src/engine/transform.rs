//! Grouping/Aggregation Engine
//!
//! Consumes the TRANSFORMATIONS clause: partitions the filtered entries into
//! groups by equality of their GROUP key tuple, then computes one derived
//! numeric value per APPLY binding per group.
//!
//! Grouping buckets candidates by hashing the key tuple but always compares
//! full tuples on a hash match, so colliding tuples can never merge distinct
//! groups. Groups come out in first-seen order.
//!
//! SUM and AVG accumulate in exact decimal arithmetic rather than binary
//! floating point, then round to two decimal places half-away-from-zero, so
//! results are deterministic and independent of member order.

use crate::dataset::{ColumnValue, DatasetKind, Entry, Field, ID_SEPARATOR};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::parse_field_ref;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Aggregate operation of one APPLY binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyToken {
    Max,
    Min,
    Avg,
    Count,
    Sum,
}

impl ApplyToken {
    /// Parse from the wire token
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MAX" => Some(Self::Max),
            "MIN" => Some(Self::Min),
            "AVG" => Some(Self::Avg),
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            _ => None,
        }
    }

    /// Wire name of the token
    pub fn name(&self) -> &'static str {
        match self {
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Sum => "SUM",
        }
    }
}

/// One named aggregate binding: `{applyKey: {TOKEN: "<id>_<field>"}}`
#[derive(Debug, Clone)]
pub struct ApplyRule {
    pub key: String,
    pub token: ApplyToken,
    pub source: Field,
}

/// A validated TRANSFORMATIONS clause
#[derive(Debug, Clone)]
pub struct Transformations {
    pub group: Vec<Field>,
    pub apply: Vec<ApplyRule>,
}

impl Transformations {
    /// Parse and validate a raw TRANSFORMATIONS clause
    pub fn parse(raw: &Value, kind: DatasetKind, dataset_id: &str) -> EngineResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::validation("TRANSFORMATIONS must be an object"))?;
        if obj.len() != 2 || !obj.contains_key("GROUP") || !obj.contains_key("APPLY") {
            return Err(EngineError::validation(
                "TRANSFORMATIONS must have exactly the keys GROUP and APPLY",
            ));
        }

        let group_raw = obj["GROUP"]
            .as_array()
            .ok_or_else(|| EngineError::validation("GROUP must be an array"))?;
        if group_raw.is_empty() {
            return Err(EngineError::validation("GROUP must be a non-empty array"));
        }
        let group = group_raw
            .iter()
            .map(|g| {
                let key = g
                    .as_str()
                    .ok_or_else(|| EngineError::validation("GROUP keys must be strings"))?;
                parse_field_ref(key, kind, dataset_id)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let apply_raw = obj["APPLY"]
            .as_array()
            .ok_or_else(|| EngineError::validation("APPLY must be an array"))?;
        let mut seen_keys = HashSet::new();
        let apply = apply_raw
            .iter()
            .map(|entry| {
                let rule = Self::parse_apply_rule(entry, kind, dataset_id)?;
                if !seen_keys.insert(rule.key.clone()) {
                    return Err(EngineError::validation(format!(
                        "duplicate apply key {:?}",
                        rule.key
                    )));
                }
                Ok(rule)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Self { group, apply })
    }

    fn parse_apply_rule(raw: &Value, kind: DatasetKind, dataset_id: &str) -> EngineResult<ApplyRule> {
        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::validation("APPLY entries must be objects"))?;
        if obj.len() != 1 {
            return Err(EngineError::validation(
                "APPLY entries must have exactly one key",
            ));
        }
        let (apply_key, inner) = obj
            .iter()
            .next()
            .ok_or_else(|| EngineError::validation("APPLY entries must have exactly one key"))?;
        if apply_key.is_empty() || apply_key.contains(ID_SEPARATOR) {
            return Err(EngineError::validation(format!(
                "apply key {:?} must be non-empty and must not contain {:?}",
                apply_key, ID_SEPARATOR
            )));
        }

        let inner_obj = inner.as_object().ok_or_else(|| {
            EngineError::validation(format!("apply key {:?} must map to an object", apply_key))
        })?;
        if inner_obj.len() != 1 {
            return Err(EngineError::validation(format!(
                "apply key {:?} must map to an object with exactly one token",
                apply_key
            )));
        }
        let (token_raw, source_raw) = inner_obj
            .iter()
            .next()
            .ok_or_else(|| EngineError::validation("apply body must have exactly one token"))?;
        let token = ApplyToken::parse(token_raw).ok_or_else(|| {
            EngineError::validation(format!("unknown apply token {:?}", token_raw))
        })?;
        let source_key = source_raw.as_str().ok_or_else(|| {
            EngineError::validation(format!("{} source must be a string key", token.name()))
        })?;
        let source = parse_field_ref(source_key, kind, dataset_id)?;
        if token != ApplyToken::Count && !source.is_numeric() {
            return Err(EngineError::validation(format!(
                "{} must be applied to a numeric field, got {:?}",
                token.name(),
                source.name()
            )));
        }

        Ok(ApplyRule {
            key: apply_key.clone(),
            token,
            source,
        })
    }
}

/// One group: the shared key tuple plus the derived aggregate values
#[derive(Debug, Clone)]
pub struct Group {
    /// GROUP-field values shared by every member, in GROUP order
    pub keys: Vec<(Field, ColumnValue)>,
    /// One derived value per APPLY binding, in APPLY order
    pub derived: Vec<(String, f64)>,
}

/// Partition entries into groups and compute the APPLY aggregates.
///
/// The union of all groups' members equals exactly the input set; no entry
/// lands in two groups, none is omitted.
pub fn group_and_apply(entries: &[&Entry], spec: &Transformations) -> EngineResult<Vec<Group>> {
    // bucket by hashed key tuple, full-tuple equality on collision
    let mut index: HashMap<Vec<ColumnValue>, usize> = HashMap::new();
    let mut buckets: Vec<(Vec<(Field, ColumnValue)>, Vec<usize>)> = Vec::new();

    for (pos, entry) in entries.iter().enumerate() {
        let tuple = spec
            .group
            .iter()
            .map(|f| entry.value(*f))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EngineError::validation("GROUP field missing from entry"))?;
        match index.get(&tuple) {
            Some(&bucket) => buckets[bucket].1.push(pos),
            None => {
                let keyed = spec.group.iter().copied().zip(tuple.iter().cloned()).collect();
                index.insert(tuple, buckets.len());
                buckets.push((keyed, vec![pos]));
            }
        }
    }

    buckets
        .into_iter()
        .map(|(keys, members)| {
            let derived = spec
                .apply
                .iter()
                .map(|rule| {
                    let value = apply_rule(rule, &members, entries)?;
                    Ok((rule.key.clone(), value))
                })
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(Group { keys, derived })
        })
        .collect()
}

/// Compute one aggregate over a group's members
fn apply_rule(rule: &ApplyRule, members: &[usize], entries: &[&Entry]) -> EngineResult<f64> {
    if rule.token == ApplyToken::Count {
        return Ok(members.len() as f64);
    }

    let values = members
        .iter()
        .map(|&pos| entries[pos].number(rule.source))
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            EngineError::validation(format!(
                "{} must be applied to a key with a numerical value",
                rule.token.name()
            ))
        })?;

    match rule.token {
        ApplyToken::Max => Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        ApplyToken::Min => Ok(values.iter().copied().fold(f64::INFINITY, f64::min)),
        ApplyToken::Sum => decimal_sum(&values).and_then(round_two_places),
        ApplyToken::Avg => {
            let sum = decimal_sum(&values)?;
            round_two_places(sum / Decimal::from(values.len()))
        }
        ApplyToken::Count => unreachable!("handled above"),
    }
}

fn decimal_sum(values: &[f64]) -> EngineResult<Decimal> {
    let mut sum = Decimal::ZERO;
    for &v in values {
        let d = Decimal::from_f64(v).ok_or_else(|| {
            EngineError::validation("aggregate source value is not representable")
        })?;
        sum += d;
    }
    Ok(sum)
}

/// Round to exactly two decimal places, half away from zero
fn round_two_places(value: Decimal) -> EngineResult<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| EngineError::validation("aggregate result is out of range"))
}
