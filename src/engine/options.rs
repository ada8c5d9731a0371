//! Projection and ordering (OPTIONS)
//!
//! Validates the OPTIONS clause against the dataset kind and, when the query
//! carries TRANSFORMATIONS, against the grouped/derived output shape. Then
//! projects the surviving entries (or groups) into output rows and applies a
//! stable multi-key sort.

use crate::dataset::{ColumnValue, DatasetKind, Entry, Field, ID_SEPARATOR};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::parse_field_ref;
use crate::engine::transform::{Group, Transformations};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One materialized result row, keyed by output column label
pub type OutputRow = HashMap<String, ColumnValue>;

/// A single output column: either a base field of the dataset or an
/// aggregate derived by an APPLY binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Base(Field),
    Derived(String),
}

impl ColumnRef {
    /// The label this column carries in output rows: `<id>_<field>` for base
    /// fields, the bare apply key for derived columns
    pub fn label(&self, dataset_id: &str) -> String {
        match self {
            Self::Base(field) => format!("{}{}{}", dataset_id, ID_SEPARATOR, field.name()),
            Self::Derived(key) => key.clone(),
        }
    }
}

/// Sort direction for the keyed ORDER form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A validated ORDER clause
#[derive(Debug, Clone)]
pub enum Order {
    /// Bare-string form: ascending on one column
    Single(ColumnRef),
    /// Object form: ordered tie-breaking key list with an explicit direction
    Keyed { dir: Direction, keys: Vec<ColumnRef> },
}

/// A validated OPTIONS clause
#[derive(Debug, Clone)]
pub struct Options {
    pub columns: Vec<ColumnRef>,
    pub order: Option<Order>,
}

impl Options {
    /// Parse and validate a raw OPTIONS clause.
    ///
    /// With TRANSFORMATIONS present, COLUMNS may only name GROUP fields and
    /// apply keys; without, only base fields of the dataset.
    pub fn parse(
        raw: &Value,
        kind: DatasetKind,
        dataset_id: &str,
        transforms: Option<&Transformations>,
    ) -> EngineResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::validation("OPTIONS must be an object"))?;
        for key in obj.keys() {
            if key != "COLUMNS" && key != "ORDER" {
                return Err(EngineError::validation(format!(
                    "unexpected key {:?} in OPTIONS",
                    key
                )));
            }
        }

        let columns_raw = obj
            .get("COLUMNS")
            .ok_or_else(|| EngineError::validation("OPTIONS must contain COLUMNS"))?
            .as_array()
            .ok_or_else(|| EngineError::validation("COLUMNS must be an array"))?;
        if columns_raw.is_empty() {
            return Err(EngineError::validation("COLUMNS must be non-empty"));
        }
        let columns = columns_raw
            .iter()
            .map(|c| {
                let name = c
                    .as_str()
                    .ok_or_else(|| EngineError::validation("COLUMNS entries must be strings"))?;
                Self::parse_column(name, kind, dataset_id, transforms)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let order = match obj.get("ORDER") {
            Some(raw_order) => Some(Self::parse_order(raw_order, &columns, kind, dataset_id, transforms)?),
            None => None,
        };

        Ok(Self { columns, order })
    }

    fn parse_column(
        name: &str,
        kind: DatasetKind,
        dataset_id: &str,
        transforms: Option<&Transformations>,
    ) -> EngineResult<ColumnRef> {
        if !name.contains(ID_SEPARATOR) {
            // bare names are only meaningful as apply keys
            let Some(spec) = transforms else {
                return Err(EngineError::validation(format!(
                    "column {:?} must be of the form <id>_<field>",
                    name
                )));
            };
            if !spec.apply.iter().any(|rule| rule.key == name) {
                return Err(EngineError::validation(format!(
                    "column {:?} is not a defined apply key",
                    name
                )));
            }
            return Ok(ColumnRef::Derived(name.to_string()));
        }

        let field = parse_field_ref(name, kind, dataset_id)?;
        if let Some(spec) = transforms {
            if !spec.group.contains(&field) {
                return Err(EngineError::validation(format!(
                    "column {:?} must appear in GROUP when TRANSFORMATIONS is present",
                    name
                )));
            }
        }
        Ok(ColumnRef::Base(field))
    }

    fn parse_order(
        raw: &Value,
        columns: &[ColumnRef],
        kind: DatasetKind,
        dataset_id: &str,
        transforms: Option<&Transformations>,
    ) -> EngineResult<Order> {
        let resolve = |name: &str| -> EngineResult<ColumnRef> {
            let col = Self::parse_column(name, kind, dataset_id, transforms)?;
            if !columns.contains(&col) {
                return Err(EngineError::validation(format!(
                    "ORDER key {:?} must appear in COLUMNS",
                    name
                )));
            }
            Ok(col)
        };

        if let Some(name) = raw.as_str() {
            return Ok(Order::Single(resolve(name)?));
        }

        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::validation("ORDER must be a string or an object"))?;
        if obj.len() != 2 || !obj.contains_key("dir") || !obj.contains_key("keys") {
            return Err(EngineError::validation(
                "ORDER object must have exactly the keys dir and keys",
            ));
        }
        let dir = match obj["dir"].as_str() {
            Some("UP") => Direction::Up,
            Some("DOWN") => Direction::Down,
            _ => return Err(EngineError::validation("ORDER dir must be UP or DOWN")),
        };
        let keys_raw = obj["keys"]
            .as_array()
            .ok_or_else(|| EngineError::validation("ORDER keys must be an array"))?;
        if keys_raw.is_empty() {
            return Err(EngineError::validation("ORDER keys must be non-empty"));
        }
        let keys = keys_raw
            .iter()
            .map(|k| {
                let name = k
                    .as_str()
                    .ok_or_else(|| EngineError::validation("ORDER keys must be strings"))?;
                resolve(name)
            })
            .collect::<EngineResult<Vec<_>>>()?;

        Ok(Order::Keyed { dir, keys })
    }
}

/// Project filtered entries into output rows, one per entry
pub fn project_entries(
    entries: &[&Entry],
    columns: &[ColumnRef],
    dataset_id: &str,
) -> EngineResult<Vec<OutputRow>> {
    entries
        .iter()
        .map(|entry| {
            columns
                .iter()
                .map(|col| {
                    let ColumnRef::Base(field) = col else {
                        return Err(EngineError::validation(
                            "apply keys require TRANSFORMATIONS",
                        ));
                    };
                    let value = entry.value(*field).ok_or_else(|| {
                        EngineError::validation(format!(
                            "entry is missing field {:?}",
                            field.name()
                        ))
                    })?;
                    Ok((col.label(dataset_id), value))
                })
                .collect::<EngineResult<OutputRow>>()
        })
        .collect()
}

/// Project aggregated groups into output rows, one per group
pub fn project_groups(
    groups: &[Group],
    columns: &[ColumnRef],
    dataset_id: &str,
) -> EngineResult<Vec<OutputRow>> {
    groups
        .iter()
        .map(|group| {
            columns
                .iter()
                .map(|col| {
                    let value = match col {
                        ColumnRef::Base(field) => group
                            .keys
                            .iter()
                            .find(|(f, _)| f == field)
                            .map(|(_, v)| v.clone()),
                        ColumnRef::Derived(key) => group
                            .derived
                            .iter()
                            .find(|(k, _)| k == key)
                            .map(|(_, v)| ColumnValue::Number(*v)),
                    }
                    .ok_or_else(|| {
                        EngineError::validation(format!(
                            "column {:?} is not produced by TRANSFORMATIONS",
                            col.label(dataset_id)
                        ))
                    })?;
                    Ok((col.label(dataset_id), value))
                })
                .collect::<EngineResult<OutputRow>>()
        })
        .collect()
}

/// Stable multi-key sort of the output rows.
///
/// DOWN inverts the comparator for every key, so equal-key rows keep their
/// pre-sort relative order in both directions.
pub fn sort_rows(rows: &mut [OutputRow], order: &Order, dataset_id: &str) {
    let (dir, keys): (Direction, Vec<String>) = match order {
        Order::Single(col) => (Direction::Up, vec![col.label(dataset_id)]),
        Order::Keyed { dir, keys } => {
            (*dir, keys.iter().map(|k| k.label(dataset_id)).collect())
        }
    };

    rows.sort_by(|a, b| {
        let mut cmp = Ordering::Equal;
        for key in &keys {
            cmp = match (a.get(key), b.get(key)) {
                (Some(x), Some(y)) => x.compare(y),
                _ => Ordering::Equal,
            };
            if cmp != Ordering::Equal {
                break;
            }
        }
        match dir {
            Direction::Up => cmp,
            Direction::Down => cmp.reverse(),
        }
    });
}
