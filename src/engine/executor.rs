//! Query executor
//!
//! Validates the query envelope, resolves the one dataset the query
//! references, and sequences the evaluation stages. The oversize check runs
//! on the entries surviving WHERE, before any grouping, so a query that
//! matches too much is rejected even if aggregation would have collapsed it
//! under the limit.

use crate::dataset::{Dataset, Entry, ID_SEPARATOR};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::filter::FilterExpr;
use crate::engine::options::{project_entries, project_groups, sort_rows, Options};
use crate::engine::transform::{group_and_apply, Transformations};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::engine::options::OutputRow;

/// Maximum number of entries a query may match
pub const MAX_RESULTS: usize = 5000;

/// Read access to the registered datasets for the duration of one query
pub trait DatasetLookup {
    fn get(&self, id: &str) -> Option<&Dataset>;
}

impl DatasetLookup for HashMap<String, Arc<Dataset>> {
    fn get(&self, id: &str) -> Option<&Dataset> {
        HashMap::get(self, id).map(Arc::as_ref)
    }
}

/// Evaluate a raw JSON query against a dataset snapshot
pub fn evaluate(raw: &Value, datasets: &impl DatasetLookup) -> EngineResult<Vec<OutputRow>> {
    let envelope = raw
        .as_object()
        .ok_or_else(|| EngineError::validation("query must be a JSON object"))?;
    for key in envelope.keys() {
        if key != "WHERE" && key != "OPTIONS" && key != "TRANSFORMATIONS" {
            return Err(EngineError::validation(format!(
                "unexpected key {:?} in query",
                key
            )));
        }
    }
    let where_raw = envelope
        .get("WHERE")
        .ok_or_else(|| EngineError::validation("query must contain WHERE"))?;
    let options_raw = envelope
        .get("OPTIONS")
        .ok_or_else(|| EngineError::validation("query must contain OPTIONS"))?;
    let transforms_raw = envelope.get("TRANSFORMATIONS");

    let dataset_id = infer_dataset_id(options_raw)?;
    let dataset = datasets
        .get(&dataset_id)
        .ok_or_else(|| EngineError::DatasetNotFound(dataset_id.clone()))?;
    let kind = dataset.kind();

    let filter = FilterExpr::parse(where_raw, kind, &dataset_id)?;
    let matched: Vec<&Entry> = dataset
        .entries()
        .iter()
        .filter(|e| filter.matches(e))
        .collect();
    if matched.len() > MAX_RESULTS {
        return Err(EngineError::ResultTooLarge);
    }

    let transforms = transforms_raw
        .map(|raw| Transformations::parse(raw, kind, &dataset_id))
        .transpose()?;
    let options = Options::parse(options_raw, kind, &dataset_id, transforms.as_ref())?;

    let mut rows = match &transforms {
        Some(spec) => {
            let groups = group_and_apply(&matched, spec)?;
            project_groups(&groups, &options.columns, &dataset_id)?
        }
        None => project_entries(&matched, &options.columns, &dataset_id)?,
    };

    if let Some(order) = &options.order {
        sort_rows(&mut rows, order, &dataset_id);
    }
    Ok(rows)
}

/// Recover the single dataset id a query references.
///
/// The first entry of COLUMNS decides: it must be a string of the form
/// `<id>_<field>`, so a query whose first column is a bare apply key is
/// rejected before any lookup.
fn infer_dataset_id(options_raw: &Value) -> EngineResult<String> {
    let columns = options_raw
        .as_object()
        .and_then(|o| o.get("COLUMNS"))
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::validation("OPTIONS must contain a COLUMNS array"))?;

    let first = columns
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::validation("COLUMNS must start with a string key"))?;

    let (id, field) = first.split_once(ID_SEPARATOR).ok_or_else(|| {
        EngineError::validation(format!(
            "first column {:?} must be of the form <id>_<field>",
            first
        ))
    })?;
    if id.is_empty() || field.is_empty() {
        return Err(EngineError::validation(format!(
            "key {:?} must be of the form <id>_<field> with non-empty parts",
            first
        )));
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnValue, DatasetKind, Section};
    use serde_json::json;

    fn section(dept: &str, id: &str, avg: f64, instructor: &str) -> Entry {
        Entry::Section(Section {
            uuid: format!("{}-{}", dept, id),
            id: id.to_string(),
            title: "t".to_string(),
            instructor: instructor.to_string(),
            dept: dept.to_string(),
            avg,
            pass: 10.0,
            fail: 1.0,
            audit: 0.0,
            year: 2019.0,
        })
    }

    fn registry(entries: Vec<Entry>) -> HashMap<String, Arc<Dataset>> {
        let dataset = Dataset::new("courses".to_string(), DatasetKind::Sections, entries);
        let mut map = HashMap::new();
        map.insert("courses".to_string(), Arc::new(dataset));
        map
    }

    #[test]
    fn test_filter_project_sort_end_to_end() {
        let datasets = registry(vec![
            section("cpsc", "310", 80.0, "smith"),
            section("cpsc", "210", 70.0, "jones"),
            section("math", "100", 95.0, "chan"),
            section("math", "200", 85.0, "chan"),
        ]);
        let query = json!({
            "WHERE": {
                "OR": [
                    {"AND": [
                        {"GT": {"courses_avg": 75.0}},
                        {"IS": {"courses_dept": "cpsc"}}
                    ]},
                    {"GT": {"courses_avg": 90.0}}
                ]
            },
            "OPTIONS": {
                "COLUMNS": ["courses_dept", "courses_id", "courses_avg"],
                "ORDER": "courses_avg"
            }
        });

        let rows = evaluate(&query, &datasets).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["courses_avg"], ColumnValue::Number(80.0));
        assert_eq!(rows[1]["courses_avg"], ColumnValue::Number(95.0));
        assert_eq!(rows[0].len(), 3);
    }

    #[test]
    fn test_transformations_end_to_end() {
        let datasets = registry(vec![
            section("cpsc", "310", 80.0, "smith"),
            section("cpsc", "210", 70.0, "jones"),
            section("math", "100", 90.0, "chan"),
        ]);
        let query = json!({
            "WHERE": {},
            "OPTIONS": {
                "COLUMNS": ["courses_dept", "overallAvg", "n"],
                "ORDER": {"dir": "DOWN", "keys": ["overallAvg"]}
            },
            "TRANSFORMATIONS": {
                "GROUP": ["courses_dept"],
                "APPLY": [
                    {"overallAvg": {"AVG": "courses_avg"}},
                    {"n": {"COUNT": "courses_uuid"}}
                ]
            }
        });

        let rows = evaluate(&query, &datasets).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["courses_dept"], ColumnValue::Text("math".to_string()));
        assert_eq!(rows[0]["overallAvg"], ColumnValue::Number(90.0));
        assert_eq!(rows[1]["overallAvg"], ColumnValue::Number(75.0));
        assert_eq!(rows[1]["n"], ColumnValue::Number(2.0));
    }

    #[test]
    fn test_result_too_large() {
        let entries: Vec<Entry> = (0..=MAX_RESULTS)
            .map(|i| section("cpsc", &i.to_string(), 80.0, "smith"))
            .collect();
        let datasets = registry(entries);
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["courses_uuid"]}
        });

        let result = evaluate(&query, &datasets);
        assert!(matches!(result, Err(EngineError::ResultTooLarge)));
    }

    #[test]
    fn test_oversize_checked_before_aggregation() {
        // grouping would collapse everything into one row, but the raw match
        // set is still over the limit
        let entries: Vec<Entry> = (0..=MAX_RESULTS)
            .map(|i| section("cpsc", &i.to_string(), 80.0, "smith"))
            .collect();
        let datasets = registry(entries);
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["courses_dept"]},
            "TRANSFORMATIONS": {
                "GROUP": ["courses_dept"],
                "APPLY": []
            }
        });

        let result = evaluate(&query, &datasets);
        assert!(matches!(result, Err(EngineError::ResultTooLarge)));
    }

    #[test]
    fn test_exactly_max_results_allowed() {
        let entries: Vec<Entry> = (0..MAX_RESULTS)
            .map(|i| section("cpsc", &i.to_string(), 80.0, "smith"))
            .collect();
        let datasets = registry(entries);
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["courses_uuid"]}
        });

        let rows = evaluate(&query, &datasets).unwrap();
        assert_eq!(rows.len(), MAX_RESULTS);
    }

    #[test]
    fn test_dataset_not_found() {
        let datasets: HashMap<String, Arc<Dataset>> = HashMap::new();
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["nope_avg"]}
        });

        let result = evaluate(&query, &datasets);
        assert!(matches!(result, Err(EngineError::DatasetNotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_envelope_validation() {
        let datasets = registry(vec![section("cpsc", "310", 80.0, "smith")]);
        // extra top-level key
        assert!(evaluate(
            &json!({"WHERE": {}, "OPTIONS": {"COLUMNS": ["courses_avg"]}, "LIMIT": 5}),
            &datasets
        )
        .is_err());
        // missing WHERE
        assert!(evaluate(&json!({"OPTIONS": {"COLUMNS": ["courses_avg"]}}), &datasets).is_err());
        // missing OPTIONS
        assert!(evaluate(&json!({"WHERE": {}}), &datasets).is_err());
        // not an object
        assert!(evaluate(&json!([1, 2]), &datasets).is_err());
    }

    #[test]
    fn test_bare_first_column_rejected() {
        // the first column decides the dataset, so an apply key cannot
        // lead even when later columns are qualified
        let datasets = registry(vec![
            section("cpsc", "310", 80.0, "smith"),
            section("math", "100", 90.0, "chan"),
        ]);
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["n", "courses_dept"]},
            "TRANSFORMATIONS": {
                "GROUP": ["courses_dept"],
                "APPLY": [{"n": {"COUNT": "courses_uuid"}}]
            }
        });

        let result = evaluate(&query, &datasets);
        assert!(matches!(result, Err(EngineError::Validation(_))));

        // qualified first column, same query otherwise
        let query = json!({
            "WHERE": {},
            "OPTIONS": {"COLUMNS": ["courses_dept", "n"]},
            "TRANSFORMATIONS": {
                "GROUP": ["courses_dept"],
                "APPLY": [{"n": {"COUNT": "courses_uuid"}}]
            }
        });
        assert_eq!(evaluate(&query, &datasets).unwrap().len(), 2);
    }
}
