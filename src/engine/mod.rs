//! Query evaluation engine
//!
//! Evaluates a JSON-encoded structured query against exactly one dataset:
//!
//! - **Filter**: compiles the WHERE clause into a predicate over one entry
//! - **Transform**: grouping and aggregation (TRANSFORMATIONS)
//! - **Options**: column projection and multi-key ordering (OPTIONS)
//! - **Executor**: validates the query envelope and sequences the stages
//!
//! # Pipeline
//!
//! ```text
//! raw entries → filter → (optional) group/aggregate → project → sort → rows
//! ```
//!
//! The engine is synchronous and side-effect-free: it borrows an immutable
//! dataset snapshot for the duration of one query and produces freshly
//! constructed output rows. It never logs; observability belongs to the
//! transport layer.

mod error;
mod executor;
mod filter;
mod options;
mod transform;

pub use error::{EngineError, EngineResult};
pub use executor::{evaluate, DatasetLookup, OutputRow, MAX_RESULTS};
pub use filter::{CompareOp, FilterExpr, MatchPattern};
pub use options::{ColumnRef, Direction, Options, Order};
pub use transform::{ApplyRule, ApplyToken, Group, Transformations};

use crate::dataset::{DatasetKind, Field, ID_SEPARATOR};

/// Parse a qualified field reference of the form `<id>_<field>`.
///
/// Requires exactly one separator, the id component to equal the query's
/// unified dataset id, and the field to be registered for the kind.
pub(crate) fn parse_field_ref(
    raw: &str,
    kind: DatasetKind,
    dataset_id: &str,
) -> EngineResult<Field> {
    if raw.matches(ID_SEPARATOR).count() != 1 {
        return Err(EngineError::validation(format!(
            "key {:?} must be of the form <id>_<field>",
            raw
        )));
    }
    let (id, field_name) = raw
        .split_once(ID_SEPARATOR)
        .ok_or_else(|| EngineError::validation(format!("key {:?} is malformed", raw)))?;
    if id != dataset_id {
        return Err(EngineError::validation(format!(
            "key {:?} references dataset {:?}; a query must reference exactly one dataset ({:?})",
            raw, id, dataset_id
        )));
    }
    Field::parse(kind, field_name).ok_or_else(|| {
        EngineError::validation(format!(
            "{:?} is not a valid {} field",
            field_name, kind
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SectionField;

    #[test]
    fn test_parse_field_ref() {
        let field = parse_field_ref("courses_avg", DatasetKind::Sections, "courses").unwrap();
        assert_eq!(field, Field::Section(SectionField::Avg));

        // wrong dataset id
        assert!(parse_field_ref("other_avg", DatasetKind::Sections, "courses").is_err());
        // no separator
        assert!(parse_field_ref("avg", DatasetKind::Sections, "courses").is_err());
        // too many separators
        assert!(parse_field_ref("courses_avg_x", DatasetKind::Sections, "courses").is_err());
        // wrong-kind field
        assert!(parse_field_ref("courses_seats", DatasetKind::Sections, "courses").is_err());
    }
}
