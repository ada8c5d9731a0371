//! Course section decoding
//!
//! A sections payload is a zip archive with a `courses/` folder of JSON
//! files, each holding `{"result": [...]}`. Individual records or files
//! that fail to decode are skipped; an unreadable archive is an error.

use crate::dataset::{Entry, Section};
use crate::ingest::{coerce_number, coerce_string, IngestResult};
use serde_json::Value;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;

const COURSES_PREFIX: &str = "courses/";

/// Year recorded for section records aggregated across offerings
const OVERALL_YEAR: f64 = 1900.0;

/// Decode a sections zip archive into entries
pub fn parse_sections(bytes: &[u8]) -> IngestResult<Vec<Entry>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::new();

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() || !file.name().starts_with(COURSES_PREFIX) {
            continue;
        }
        let name = file.name().to_string();
        let mut contents = String::new();
        if file.read_to_string(&mut contents).is_err() {
            debug!(file = %name, "skipping unreadable archive member");
            continue;
        }
        let parsed: Value = match serde_json::from_str(&contents) {
            Ok(v) => v,
            Err(err) => {
                debug!(file = %name, error = %err, "skipping non-JSON course file");
                continue;
            }
        };
        let Some(records) = parsed.get("result").and_then(Value::as_array) else {
            debug!(file = %name, "skipping course file without a result array");
            continue;
        };
        for record in records {
            if let Some(section) = decode_record(record) {
                entries.push(Entry::Section(section));
            }
        }
    }

    Ok(entries)
}

/// Decode one raw course record. `None` when any required field is missing
/// or uncoercible.
fn decode_record(record: &Value) -> Option<Section> {
    let obj = record.as_object()?;

    let year = if obj.get("Section").and_then(Value::as_str) == Some("overall") {
        OVERALL_YEAR
    } else {
        coerce_number(obj.get("Year")?)?
    };

    Some(Section {
        uuid: coerce_string(obj.get("id")?)?,
        id: coerce_string(obj.get("Course")?)?,
        title: coerce_string(obj.get("Title")?)?,
        instructor: coerce_string(obj.get("Professor")?)?,
        dept: coerce_string(obj.get("Subject")?)?,
        avg: coerce_number(obj.get("Avg")?)?,
        pass: coerce_number(obj.get("Pass")?)?,
        fail: coerce_number(obj.get("Fail")?)?,
        audit: coerce_number(obj.get("Audit")?)?,
        year,
    })
}
