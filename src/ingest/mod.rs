//! Payload ingestion
//!
//! Turns an uploaded payload into the entries of a new dataset. Each kind
//! has its own decoder: course sections arrive as a zip of JSON files,
//! rooms as a single pre-resolved JSON document.
//!
//! Decoders are lenient per record and strict per payload: a malformed
//! record or file is skipped with a log line, but a payload that yields no
//! entries at all is rejected.

mod rooms;
mod sections;

pub use rooms::parse_rooms;
pub use sections::parse_sections;

use crate::dataset::{DatasetKind, Entry};
use thiserror::Error;

/// Errors produced while decoding an uploaded payload
#[derive(Error, Debug)]
pub enum IngestError {
    /// The payload is not a readable zip archive
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// The payload body does not have the expected structure
    #[error("invalid payload: {0}")]
    Payload(String),

    /// The payload decoded cleanly but produced no entries
    #[error("payload contains no valid entries")]
    Empty,
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Decode an uploaded payload into entries for a dataset of the given kind
pub fn parse_payload(kind: DatasetKind, bytes: &[u8]) -> IngestResult<Vec<Entry>> {
    let entries = match kind {
        DatasetKind::Sections => parse_sections(bytes)?,
        DatasetKind::Rooms => parse_rooms(bytes)?,
    };
    if entries.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(entries)
}

/// Normalize a JSON value to a number: numbers pass through, strings must
/// parse as a number in their entirety. Anything else is a miss, so garbage
/// like `"12abc3"` skips the record instead of inventing a value.
fn coerce_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Normalize a JSON value to a string: strings pass through, scalars are
/// stringified.
fn coerce_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
