//! Room decoding
//!
//! A rooms payload is a single JSON document `{"rooms": [...]}` of records
//! whose geocoordinates were resolved upstream. The `name` field is derived
//! from the short building name and the room number.

use crate::dataset::{Entry, Room, ID_SEPARATOR};
use crate::ingest::{coerce_number, coerce_string, IngestError, IngestResult};
use serde_json::Value;
use tracing::debug;

/// Decode a rooms JSON payload into entries
pub fn parse_rooms(bytes: &[u8]) -> IngestResult<Vec<Entry>> {
    let parsed: Value = serde_json::from_slice(bytes)
        .map_err(|err| IngestError::Payload(format!("rooms payload is not JSON: {}", err)))?;
    let records = parsed
        .get("rooms")
        .and_then(Value::as_array)
        .ok_or_else(|| IngestError::Payload("rooms payload must contain a rooms array".into()))?;

    let mut entries = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match decode_record(record) {
            Some(room) => entries.push(Entry::Room(room)),
            None => debug!(index, "skipping invalid room record"),
        }
    }
    Ok(entries)
}

/// Decode one raw room record. `None` when any required field is missing or
/// uncoercible. Missing seat counts default to zero.
fn decode_record(record: &Value) -> Option<Room> {
    let obj = record.as_object()?;

    let shortname = coerce_string(obj.get("shortname")?)?;
    let number = coerce_string(obj.get("number")?)?;
    let name = format!("{}{}{}", shortname, ID_SEPARATOR, number);
    let seats = obj.get("seats").and_then(coerce_number).unwrap_or(0.0);

    Some(Room {
        fullname: coerce_string(obj.get("fullname")?)?,
        shortname,
        number,
        name,
        address: coerce_string(obj.get("address")?)?,
        room_type: coerce_string(obj.get("type")?)?,
        furniture: coerce_string(obj.get("furniture")?)?,
        href: coerce_string(obj.get("href")?)?,
        lat: coerce_number(obj.get("lat")?)?,
        lon: coerce_number(obj.get("lon")?)?,
        seats,
    })
}
