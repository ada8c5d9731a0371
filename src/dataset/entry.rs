//! Dataset entries
//!
//! One row of a dataset: a course section or a room. Ingestion has already
//! type-coerced every field, so entries always carry validated values; the
//! engine only ever validates field *names* against the registry.

use crate::dataset::fields::{Field, RoomField, SectionField};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// One course section record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub uuid: String,
    pub id: String,
    pub title: String,
    pub instructor: String,
    pub dept: String,
    pub avg: f64,
    pub pass: f64,
    pub fail: f64,
    pub audit: f64,
    pub year: f64,
}

/// One room record (geocoordinates resolved upstream by ingestion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub fullname: String,
    pub shortname: String,
    pub number: String,
    pub name: String,
    pub address: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub furniture: String,
    pub href: String,
    pub lat: f64,
    pub lon: f64,
    pub seats: f64,
}

/// One dataset entry; every entry of a dataset has the dataset's kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Entry {
    Section(Section),
    Room(Room),
}

impl Entry {
    /// Numeric field access. `None` on a kind mismatch or textual field;
    /// unreachable once the field has been validated against the registry.
    pub fn number(&self, field: Field) -> Option<f64> {
        match (self, field) {
            (Entry::Section(s), Field::Section(f)) => match f {
                SectionField::Avg => Some(s.avg),
                SectionField::Pass => Some(s.pass),
                SectionField::Fail => Some(s.fail),
                SectionField::Audit => Some(s.audit),
                SectionField::Year => Some(s.year),
                _ => None,
            },
            (Entry::Room(r), Field::Room(f)) => match f {
                RoomField::Lat => Some(r.lat),
                RoomField::Lon => Some(r.lon),
                RoomField::Seats => Some(r.seats),
                _ => None,
            },
            _ => None,
        }
    }

    /// Textual field access, same contract as [`Entry::number`]
    pub fn text(&self, field: Field) -> Option<&str> {
        match (self, field) {
            (Entry::Section(s), Field::Section(f)) => match f {
                SectionField::Uuid => Some(&s.uuid),
                SectionField::Id => Some(&s.id),
                SectionField::Title => Some(&s.title),
                SectionField::Instructor => Some(&s.instructor),
                SectionField::Dept => Some(&s.dept),
                _ => None,
            },
            (Entry::Room(r), Field::Room(f)) => match f {
                RoomField::Fullname => Some(&r.fullname),
                RoomField::Shortname => Some(&r.shortname),
                RoomField::Number => Some(&r.number),
                RoomField::Name => Some(&r.name),
                RoomField::Address => Some(&r.address),
                RoomField::Type => Some(&r.room_type),
                RoomField::Furniture => Some(&r.furniture),
                RoomField::Href => Some(&r.href),
                _ => None,
            },
            _ => None,
        }
    }

    /// Field access as an owned [`ColumnValue`] (for grouping and projection)
    pub fn value(&self, field: Field) -> Option<ColumnValue> {
        if field.is_numeric() {
            self.number(field).map(ColumnValue::Number)
        } else {
            self.text(field).map(|s| ColumnValue::Text(s.to_string()))
        }
    }
}

/// A value in an output row or a group key: a string or a number
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Text(String),
    Number(f64),
}

// Grouping buckets key tuples by hash but must still compare full tuples on
// collision. Numbers hash and compare by IEEE bit pattern so the value is
// usable as a HashMap key; entry values are never NaN.
impl Eq for ColumnValue {}

impl Hash for ColumnValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            ColumnValue::Text(s) => {
                state.write_u8(0);
                s.hash(state);
            }
            ColumnValue::Number(n) => {
                state.write_u8(1);
                n.to_bits().hash(state);
            }
        }
    }
}

impl ColumnValue {
    /// Ordering between two values of the same column. Columns are
    /// homogeneous, so the mixed cases only exist to keep the order total.
    pub fn compare(&self, other: &ColumnValue) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (ColumnValue::Number(a), ColumnValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a.cmp(b),
            (ColumnValue::Number(_), ColumnValue::Text(_)) => Ordering::Less,
            (ColumnValue::Text(_), ColumnValue::Number(_)) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fields::DatasetKind;

    pub(crate) fn sample_section() -> Section {
        Section {
            uuid: "1234".to_string(),
            id: "310".to_string(),
            title: "software eng".to_string(),
            instructor: "smith, jo".to_string(),
            dept: "cpsc".to_string(),
            avg: 82.5,
            pass: 100.0,
            fail: 4.0,
            audit: 1.0,
            year: 2019.0,
        }
    }

    #[test]
    fn test_section_field_access() {
        let entry = Entry::Section(sample_section());
        let avg = Field::parse(DatasetKind::Sections, "avg").unwrap();
        let dept = Field::parse(DatasetKind::Sections, "dept").unwrap();

        assert_eq!(entry.number(avg), Some(82.5));
        assert_eq!(entry.text(dept), Some("cpsc"));
        assert_eq!(entry.value(dept), Some(ColumnValue::Text("cpsc".into())));
        // numeric accessor on a textual field misses
        assert_eq!(entry.number(dept), None);
        // wrong-kind field misses
        let seats = Field::parse(DatasetKind::Rooms, "seats").unwrap();
        assert_eq!(entry.number(seats), None);
    }

    #[test]
    fn test_column_value_compare() {
        use std::cmp::Ordering;
        let a = ColumnValue::Number(1.0);
        let b = ColumnValue::Number(2.0);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(b.compare(&a), Ordering::Greater);
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);

        let x = ColumnValue::Text("apple".into());
        let y = ColumnValue::Text("banana".into());
        assert_eq!(x.compare(&y), Ordering::Less);
    }

    #[test]
    fn test_column_value_hash_eq() {
        use std::collections::HashMap;
        let mut map: HashMap<Vec<ColumnValue>, usize> = HashMap::new();
        map.insert(vec![ColumnValue::Text("cpsc".into()), ColumnValue::Number(82.5)], 0);
        assert!(map
            .contains_key(&vec![ColumnValue::Text("cpsc".into()), ColumnValue::Number(82.5)]));
        assert!(!map
            .contains_key(&vec![ColumnValue::Text("cpsc".into()), ColumnValue::Number(82.6)]));
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = Entry::Section(sample_section());
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        match back {
            Entry::Section(s) => assert_eq!(s.dept, "cpsc"),
            Entry::Room(_) => panic!("deserialized as wrong variant"),
        }
    }
}
