//! Field Registry
//!
//! The fixed, per-dataset-kind set of valid field names, split into numeric
//! and textual fields. Field names coming off the wire are parsed into these
//! enums exactly once at the query boundary; everything downstream works with
//! the enums and never touches raw strings again.

use serde::{Deserialize, Serialize};

/// Kind tag of a dataset: course sections or campus rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Course section records
    Sections,
    /// Campus room records
    Rooms,
}

impl DatasetKind {
    /// Parse from a wire string ("sections" / "rooms", case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sections" => Some(Self::Sections),
            "rooms" => Some(Self::Rooms),
            _ => None,
        }
    }

    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::Rooms => "rooms",
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fields of a course section entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionField {
    Uuid,
    Id,
    Title,
    Instructor,
    Dept,
    Avg,
    Pass,
    Fail,
    Audit,
    Year,
}

impl SectionField {
    /// Parse from a wire field name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(Self::Uuid),
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "instructor" => Some(Self::Instructor),
            "dept" => Some(Self::Dept),
            "avg" => Some(Self::Avg),
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "audit" => Some(Self::Audit),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Id => "id",
            Self::Title => "title",
            Self::Instructor => "instructor",
            Self::Dept => "dept",
            Self::Avg => "avg",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Audit => "audit",
            Self::Year => "year",
        }
    }

    /// Whether this field carries a numeric value
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Avg | Self::Pass | Self::Fail | Self::Audit | Self::Year
        )
    }
}

/// Fields of a room entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomField {
    Fullname,
    Shortname,
    Number,
    Name,
    Address,
    Type,
    Furniture,
    Href,
    Lat,
    Lon,
    Seats,
}

impl RoomField {
    /// Parse from a wire field name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "fullname" => Some(Self::Fullname),
            "shortname" => Some(Self::Shortname),
            "number" => Some(Self::Number),
            "name" => Some(Self::Name),
            "address" => Some(Self::Address),
            "type" => Some(Self::Type),
            "furniture" => Some(Self::Furniture),
            "href" => Some(Self::Href),
            "lat" => Some(Self::Lat),
            "lon" => Some(Self::Lon),
            "seats" => Some(Self::Seats),
            _ => None,
        }
    }

    /// Wire name of the field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fullname => "fullname",
            Self::Shortname => "shortname",
            Self::Number => "number",
            Self::Name => "name",
            Self::Address => "address",
            Self::Type => "type",
            Self::Furniture => "furniture",
            Self::Href => "href",
            Self::Lat => "lat",
            Self::Lon => "lon",
            Self::Seats => "seats",
        }
    }

    /// Whether this field carries a numeric value
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Lat | Self::Lon | Self::Seats)
    }
}

/// A validated field reference, tagged with the dataset kind it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Section(SectionField),
    Room(RoomField),
}

impl Field {
    /// Parse a field name against the registry for the given kind.
    ///
    /// Returns `None` for an unregistered or wrong-kind field name; callers
    /// turn that into a validation error, never a silent miss.
    pub fn parse(kind: DatasetKind, name: &str) -> Option<Self> {
        match kind {
            DatasetKind::Sections => SectionField::parse(name).map(Self::Section),
            DatasetKind::Rooms => RoomField::parse(name).map(Self::Room),
        }
    }

    /// Wire name of the field (without the dataset id prefix)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Section(f) => f.name(),
            Self::Room(f) => f.name(),
        }
    }

    /// Whether this field carries a numeric value
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Section(f) => f.is_numeric(),
            Self::Room(f) => f.is_numeric(),
        }
    }

    /// The dataset kind this field belongs to
    pub fn kind(&self) -> DatasetKind {
        match self {
            Self::Section(_) => DatasetKind::Sections,
            Self::Room(_) => DatasetKind::Rooms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_section_fields() {
        for name in ["uuid", "id", "title", "instructor", "dept"] {
            let field = Field::parse(DatasetKind::Sections, name).unwrap();
            assert!(!field.is_numeric(), "{} should be textual", name);
            assert_eq!(field.name(), name);
        }
        for name in ["avg", "pass", "fail", "audit", "year"] {
            let field = Field::parse(DatasetKind::Sections, name).unwrap();
            assert!(field.is_numeric(), "{} should be numeric", name);
            assert_eq!(field.name(), name);
        }
    }

    #[test]
    fn test_parse_room_fields() {
        for name in [
            "fullname",
            "shortname",
            "number",
            "name",
            "address",
            "type",
            "furniture",
            "href",
        ] {
            let field = Field::parse(DatasetKind::Rooms, name).unwrap();
            assert!(!field.is_numeric(), "{} should be textual", name);
        }
        for name in ["lat", "lon", "seats"] {
            let field = Field::parse(DatasetKind::Rooms, name).unwrap();
            assert!(field.is_numeric(), "{} should be numeric", name);
        }
    }

    #[test]
    fn test_wrong_kind_field_is_rejected() {
        assert!(Field::parse(DatasetKind::Sections, "seats").is_none());
        assert!(Field::parse(DatasetKind::Rooms, "avg").is_none());
        assert!(Field::parse(DatasetKind::Sections, "bogus").is_none());
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(DatasetKind::parse("sections"), Some(DatasetKind::Sections));
        assert_eq!(DatasetKind::parse("ROOMS"), Some(DatasetKind::Rooms));
        assert_eq!(DatasetKind::parse("tables"), None);
    }
}
