//! Dataset container
//!
//! An immutable, fully-constructed dataset: an identifier, a kind tag, and
//! an ordered collection of entries. Datasets are replaced wholesale on
//! re-ingestion, never patched in place.

use crate::dataset::entry::Entry;
use crate::dataset::fields::DatasetKind;
use serde::{Deserialize, Serialize};

/// Reserved separator between dataset id and field name in query keys
pub const ID_SEPARATOR: char = '_';

/// Check a dataset identifier: non-empty, not whitespace-only, and free of
/// the reserved separator character.
pub fn is_valid_dataset_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.contains(ID_SEPARATOR)
}

/// An immutable collection of entries of one kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    id: String,
    kind: DatasetKind,
    entries: Vec<Entry>,
}

impl Dataset {
    /// Create a dataset from already-validated parts
    pub fn new(id: impl Into<String>, kind: DatasetKind, entries: Vec<Entry>) -> Self {
        Self {
            id: id.into(),
            kind,
            entries,
        }
    }

    /// Dataset identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dataset kind tag
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// The ordered entries, borrowed read-only
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the dataset has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_dataset_ids() {
        assert!(is_valid_dataset_id("courses"));
        assert!(is_valid_dataset_id("rooms2024"));
        assert!(!is_valid_dataset_id(""));
        assert!(!is_valid_dataset_id("   "));
        assert!(!is_valid_dataset_id("my_courses"));
    }
}
