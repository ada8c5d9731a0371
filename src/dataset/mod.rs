//! Dataset model and registry
//!
//! - **Fields**: the per-kind registry of valid field names
//! - **Entries**: course section and room records
//! - **Dataset**: an immutable, ordered collection of entries of one kind
//! - **Store**: the owning registry with snapshot semantics and
//!   flush-on-write persistence

mod dataset;
mod entry;
mod fields;
mod store;

pub use dataset::{is_valid_dataset_id, Dataset, ID_SEPARATOR};
pub use entry::{ColumnValue, Entry, Room, Section};
pub use fields::{DatasetKind, Field, RoomField, SectionField};
pub use store::{DatasetStore, DatasetSummary, Snapshot, StoreError, StoreResult};
