//! Mirror operation application.

use super::Keyed;
use crate::types::RecordId;

/// A primitive mutation of one mirrored collection.
#[derive(Clone, Debug, PartialEq)]
pub enum MirrorOperation<T> {
    /// Replace the whole collection.
    Set(Vec<T>),
    /// Append one record at the end.
    Append(T),
    /// Drop every record with this id.
    Remove(RecordId),
    /// Replace the first record with the same id, keeping its position.
    Update(T),
}

/// What an operation did to the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Replaced { count: usize },
    Appended { index: usize },
    Removed { count: usize },
    Updated { index: usize },
    /// The target id was not present; nothing changed.
    Missing,
}

impl Applied {
    /// Whether the collection changed.
    pub fn changed(&self) -> bool {
        match self {
            Applied::Replaced { .. } | Applied::Appended { .. } | Applied::Updated { .. } => true,
            Applied::Removed { count } => *count > 0,
            Applied::Missing => false,
        }
    }
}

/// Apply a mirror operation to a collection.
pub fn apply_operation<T: Keyed>(records: &mut Vec<T>, operation: MirrorOperation<T>) -> Applied {
    match operation {
        MirrorOperation::Set(new_records) => {
            *records = new_records;
            Applied::Replaced {
                count: records.len(),
            }
        }

        MirrorOperation::Append(record) => {
            records.push(record);
            Applied::Appended {
                index: records.len() - 1,
            }
        }

        MirrorOperation::Remove(id) => {
            let before = records.len();
            records.retain(|record| record.id() != id);
            match before - records.len() {
                0 => Applied::Missing,
                count => Applied::Removed { count },
            }
        }

        MirrorOperation::Update(record) => {
            match records.iter().position(|existing| existing.id() == record.id()) {
                Some(index) => {
                    records[index] = record;
                    Applied::Updated { index }
                }
                None => Applied::Missing,
            }
        }
    }
}
