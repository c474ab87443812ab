//! In-memory mirror of backend-held collections.
//!
//! The mirror never assigns ids and never predicts backend results; every
//! mutation is driven by a reply the backend has already returned.

mod operations;

pub use operations::{apply_operation, Applied, MirrorOperation};

use crate::types::{RecordId, Threat, ThreatType};

/// A record with a backend-assigned id.
pub trait Keyed {
    fn id(&self) -> RecordId;
}

impl Keyed for ThreatType {
    fn id(&self) -> RecordId {
        self.id
    }
}

impl Keyed for Threat {
    fn id(&self) -> RecordId {
        self.id
    }
}

/// One ordered collection of mirrored records.
#[derive(Clone, Debug, PartialEq)]
pub struct Mirror<T> {
    records: Vec<T>,
}

impl<T> Default for Mirror<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Keyed> Mirror<T> {
    /// Create an empty mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records in backend order.
    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Apply a single mutation.
    pub fn apply(&mut self, operation: MirrorOperation<T>) -> Applied {
        apply_operation(&mut self.records, operation)
    }

    /// Replace the whole collection.
    pub fn replace_all(&mut self, records: Vec<T>) -> Applied {
        self.apply(MirrorOperation::Set(records))
    }

    pub fn append(&mut self, record: T) -> Applied {
        self.apply(MirrorOperation::Append(record))
    }

    pub fn update_by_id(&mut self, record: T) -> Applied {
        self.apply(MirrorOperation::Update(record))
    }

    pub fn remove_by_id(&mut self, id: RecordId) -> Applied {
        self.apply(MirrorOperation::Remove(id))
    }
}
