//! In-process backend that answers bridge calls from memory.

use super::Bridge;
use crate::error::Result;
use crate::types::Verb;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::trace;

/// Internal backend state.
#[derive(Default)]
struct Tables {
    tables: BTreeMap<String, Vec<Map<String, Value>>>,
    /// Next id handed out on insert.
    next_id: u64,
    /// Code returned for every fetch-all while set.
    fault: Option<i64>,
}

/// A backend store held in memory.
///
/// Ids are assigned in ascending order across all tables. A fetch-all against
/// a missing table answers code `1`. Writes never answer a bare number, since
/// a numeric remove reply is read as the removed id; writes that match
/// nothing or hit a missing table answer `[]`.
pub struct MemoryBackend {
    inner: Mutex<Tables>,
}

impl MemoryBackend {
    /// Create a backend with no tables.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Create a backend with the given empty tables.
    pub fn with_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        for table in tables {
            backend.create_table(table);
        }
        backend
    }

    /// Create an empty table. Existing tables are left alone.
    pub fn create_table(&self, table: impl Into<String>) {
        self.inner.lock().tables.entry(table.into()).or_default();
    }

    /// Insert rows as-is, keeping their ids. Non-object values are skipped.
    pub fn seed(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        let mut inner = self.inner.lock();
        let mut max_id = 0;
        let target = inner.tables.entry(table.to_string()).or_default();
        for row in rows {
            if let Value::Object(row) = row {
                if let Some(id) = row.get("id").and_then(Value::as_u64) {
                    max_id = max_id.max(id);
                }
                target.push(row);
            }
        }
        inner.next_id = inner.next_id.max(max_id + 1);
    }

    /// Current rows of a table.
    pub fn rows(&self, table: &str) -> Option<Vec<Value>> {
        self.inner
            .lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
    }

    /// Make every following fetch-all answer `code`, or clear the fault with
    /// `None`. Writes answer `[]` while the fault is set.
    pub fn set_fault(&self, code: Option<i64>) {
        self.inner.lock().fault = code;
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn row_id(row: &Map<String, Value>) -> Option<u64> {
    row.get("id").and_then(Value::as_u64)
}

impl Bridge for MemoryBackend {
    fn send_sync(&self, verb: Verb, table: &str, payload: Option<&Value>) -> Result<Value> {
        let mut inner = self.inner.lock();
        trace!(%verb, table, "memory backend call");

        if let Some(code) = inner.fault {
            if verb == Verb::QueryAll {
                return Ok(Value::from(code));
            }
            return Ok(Value::Array(Vec::new()));
        }

        let Tables {
            tables, next_id, ..
        } = &mut *inner;

        let Some(rows) = tables.get_mut(table) else {
            if verb == Verb::QueryAll {
                return Ok(Value::from(1));
            }
            return Ok(Value::Array(Vec::new()));
        };

        if verb == Verb::QueryAll {
            return Ok(Value::Array(
                rows.iter().cloned().map(Value::Object).collect(),
            ));
        }

        let Some(Value::Object(payload)) = payload else {
            return Ok(Value::Array(Vec::new()));
        };

        let reply = match verb {
            Verb::Insert => {
                let mut row = payload.clone();
                row.insert("id".to_string(), Value::from(*next_id));
                *next_id += 1;
                rows.push(row.clone());
                Value::Object(row)
            }
            Verb::Remove => {
                let position = row_id(payload)
                    .and_then(|id| rows.iter().position(|row| row_id(row) == Some(id)));
                match position {
                    Some(index) => Value::Object(rows.remove(index)),
                    None => Value::Array(Vec::new()),
                }
            }
            Verb::Update => {
                let position = row_id(payload)
                    .and_then(|id| rows.iter().position(|row| row_id(row) == Some(id)));
                match position {
                    Some(index) => {
                        for (key, value) in payload {
                            rows[index].insert(key.clone(), value.clone());
                        }
                        Value::Object(rows[index].clone())
                    }
                    None => Value::Array(Vec::new()),
                }
            }
            Verb::QueryAll => Value::Array(rows.iter().cloned().map(Value::Object).collect()),
        };

        Ok(reply)
    }
}
