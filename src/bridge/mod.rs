//! The blocking request/response seam to the backend store.
//!
//! The backend is reached through [`Bridge::send_sync`], which takes a verb,
//! a table name and an optional payload and returns the backend's raw JSON
//! reply. Raw replies are classified exactly once by [`BackendReply::decode`].

mod memory;
mod reply;

pub use memory::MemoryBackend;
pub use reply::{BackendReply, StoreCode};

use crate::error::Result;
use crate::types::Verb;
use serde_json::Value;
use std::sync::Arc;

/// A synchronous bridge to the backend store.
///
/// A call blocks until the backend answers; there is no timeout and no
/// cancellation. `Err` is reserved for failures of the bridge itself, never
/// for backend error codes, which arrive as a bare number in the `Ok` value.
pub trait Bridge {
    fn send_sync(&self, verb: Verb, table: &str, payload: Option<&Value>) -> Result<Value>;
}

impl<B: Bridge + ?Sized> Bridge for &B {
    fn send_sync(&self, verb: Verb, table: &str, payload: Option<&Value>) -> Result<Value> {
        (**self).send_sync(verb, table, payload)
    }
}

impl<B: Bridge + ?Sized> Bridge for Box<B> {
    fn send_sync(&self, verb: Verb, table: &str, payload: Option<&Value>) -> Result<Value> {
        (**self).send_sync(verb, table, payload)
    }
}

impl<B: Bridge + ?Sized> Bridge for Arc<B> {
    fn send_sync(&self, verb: Verb, table: &str, payload: Option<&Value>) -> Result<Value> {
        (**self).send_sync(verb, table, payload)
    }
}
