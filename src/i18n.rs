//! Localization: the active locale, message lookup and locale-map names.

use crate::config::LocaleConfig;
use crate::error::{Result, StoreError};
use crate::types::Locale;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Source of the active locale and of translated message text.
pub trait Localizer {
    /// The locale currently selected by the user.
    fn locale(&self) -> Locale;

    /// Look up the message for `key` in the active locale.
    fn translate(&self, key: &str) -> String;
}

impl<L: Localizer + ?Sized> Localizer for &L {
    fn locale(&self) -> Locale {
        (**self).locale()
    }

    fn translate(&self, key: &str) -> String {
        (**self).translate(key)
    }
}

impl<L: Localizer + ?Sized> Localizer for Arc<L> {
    fn locale(&self) -> Locale {
        (**self).locale()
    }

    fn translate(&self, key: &str) -> String {
        (**self).translate(key)
    }
}

/// Resolve a serialized `locale -> string` map for `active`.
///
/// `active` is used if it is a supported locale, the base locale otherwise.
/// Returns `None` when the map has no string for that locale. Malformed
/// text is an error.
pub fn resolve_name(
    text: &str,
    active: &Locale,
    locales: &LocaleConfig,
) -> std::result::Result<Option<String>, serde_json::Error> {
    let map: Value = serde_json::from_str(text)?;
    let locale = locales.resolve(active);
    Ok(map
        .get(locale.as_str())
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// An in-memory message catalog.
///
/// Lookups fall back from the active locale to the base locale, and then to
/// the key itself.
pub struct Catalog {
    base: Locale,
    active: RwLock<Locale>,
    messages: RwLock<HashMap<Locale, HashMap<String, String>>>,
}

impl Catalog {
    /// Create an empty catalog with `base` as both base and active locale.
    pub fn new(base: impl Into<Locale>) -> Self {
        let base = base.into();
        Self {
            active: RwLock::new(base.clone()),
            base,
            messages: RwLock::new(HashMap::new()),
        }
    }

    pub fn base(&self) -> &Locale {
        &self.base
    }

    /// Switch the active locale.
    pub fn set_locale(&self, locale: impl Into<Locale>) {
        *self.active.write() = locale.into();
    }

    /// Add or replace one message.
    pub fn insert(&self, locale: impl Into<Locale>, key: impl Into<String>, text: impl Into<String>) {
        self.messages
            .write()
            .entry(locale.into())
            .or_default()
            .insert(key.into(), text.into());
    }

    /// Load a nested JSON message file for `locale`.
    ///
    /// `{"home": {"import_error_1": "..."}}` becomes the key
    /// `home.import_error_1`. Returns the number of messages loaded.
    pub fn load_json(&self, locale: impl Into<Locale>, json: &str) -> Result<usize> {
        let root: Value = serde_json::from_str(json)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        if !root.is_object() {
            return Err(StoreError::Deserialization(
                "message file must be a JSON object".to_string(),
            ));
        }

        let mut flat = Vec::new();
        flatten_messages("", &root, &mut flat);
        let count = flat.len();

        let mut messages = self.messages.write();
        let table = messages.entry(locale.into()).or_default();
        table.extend(flat);
        Ok(count)
    }

    fn lookup(&self, locale: &Locale, key: &str) -> Option<String> {
        self.messages
            .read()
            .get(locale)
            .and_then(|table| table.get(key))
            .cloned()
    }
}

fn flatten_messages(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_messages(&path, child, out);
            }
        }
        Value::String(text) => out.push((prefix.to_string(), text.clone())),
        // Numbers, arrays and the like are not messages.
        _ => {}
    }
}

impl Localizer for Catalog {
    fn locale(&self) -> Locale {
        self.active.read().clone()
    }

    fn translate(&self, key: &str) -> String {
        let active = self.locale();
        self.lookup(&active, key)
            .or_else(|| self.lookup(&self.base, key))
            .unwrap_or_else(|| key.to_string())
    }
}
