//! Core types for the threat cache.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a record (assigned by the backend store).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A locale code such as `en` or `es`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(code: impl Into<String>) -> Self {
        Locale(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locale({})", self.0)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Locale(code.to_string())
    }
}

/// The collections mirrored by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    ThreatTypes,
    Threats,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::ThreatTypes => f.write_str("threat_types"),
            Collection::Threats => f.write_str("threats"),
        }
    }
}

/// Request verb understood by the backend bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    #[serde(rename = "queryAll")]
    QueryAll,
    #[serde(rename = "insert")]
    Insert,
    #[serde(rename = "remove")]
    Remove,
    #[serde(rename = "update")]
    Update,
}

impl Verb {
    /// Wire name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::QueryAll => "queryAll",
            Verb::Insert => "insert",
            Verb::Remove => "remove",
            Verb::Update => "update",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A threat category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatType {
    pub id: RecordId,

    /// Serialized `locale -> display string` map, e.g.
    /// `{"en":"Spoofing","es":"Suplantación"}`.
    pub name: String,

    /// Columns this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A threat bound to an asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: RecordId,
    pub threat_type_id: RecordId,
    pub asset_id: RecordId,

    /// Description, mitigation and the other domain columns, passed through as-is.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// An asset, owned by a sibling module and only read here for joins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: RecordId,
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Input for creating a threat type (before the backend assigns an id).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewThreatType {
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewThreatType {
    /// Build the serialized name map from `(locale, display string)` pairs.
    pub fn from_names<I, L, S>(names: I) -> Result<Self, serde_json::Error>
    where
        I: IntoIterator<Item = (L, S)>,
        L: Into<String>,
        S: Into<String>,
    {
        let map: BTreeMap<String, String> = names
            .into_iter()
            .map(|(locale, text)| (locale.into(), text.into()))
            .collect();
        Ok(Self {
            name: serde_json::to_string(&map)?,
            extra: Map::new(),
        })
    }
}

/// Input for creating a threat (before the backend assigns an id).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewThreat {
    pub threat_type_id: RecordId,
    pub asset_id: RecordId,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl NewThreat {
    pub fn new(threat_type_id: RecordId, asset_id: RecordId) -> Self {
        Self {
            threat_type_id,
            asset_id,
            attributes: Map::new(),
        }
    }

    /// Attach a pass-through attribute such as `description`.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A threat type with its name resolved for one locale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThreatTypeView {
    pub id: RecordId,
    pub name: String,
    /// `None` when the name map has no entry for the resolved locale.
    pub name_translation: Option<String>,
}

/// A threat joined with the names of its type and asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedThreat {
    #[serde(flatten)]
    pub threat: Threat,
    pub threat_type_name: Option<String>,
    pub asset_name: Option<String>,
}

/// Record counts currently held in the mirror.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorStats {
    pub threat_types: usize,
    pub threats: usize,
}
