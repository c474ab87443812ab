//! The command layer: `ThreatStore` owns the mirror and talks to the backend.

use crate::bridge::{BackendReply, Bridge, StoreCode};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::mirror::{Keyed, Mirror};
use crate::types::{
    Collection, Locale, MergedThreat, MirrorStats, NewThreat, NewThreatType, RecordId, Threat,
    ThreatType, ThreatTypeView, Verb,
};
use crate::views::{self, AssetSource};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// What a command did.
///
/// Store-integrity codes from fetch-all and empty write replies are outcomes,
/// not errors.
/// `Err` from a command means the bridge failed or a reply could not be read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The collection was replaced with `count` records.
    Fetched { collection: Collection, count: usize },

    /// The backend confirmed a write and the mirror was updated.
    Written {
        collection: Collection,
        verb: Verb,
        id: RecordId,
    },

    /// The backend answered a write with an empty or unreadable result. The
    /// mirror is unchanged.
    SoftFailure { collection: Collection, verb: Verb },

    /// The backend answered with a store-integrity code.
    IntegrityFailure {
        collection: Collection,
        verb: Verb,
        code: StoreCode,
    },
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommandOutcome::Fetched { .. } | CommandOutcome::Written { .. }
        )
    }

    /// Whether the session must back up and recreate the store file.
    pub fn requires_backup(&self) -> bool {
        matches!(self, CommandOutcome::IntegrityFailure { .. })
    }

    pub fn collection(&self) -> Collection {
        match self {
            CommandOutcome::Fetched { collection, .. }
            | CommandOutcome::Written { collection, .. }
            | CommandOutcome::SoftFailure { collection, .. }
            | CommandOutcome::IntegrityFailure { collection, .. } => *collection,
        }
    }
}

/// Both mirrored collections.
#[derive(Default)]
struct Mirrors {
    threat_types: Mirror<ThreatType>,
    threats: Mirror<Threat>,
}

/// A record type with a collection of its own in the mirror.
trait Mirrored: Keyed + DeserializeOwned + Sized {
    const COLLECTION: Collection;

    fn mirror(mirrors: &mut Mirrors) -> &mut Mirror<Self>;
}

impl Mirrored for ThreatType {
    const COLLECTION: Collection = Collection::ThreatTypes;

    fn mirror(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.threat_types
    }
}

impl Mirrored for Threat {
    const COLLECTION: Collection = Collection::Threats;

    fn mirror(mirrors: &mut Mirrors) -> &mut Mirror<Self> {
        &mut mirrors.threats
    }
}

/// Client-side mirror of the threat type and threat collections.
///
/// Every command issues exactly one blocking bridge call and only touches the
/// mirror after the backend has answered. Commands take `&mut self`, so a
/// second command cannot start while one is outstanding.
pub struct ThreatStore<B> {
    bridge: B,
    config: StoreConfig,
    mirrors: Mirrors,
}

impl<B: Bridge> ThreatStore<B> {
    /// Create an empty store with the default configuration.
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            config: StoreConfig::default(),
            mirrors: Mirrors::default(),
        }
    }

    /// Create an empty store with a validated configuration.
    pub fn with_config(bridge: B, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            bridge,
            config,
            mirrors: Mirrors::default(),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    // --- Threat Type Commands ---

    /// Replace the threat type mirror with the backend's collection.
    pub fn fetch_all_threat_types(&mut self) -> Result<CommandOutcome> {
        self.fetch_all::<ThreatType>()
    }

    pub fn add_threat_type(&mut self, threat_type: &NewThreatType) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat_type)?;
        self.write::<ThreatType>(Verb::Insert, payload)
    }

    pub fn delete_threat_type(&mut self, threat_type: &ThreatType) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat_type)?;
        self.remove::<ThreatType>(threat_type.id, payload)
    }

    pub fn update_threat_type(&mut self, threat_type: &ThreatType) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat_type)?;
        self.write::<ThreatType>(Verb::Update, payload)
    }

    // --- Threat Commands ---

    /// Replace the threat mirror with the backend's collection.
    pub fn fetch_all_threats(&mut self) -> Result<CommandOutcome> {
        self.fetch_all::<Threat>()
    }

    pub fn add_threat(&mut self, threat: &NewThreat) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat)?;
        self.write::<Threat>(Verb::Insert, payload)
    }

    pub fn delete_threat(&mut self, threat: &Threat) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat)?;
        self.remove::<Threat>(threat.id, payload)
    }

    pub fn update_threat(&mut self, threat: &Threat) -> Result<CommandOutcome> {
        let payload = serde_json::to_value(threat)?;
        self.write::<Threat>(Verb::Update, payload)
    }

    // --- Views ---

    /// Mirrored threat types, as returned by the backend.
    pub fn threat_types(&self) -> &[ThreatType] {
        self.mirrors.threat_types.records()
    }

    /// Mirrored threats, as returned by the backend.
    pub fn threats(&self) -> &[Threat] {
        self.mirrors.threats.records()
    }

    /// Threat types with names resolved for `active`.
    pub fn threat_type_views(&self, active: &Locale) -> Result<Vec<ThreatTypeView>> {
        views::translate_threat_types(self.threat_types(), active, &self.config.locales)
    }

    /// Threats joined with type names (for `active`) and asset names.
    ///
    /// Only meaningful once threats, threat types and assets have each been
    /// fetched at least once.
    pub fn merged_threats<A>(&self, active: &Locale, assets: &A) -> Result<Vec<MergedThreat>>
    where
        A: AssetSource + ?Sized,
    {
        let type_views = self.threat_type_views(active)?;
        Ok(views::merge_threats(
            self.threats(),
            &type_views,
            assets.assets(),
        ))
    }

    pub fn stats(&self) -> MirrorStats {
        MirrorStats {
            threat_types: self.mirrors.threat_types.len(),
            threats: self.mirrors.threats.len(),
        }
    }

    // --- Internals ---

    fn call(
        &self,
        verb: Verb,
        collection: Collection,
        payload: Option<&Value>,
    ) -> Result<BackendReply> {
        let table = self.config.tables.table(collection);
        debug!(%verb, table, "bridge call");
        let reply = BackendReply::decode(self.bridge.send_sync(verb, table, payload)?);
        debug!(%verb, table, reply = reply.kind(), "bridge reply");
        Ok(reply)
    }

    fn fetch_all<T: Mirrored>(&mut self) -> Result<CommandOutcome> {
        let collection = T::COLLECTION;
        let rows = match self.call(Verb::QueryAll, collection, None)? {
            BackendReply::Code(code) => {
                return Ok(integrity_failure(collection, Verb::QueryAll, code))
            }
            BackendReply::Rows(rows) => rows,
            BackendReply::Empty => Vec::new(),
            other => return Err(unexpected(Verb::QueryAll, "a list of rows", &other)),
        };

        let records = rows
            .into_iter()
            .map(decode_record::<T>)
            .collect::<Result<Vec<T>>>()?;

        let count = records.len();
        T::mirror(&mut self.mirrors).replace_all(records);
        info!(%collection, count, "collection replaced");

        Ok(CommandOutcome::Fetched { collection, count })
    }

    /// Insert or update one record.
    fn write<T: Mirrored>(&mut self, verb: Verb, payload: Value) -> Result<CommandOutcome> {
        let collection = T::COLLECTION;
        let reply = self.call(verb, collection, Some(&payload))?;
        let row = match affected_row(verb, collection, reply)? {
            Ok(row) => row,
            Err(outcome) => return Ok(outcome),
        };

        // The backend has committed by now; an unreadable row leaves the
        // mirror as it was and is reported like any other failed write.
        let record = match decode_record::<T>(row) {
            Ok(record) => record,
            Err(error) => {
                warn!(%collection, %verb, %error, "affected row is unreadable; mirror unchanged");
                return Ok(CommandOutcome::SoftFailure { collection, verb });
            }
        };
        let id = record.id();
        let mirror = T::mirror(&mut self.mirrors);

        if verb == Verb::Update {
            if !mirror.update_by_id(record).changed() {
                debug!(%collection, %id, "updated record is not mirrored; dropped");
            }
        } else {
            mirror.append(record);
        }

        Ok(CommandOutcome::Written {
            collection,
            verb,
            id,
        })
    }

    fn remove<T: Mirrored>(&mut self, requested: RecordId, payload: Value) -> Result<CommandOutcome> {
        let collection = T::COLLECTION;
        let id = match self.call(Verb::Remove, collection, Some(&payload))? {
            // A bare number answering a delete is the removed id.
            BackendReply::Code(code) => {
                match code.code().and_then(|id| u64::try_from(id).ok()) {
                    Some(id) => RecordId(id),
                    None => {
                        let reply = BackendReply::Code(code);
                        return Err(unexpected(Verb::Remove, "the removed id", &reply));
                    }
                }
            }
            reply => {
                let row = match affected_row(Verb::Remove, collection, reply)? {
                    Ok(row) => row,
                    Err(outcome) => return Ok(outcome),
                };
                // Prefer the id the backend reports; some backends answer
                // with a change summary instead of the removed row.
                row.get("id")
                    .and_then(|id| RecordId::deserialize(id).ok())
                    .unwrap_or(requested)
            }
        };

        if !T::mirror(&mut self.mirrors).remove_by_id(id).changed() {
            debug!(%collection, %id, "removed record was not mirrored");
        }

        Ok(CommandOutcome::Written {
            collection,
            verb: Verb::Remove,
            id,
        })
    }
}

/// Extract the affected row from a write reply.
///
/// The inner `Err` carries the outcome for empty replies. Store-integrity
/// codes only answer fetch-all, so a bare number here is unexpected.
fn affected_row(
    verb: Verb,
    collection: Collection,
    reply: BackendReply,
) -> Result<std::result::Result<Value, CommandOutcome>> {
    let row = match reply {
        BackendReply::Empty => return Ok(Err(soft_failure(collection, verb))),
        BackendReply::Row(row) => return Ok(Ok(Value::Object(row))),
        BackendReply::Rows(rows) => rows.into_iter().next().unwrap_or(Value::Null),
        other => return Err(unexpected(verb, "the affected row", &other)),
    };

    // A list reply carries the affected row first.
    match BackendReply::decode(row) {
        BackendReply::Row(row) => Ok(Ok(Value::Object(row))),
        BackendReply::Empty => Ok(Err(soft_failure(collection, verb))),
        other => Err(unexpected(verb, "the affected row", &other)),
    }
}

fn integrity_failure(collection: Collection, verb: Verb, code: StoreCode) -> CommandOutcome {
    warn!(%collection, %verb, %code, "store integrity failure; backup required");
    CommandOutcome::IntegrityFailure {
        collection,
        verb,
        code,
    }
}

fn soft_failure(collection: Collection, verb: Verb) -> CommandOutcome {
    warn!(%collection, %verb, "backend returned an empty result");
    CommandOutcome::SoftFailure { collection, verb }
}

fn unexpected(verb: Verb, expected: &str, reply: &BackendReply) -> StoreError {
    StoreError::UnexpectedReply {
        verb,
        detail: format!("expected {}, got {}", expected, reply.kind()),
    }
}

fn decode_record<T: Mirrored>(row: Value) -> Result<T> {
    serde_json::from_value(row)
        .map_err(|e| StoreError::Deserialization(format!("{} row: {}", T::COLLECTION, e)))
}
