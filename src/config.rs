//! Store configuration.

use crate::bridge::StoreCode;
use crate::error::{Result, StoreError};
use crate::notify::Notice;
use crate::store::CommandOutcome;
use crate::types::{Collection, Locale, Verb};
use serde::{Deserialize, Serialize};

/// Store configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Locales usable for threat type names.
    pub locales: LocaleConfig,

    /// Backend table names.
    pub tables: TableNames,

    /// Message keys used for notices.
    pub messages: MessageKeys,
}

impl StoreConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StoreConfig =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.locales.supported.contains(&self.locales.base) {
            return Err(StoreError::InvalidConfig(format!(
                "base locale {} is not in the supported locales",
                self.locales.base
            )));
        }
        if self.tables.threat_types.is_empty() || self.tables.threats.is_empty() {
            return Err(StoreError::InvalidConfig("empty table name".to_string()));
        }
        if self.tables.threat_types == self.tables.threats {
            return Err(StoreError::InvalidConfig(format!(
                "both collections map to table {}",
                self.tables.threats
            )));
        }
        Ok(())
    }
}

/// Locales usable for decoding threat type names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Used when the active locale is not supported.
    /// Default: `en`
    pub base: Locale,

    /// Default: `en`, `es`
    pub supported: Vec<Locale>,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            base: Locale::from("en"),
            supported: vec![Locale::from("en"), Locale::from("es")],
        }
    }
}

impl LocaleConfig {
    /// The locale whose entry is read for `active`.
    pub fn resolve<'a>(&'a self, active: &'a Locale) -> &'a Locale {
        if self.supported.contains(active) {
            active
        } else {
            &self.base
        }
    }
}

/// Backend table names for each collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub threat_types: String,
    pub threats: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            threat_types: "threat_types".to_string(),
            threats: "threats".to_string(),
        }
    }
}

impl TableNames {
    pub fn table(&self, collection: Collection) -> &str {
        match collection {
            Collection::ThreatTypes => &self.threat_types,
            Collection::Threats => &self.threats,
        }
    }
}

/// Message keys for the notices each outcome produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageKeys {
    /// Store code 1.
    pub missing_table: String,
    /// Store code 26.
    pub not_a_database: String,
    /// Any other store code. The default keeps the deployed catalogs'
    /// spelling, `import_error_unkown`.
    pub unknown_store_error: String,

    pub threat_types: WriteMessages,
    pub threats: WriteMessages,
}

impl Default for MessageKeys {
    fn default() -> Self {
        Self {
            missing_table: "home.import_error_1".to_string(),
            not_a_database: "home.import_error_26".to_string(),
            unknown_store_error: "home.import_error_unkown".to_string(),
            threat_types: WriteMessages::for_prefix("threat_types"),
            threats: WriteMessages::for_prefix("threats"),
        }
    }
}

impl MessageKeys {
    pub fn writes(&self, collection: Collection) -> &WriteMessages {
        match collection {
            Collection::ThreatTypes => &self.threat_types,
            Collection::Threats => &self.threats,
        }
    }

    /// The notice to show for an outcome, if any.
    ///
    /// A successful fetch has no notice.
    pub fn notice_for(&self, outcome: &CommandOutcome) -> Option<Notice> {
        match outcome {
            CommandOutcome::Fetched { .. } => None,
            CommandOutcome::Written {
                collection, verb, ..
            } => self.writes(*collection).success(*verb).map(Notice::info),
            CommandOutcome::SoftFailure { collection, verb } => {
                self.writes(*collection).failure(*verb).map(Notice::error)
            }
            CommandOutcome::IntegrityFailure { code, .. } => {
                let key = match code {
                    StoreCode::MissingTable => &self.missing_table,
                    StoreCode::NotADatabase => &self.not_a_database,
                    StoreCode::Unknown(_) => &self.unknown_store_error,
                };
                Some(Notice::error(key))
            }
        }
    }
}

/// Success and failure message keys for the three write verbs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WriteMessages {
    pub insert_success: String,
    pub insert_error: String,
    pub delete_success: String,
    pub delete_error: String,
    pub update_success: String,
    pub update_error: String,
}

impl WriteMessages {
    /// Keys under `prefix`, with deletes sharing the `global` keys.
    pub fn for_prefix(prefix: &str) -> Self {
        Self {
            insert_success: format!("{}.insert_success", prefix),
            insert_error: format!("{}.insert_error", prefix),
            delete_success: "global.delete_success".to_string(),
            delete_error: "global.delete_error".to_string(),
            update_success: format!("{}.edit_success", prefix),
            update_error: format!("{}.edit_error", prefix),
        }
    }

    pub fn success(&self, verb: Verb) -> Option<&str> {
        match verb {
            Verb::Insert => Some(&self.insert_success),
            Verb::Remove => Some(&self.delete_success),
            Verb::Update => Some(&self.update_success),
            Verb::QueryAll => None,
        }
    }

    pub fn failure(&self, verb: Verb) -> Option<&str> {
        match verb {
            Verb::Insert => Some(&self.insert_error),
            Verb::Remove => Some(&self.delete_error),
            Verb::Update => Some(&self.update_error),
            Verb::QueryAll => None,
        }
    }
}
