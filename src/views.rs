//! Read views derived from the mirror.
//!
//! Views are recomputed from scratch on every call and returned as new
//! values; nothing here writes to the mirror or to sibling collections.

use crate::config::LocaleConfig;
use crate::error::{Result, StoreError};
use crate::i18n::resolve_name;
use crate::types::{Asset, Locale, MergedThreat, RecordId, Threat, ThreatType, ThreatTypeView};
use std::collections::HashMap;

/// Read-only access to the asset collection owned by a sibling module.
pub trait AssetSource {
    fn assets(&self) -> &[Asset];
}

impl AssetSource for [Asset] {
    fn assets(&self) -> &[Asset] {
        self
    }
}

impl AssetSource for Vec<Asset> {
    fn assets(&self) -> &[Asset] {
        self
    }
}

impl<A: AssetSource + ?Sized> AssetSource for &A {
    fn assets(&self) -> &[Asset] {
        (**self).assets()
    }
}

/// Resolve every threat type name for `active`.
///
/// Each name map is decoded on every call. A malformed map fails the whole
/// view with [`StoreError::NameDecode`].
pub fn translate_threat_types(
    threat_types: &[ThreatType],
    active: &Locale,
    locales: &LocaleConfig,
) -> Result<Vec<ThreatTypeView>> {
    threat_types
        .iter()
        .map(|threat_type| {
            let name_translation = resolve_name(&threat_type.name, active, locales).map_err(
                |source| StoreError::NameDecode {
                    id: threat_type.id,
                    source,
                },
            )?;
            Ok(ThreatTypeView {
                id: threat_type.id,
                name: threat_type.name.clone(),
                name_translation,
            })
        })
        .collect()
}

/// Join threats with their type and asset names.
///
/// Emits exactly one record per threat, in mirror order. Ids that do not
/// resolve leave the derived name as `None`.
pub fn merge_threats(
    threats: &[Threat],
    threat_types: &[ThreatTypeView],
    assets: &[Asset],
) -> Vec<MergedThreat> {
    let type_names: HashMap<RecordId, Option<&str>> = threat_types
        .iter()
        .map(|view| (view.id, view.name_translation.as_deref()))
        .collect();
    let asset_names: HashMap<RecordId, &str> = assets
        .iter()
        .map(|asset| (asset.id, asset.name.as_str()))
        .collect();

    threats
        .iter()
        .map(|threat| MergedThreat {
            threat: threat.clone(),
            threat_type_name: type_names
                .get(&threat.threat_type_id)
                .copied()
                .flatten()
                .map(str::to_string),
            asset_name: asset_names
                .get(&threat.asset_id)
                .map(|name| name.to_string()),
        })
        .collect()
}
