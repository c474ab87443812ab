//! Per-session wiring of the store to localization, notifications and the
//! backup flag.

use crate::bridge::Bridge;
use crate::error::Result;
use crate::i18n::Localizer;
use crate::notify::{Notification, Notifier};
use crate::store::{CommandOutcome, ThreatStore};
use crate::types::{MergedThreat, NewThreat, NewThreatType, Threat, ThreatType, ThreatTypeView};
use crate::views::AssetSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Session-level flags shared with the recovery workflow.
#[derive(Debug, Default)]
pub struct SessionFlags {
    backup: AtomicBool,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a backup-and-recreate of the store file.
    pub fn raise_backup(&self) {
        self.backup.store(true, Ordering::SeqCst);
    }

    pub fn backup_requested(&self) -> bool {
        self.backup.load(Ordering::SeqCst)
    }

    /// Read and clear the backup request. Meant for the recovery workflow;
    /// sessions only ever raise the flag.
    pub fn take_backup_request(&self) -> bool {
        self.backup.swap(false, Ordering::SeqCst)
    }
}

/// One user session: a store plus the collaborators that act on its outcomes.
///
/// Created when the session starts and dropped when it ends. Each command
/// returns its [`CommandOutcome`] after emitting at most one notification
/// and, for store-integrity failures, raising the backup flag.
pub struct Session<B, L, N> {
    store: ThreatStore<B>,
    localizer: L,
    notifier: N,
    flags: Arc<SessionFlags>,
}

impl<B: Bridge, L: Localizer, N: Notifier> Session<B, L, N> {
    pub fn new(store: ThreatStore<B>, localizer: L, notifier: N) -> Self {
        Self {
            store,
            localizer,
            notifier,
            flags: Arc::new(SessionFlags::new()),
        }
    }

    /// Share an existing set of flags instead of a private one.
    pub fn with_flags(mut self, flags: Arc<SessionFlags>) -> Self {
        self.flags = flags;
        self
    }

    pub fn flags(&self) -> &Arc<SessionFlags> {
        &self.flags
    }

    pub fn store(&self) -> &ThreatStore<B> {
        &self.store
    }

    pub fn localizer(&self) -> &L {
        &self.localizer
    }

    /// End the session, keeping the store.
    pub fn into_store(self) -> ThreatStore<B> {
        self.store
    }

    // --- Commands ---

    pub fn fetch_all_threat_types(&mut self) -> Result<CommandOutcome> {
        let outcome = self.store.fetch_all_threat_types()?;
        Ok(self.settle(outcome))
    }

    pub fn add_threat_type(&mut self, threat_type: &NewThreatType) -> Result<CommandOutcome> {
        let outcome = self.store.add_threat_type(threat_type)?;
        Ok(self.settle(outcome))
    }

    pub fn delete_threat_type(&mut self, threat_type: &ThreatType) -> Result<CommandOutcome> {
        let outcome = self.store.delete_threat_type(threat_type)?;
        Ok(self.settle(outcome))
    }

    pub fn update_threat_type(&mut self, threat_type: &ThreatType) -> Result<CommandOutcome> {
        let outcome = self.store.update_threat_type(threat_type)?;
        Ok(self.settle(outcome))
    }

    pub fn fetch_all_threats(&mut self) -> Result<CommandOutcome> {
        let outcome = self.store.fetch_all_threats()?;
        Ok(self.settle(outcome))
    }

    pub fn add_threat(&mut self, threat: &NewThreat) -> Result<CommandOutcome> {
        let outcome = self.store.add_threat(threat)?;
        Ok(self.settle(outcome))
    }

    pub fn delete_threat(&mut self, threat: &Threat) -> Result<CommandOutcome> {
        let outcome = self.store.delete_threat(threat)?;
        Ok(self.settle(outcome))
    }

    pub fn update_threat(&mut self, threat: &Threat) -> Result<CommandOutcome> {
        let outcome = self.store.update_threat(threat)?;
        Ok(self.settle(outcome))
    }

    /// Notify and flag for an outcome, then hand it back.
    pub fn settle(&self, outcome: CommandOutcome) -> CommandOutcome {
        if let Some(notice) = self.store.config().messages.notice_for(&outcome) {
            let text = self.localizer.translate(&notice.key);
            debug!(key = %notice.key, "notifying");
            self.notifier.notify(Notification::from_notice(&notice, text));
        }
        if outcome.requires_backup() {
            warn!(collection = %outcome.collection(), "raising backup flag");
            self.flags.raise_backup();
        }
        outcome
    }

    // --- Views ---

    /// Threat types with names resolved for the active locale.
    ///
    /// Every name map is decoded again on each call; nothing is cached, so a
    /// locale switch is visible on the next read.
    pub fn threat_types(&self) -> Result<Vec<ThreatTypeView>> {
        self.store.threat_type_views(&self.localizer.locale())
    }

    /// Mirrored threats, unmodified.
    pub fn threats(&self) -> &[Threat] {
        self.store.threats()
    }

    /// Threats joined with their type and asset names, for the active locale.
    pub fn merged_threats<A>(&self, assets: &A) -> Result<Vec<MergedThreat>>
    where
        A: AssetSource + ?Sized,
    {
        self.store.merged_threats(&self.localizer.locale(), assets)
    }
}
