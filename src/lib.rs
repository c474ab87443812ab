//! # Threat Cache
//!
//! A client-side mirror of the threat type and threat collections held by a
//! backend store that is only reachable through a blocking request/response
//! bridge.
//!
//! ## Core Concepts
//!
//! - **Mirror**: in-memory copies of both collections, changed only after the
//!   backend has answered a command
//! - **Commands**: fetch-all, add, delete and update per collection, each
//!   returning an explicit [`CommandOutcome`]
//! - **Views**: locale-resolved threat types and threats joined with their
//!   type and asset names, recomputed on every read
//! - **Session**: turns outcomes into notifications and raises the backup
//!   flag when the store file is damaged
//!
//! ## Example
//!
//! ```ignore
//! use threat_cache::{Catalog, MemoryBackend, NotificationChannel, Session, ThreatStore};
//!
//! let backend = MemoryBackend::with_tables(["threat_types", "threats"]);
//! let notifications = NotificationChannel::new();
//! let listener = notifications.subscribe();
//!
//! let mut session = Session::new(ThreatStore::new(backend), Catalog::new("en"), notifications);
//! session.fetch_all_threat_types()?;
//! session.fetch_all_threats()?;
//!
//! let merged = session.merged_threats(&assets)?;
//! if session.flags().backup_requested() {
//!     // hand over to the re-import workflow
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod error;
pub mod i18n;
pub mod mirror;
pub mod notify;
pub mod session;
pub mod store;
pub mod types;
pub mod views;

// Re-exports
pub use bridge::{BackendReply, Bridge, MemoryBackend, StoreCode};
pub use config::{LocaleConfig, MessageKeys, StoreConfig, TableNames, WriteMessages};
pub use error::{Result, StoreError};
pub use i18n::{resolve_name, Catalog, Localizer};
pub use mirror::{apply_operation, Applied, Keyed, Mirror, MirrorOperation};
pub use notify::{
    ListenerId, Notice, Notification, NotificationChannel, NotificationColor,
    NotificationListener, Notifier, Severity, Silent,
};
pub use session::{Session, SessionFlags};
pub use store::{CommandOutcome, ThreatStore};
pub use types::*;
pub use views::{merge_threats, translate_threat_types, AssetSource};
