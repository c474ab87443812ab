//! Error handling and edge case tests.

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use threat_cache::{
    Asset, Bridge, Catalog, CommandOutcome, Locale, Localizer, NewThreat, NotificationChannel,
    NotificationListener, RecordId, Session, StoreCode, StoreError, ThreatStore, Verb,
};

/// A bridge that answers from a script and records every call.
#[derive(Default)]
struct ScriptedBridge {
    replies: Mutex<VecDeque<threat_cache::Result<Value>>>,
    calls: Mutex<Vec<(Verb, String, Option<Value>)>>,
}

impl ScriptedBridge {
    fn reply(&self, reply: Value) {
        self.replies.lock().push_back(Ok(reply));
    }

    fn fail(&self, message: &str) {
        self.replies
            .lock()
            .push_back(Err(StoreError::Bridge(message.to_string())));
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Bridge for ScriptedBridge {
    fn send_sync(
        &self,
        verb: Verb,
        table: &str,
        payload: Option<&Value>,
    ) -> threat_cache::Result<Value> {
        self.calls
            .lock()
            .push((verb, table.to_string(), payload.cloned()));
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::Bridge("script exhausted".to_string())))
    }
}

type TestSession = Session<Arc<ScriptedBridge>, Catalog, NotificationChannel>;

fn test_session() -> (TestSession, Arc<ScriptedBridge>, NotificationListener) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let catalog = Catalog::new("en");
    catalog.insert("en", "home.import_error_1", "Table missing, re-import the file");
    catalog.insert("en", "home.import_error_26", "File is not a database");
    catalog.insert("en", "home.import_error_unkown", "Unknown import error");
    catalog.insert("en", "global.delete_success", "Deleted");
    catalog.insert("en", "threats.insert_error", "Could not add threat");
    catalog.insert("en", "threats.insert_success", "Threat added");

    let bridge = Arc::new(ScriptedBridge::default());
    let channel = NotificationChannel::new();
    let listener = channel.subscribe();
    let session = Session::new(ThreatStore::new(Arc::clone(&bridge)), catalog, channel);
    (session, bridge, listener)
}

// --- Store Integrity Codes ---

#[test]
fn test_error_codes_notify_and_raise_backup() {
    let mut texts = Vec::new();

    for (code, expected) in [
        (1, StoreCode::MissingTable),
        (26, StoreCode::NotADatabase),
        (999, StoreCode::Unknown(999.into())),
    ] {
        let (mut session, bridge, listener) = test_session();
        bridge.reply(json!(code));

        let outcome = session.fetch_all_threats().unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::IntegrityFailure {
                collection: threat_cache::Collection::Threats,
                verb: Verb::QueryAll,
                code: expected,
            }
        );
        assert!(session.flags().backup_requested());

        let notifications = listener.drain();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].is_error());
        texts.push(notifications[0].text.clone());
    }

    assert_eq!(
        texts,
        vec![
            "Table missing, re-import the file",
            "File is not a database",
            "Unknown import error",
        ]
    );
}

#[test]
fn test_collection_reply_never_raises_backup() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!([{"id": 1, "name": "{\"en\":\"Spoofing\"}"}]));
    bridge.reply(json!({"id": 7, "threat_type_id": 1, "asset_id": 2}));

    session.fetch_all_threat_types().unwrap();
    session
        .add_threat(&NewThreat::new(RecordId(1), RecordId(2)))
        .unwrap();

    assert!(!session.flags().backup_requested());
    // Only the insert notifies; a successful fetch is silent.
    let notifications = listener.drain();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Threat added");
}

#[test]
fn test_error_code_leaves_mirror_untouched() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([{"id": 5, "threat_type_id": 1, "asset_id": 9}]));
    bridge.reply(json!(26));

    session.fetch_all_threats().unwrap();
    session.fetch_all_threats().unwrap();

    assert_eq!(session.threats().len(), 1);
}

#[test]
fn test_fractional_code_is_unknown() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!(1.5));

    let outcome = session.fetch_all_threats().unwrap();

    assert!(matches!(
        outcome,
        CommandOutcome::IntegrityFailure {
            code: StoreCode::Unknown(_),
            ..
        }
    ));
    assert_eq!(listener.drain()[0].text, "Unknown import error");
}

// --- Numeric Write Replies ---

#[test]
fn test_numeric_insert_reply_is_unexpected() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!(1));

    let result = session.add_threat(&NewThreat::new(RecordId(1), RecordId(2)));

    assert!(matches!(
        result,
        Err(StoreError::UnexpectedReply {
            verb: Verb::Insert,
            ..
        })
    ));
    assert!(session.threats().is_empty());
    assert!(!session.flags().backup_requested());
    assert!(listener.drain().is_empty());
}

#[test]
fn test_numeric_delete_reply_is_removed_id() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!([
        {"id": 1, "threat_type_id": 1, "asset_id": 9},
        {"id": 2, "threat_type_id": 1, "asset_id": 9}
    ]));
    bridge.reply(json!(1));

    session.fetch_all_threats().unwrap();
    let first = session.threats()[0].clone();
    let outcome = session.delete_threat(&first).unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::Written {
            collection: threat_cache::Collection::Threats,
            verb: Verb::Remove,
            id: RecordId(1),
        }
    );
    assert_eq!(session.threats().len(), 1);
    assert_eq!(session.threats()[0].id, RecordId(2));
    assert!(!session.flags().backup_requested());

    let notifications = listener.drain();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Deleted");
    assert!(!notifications[0].is_error());
}

#[test]
fn test_negative_delete_reply_is_unexpected() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([{"id": 1, "threat_type_id": 1, "asset_id": 9}]));
    bridge.reply(json!(-3));

    session.fetch_all_threats().unwrap();
    let first = session.threats()[0].clone();
    let result = session.delete_threat(&first);

    assert!(matches!(
        result,
        Err(StoreError::UnexpectedReply {
            verb: Verb::Remove,
            ..
        })
    ));
    assert_eq!(session.threats().len(), 1);
    assert!(!session.flags().backup_requested());
}

// --- Soft Failures ---

#[test]
fn test_empty_insert_reply_is_soft_failure() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!([]));

    let outcome = session
        .add_threat(&NewThreat::new(RecordId(1), RecordId(2)))
        .unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::SoftFailure {
            collection: threat_cache::Collection::Threats,
            verb: Verb::Insert,
        }
    );
    assert!(session.threats().is_empty());
    assert!(!session.flags().backup_requested());

    let notifications = listener.drain();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Could not add threat");
    assert!(notifications[0].is_error());
}

#[test]
fn test_list_with_empty_first_row_is_soft_failure() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([{}]));

    let outcome = session
        .add_threat(&NewThreat::new(RecordId(1), RecordId(2)))
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::SoftFailure { .. }));
}

#[test]
fn test_unreadable_insert_row_is_soft_failure() {
    let (mut session, bridge, listener) = test_session();
    bridge.reply(json!([{"id": 5, "threat_type_id": 1, "asset_id": 9}]));
    bridge.reply(json!({"id": "x"}));

    session.fetch_all_threats().unwrap();
    let outcome = session
        .add_threat(&NewThreat::new(RecordId(1), RecordId(2)))
        .unwrap();

    assert_eq!(
        outcome,
        CommandOutcome::SoftFailure {
            collection: threat_cache::Collection::Threats,
            verb: Verb::Insert,
        }
    );
    assert_eq!(session.threats().len(), 1);
    assert_eq!(session.threats()[0].id, RecordId(5));
    assert!(!session.flags().backup_requested());

    let notifications = listener.drain();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].text, "Could not add threat");
}

// --- Bridge and Reply Errors ---

#[test]
fn test_bridge_failure_propagates_silently() {
    let (mut session, bridge, listener) = test_session();
    bridge.fail("renderer disconnected");

    let result = session.fetch_all_threats();

    assert!(matches!(result, Err(StoreError::Bridge(_))));
    assert!(!session.flags().backup_requested());
    assert!(listener.drain().is_empty());
}

#[test]
fn test_single_row_reply_to_fetch_is_unexpected() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!({"id": 1}));

    let result = session.fetch_all_threats();
    assert!(matches!(
        result,
        Err(StoreError::UnexpectedReply {
            verb: Verb::QueryAll,
            ..
        })
    ));
}

#[test]
fn test_malformed_row_keeps_previous_mirror() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([{"id": 5, "threat_type_id": 1, "asset_id": 9}]));
    bridge.reply(json!([{"id": "five"}]));

    session.fetch_all_threats().unwrap();
    let result = session.fetch_all_threats();

    assert!(matches!(result, Err(StoreError::Deserialization(_))));
    assert_eq!(session.threats()[0].id, RecordId(5));
}

#[test]
fn test_malformed_name_map_propagates() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([
        {"id": 1, "name": "{\"en\":\"Spoofing\"}"},
        {"id": 2, "name": "{\"en\": Tampering"}
    ]));

    session.fetch_all_threat_types().unwrap();

    let result = session.threat_types();
    assert!(matches!(
        result,
        Err(StoreError::NameDecode { id: RecordId(2), .. })
    ));

    let result = session.merged_threats(&Vec::<Asset>::new());
    assert!(matches!(result, Err(StoreError::NameDecode { .. })));
}

// --- Bridge Usage ---

#[test]
fn test_each_command_is_one_call() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([]));
    bridge.reply(json!([]));
    bridge.reply(json!([]));

    session.fetch_all_threats().unwrap();
    session.fetch_all_threat_types().unwrap();
    session
        .add_threat(&NewThreat::new(RecordId(1), RecordId(2)))
        .unwrap();

    assert_eq!(bridge.call_count(), 3);

    let calls = bridge.calls.lock();
    assert_eq!(calls[0].0, Verb::QueryAll);
    assert_eq!(calls[0].1, "threats");
    assert_eq!(calls[0].2, None);
    assert_eq!(calls[1].1, "threat_types");
    assert_eq!(calls[2].0, Verb::Insert);
    assert_eq!(
        calls[2].2,
        Some(json!({"threat_type_id": 1, "asset_id": 2}))
    );
}

#[test]
fn test_unsupported_locale_falls_back_to_base() {
    let (mut session, bridge, _listener) = test_session();
    bridge.reply(json!([{"id": 1, "name": "{\"en\":\"Spoofing\",\"es\":\"Suplantación\"}"}]));
    session.fetch_all_threat_types().unwrap();

    session.localizer().set_locale("de");
    let views = session.threat_types().unwrap();
    assert_eq!(views[0].name_translation.as_deref(), Some("Spoofing"));
    assert_eq!(session.localizer().locale(), Locale::from("de"));
}
