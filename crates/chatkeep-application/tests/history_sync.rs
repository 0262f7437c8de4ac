use async_trait::async_trait;
use chatkeep_application::sync::ConversationPhase;
use chatkeep_application::{
    AppendOutcome, ControllerOptions, HistorySyncController, HostEvent, InMemoryLiveBuffer,
    RestoreOutcome,
};
use chatkeep_core::contact::{Contact, SessionContext};
use chatkeep_core::history::HistoryStore;
use chatkeep_core::identity::StableConversationKey;
use chatkeep_core::message::{Callback, LiveMessage, LiveValue, StoredMessage};
use chatkeep_core::{ChatkeepError, Result};
use chatkeep_infrastructure::{KvHistoryStore, MemoryBackend};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};

// Store wrapper recording which conversations were read
struct CountingStore {
    inner: KvHistoryStore<MemoryBackend>,
    reads: Mutex<Vec<StableConversationKey>>,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: KvHistoryStore::new(MemoryBackend::new()),
            reads: Mutex::new(Vec::new()),
        }
    }

    fn reads(&self) -> Vec<StableConversationKey> {
        self.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoryStore for CountingStore {
    async fn append(&self, key: &StableConversationKey, message: StoredMessage) -> Result<()> {
        self.inner.append(key, message).await
    }

    async fn read(&self, key: &StableConversationKey) -> Result<Vec<StoredMessage>> {
        self.reads.lock().unwrap().push(key.clone());
        self.inner.read(key).await
    }

    async fn conversations(&self) -> Result<Vec<StableConversationKey>> {
        self.inner.conversations().await
    }
}

// Store whose backend is unavailable
struct FailingStore;

#[async_trait]
impl HistoryStore for FailingStore {
    async fn append(&self, _key: &StableConversationKey, _message: StoredMessage) -> Result<()> {
        Err(std::io::Error::other("quota exceeded").into())
    }

    async fn read(&self, _key: &StableConversationKey) -> Result<Vec<StoredMessage>> {
        Err(ChatkeepError::data_access("backend not initialized"))
    }

    async fn conversations(&self) -> Result<Vec<StableConversationKey>> {
        Ok(Vec::new())
    }
}

// Store whose reads wait until released
struct GatedStore {
    inner: KvHistoryStore<MemoryBackend>,
    entered: Notify,
    gate: Notify,
}

#[async_trait]
impl HistoryStore for GatedStore {
    async fn append(&self, key: &StableConversationKey, message: StoredMessage) -> Result<()> {
        self.inner.append(key, message).await
    }

    async fn read(&self, key: &StableConversationKey) -> Result<Vec<StoredMessage>> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.read(key).await
    }

    async fn conversations(&self) -> Result<Vec<StableConversationKey>> {
        self.inner.conversations().await
    }
}

fn session(contacts: &[(&str, &str, &str)]) -> SessionContext {
    SessionContext::new(
        contacts
            .iter()
            .map(|(id, name, alias)| Contact::new(*id, *name, *alias)),
    )
}

fn text_message(peer: &str, text: &str) -> LiveMessage {
    LiveMessage::new().with("peer", peer).with("text", text)
}

fn texts(messages: &[LiveMessage]) -> Vec<String> {
    messages
        .iter()
        .map(|m| m.get_str("text").unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_history_follows_contact_across_sessions() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));

    let first_buffer = Arc::new(InMemoryLiveBuffer::new());
    let first = HistorySyncController::new(
        store.clone(),
        first_buffer,
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );
    let outcome = first.on_message_appended(&text_message("u1", "hi"));
    assert!(matches!(
        outcome,
        AppendOutcome::Queued { ref key, .. } if key.to_string() == "Alice_&&_"
    ));
    first.flush().await;

    let second_buffer = Arc::new(InMemoryLiveBuffer::new());
    let second = HistorySyncController::new(
        store,
        second_buffer.clone(),
        session(&[("u4", "Bob", ""), ("u9", "Alice", "")]),
        ControllerOptions::default(),
    );
    let outcome = second.on_conversation_selected("u9").await.unwrap();
    assert_eq!(outcome, RestoreOutcome::Installed { restored: 1, dropped: 0 });

    let restored = second_buffer.messages("u9").await;
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].get_str("text"), Some("hi"));
    assert_eq!(restored[0].get_str("peer"), Some("u9"));
    assert_eq!(restored[0].get_str("actual_sender"), Some("u9"));
    assert_eq!(restored[0].get("unread"), Some(&LiveValue::Plain(json!(false))));
    assert_eq!(restored[0].get("status"), Some(&LiveValue::Plain(json!(0))));
    assert_eq!(second.phase("u9"), ConversationPhase::Live);
}

#[tokio::test]
async fn test_live_buffer_is_never_overwritten() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );

    controller.on_message_appended(&text_message("u1", "old"));
    controller.flush().await;

    let fresh = text_message("u1", "fresh from server");
    buffer.push("u1", fresh.clone()).await;

    let outcome = controller.on_conversation_selected("u1").await.unwrap();
    assert_eq!(outcome, RestoreOutcome::SkippedLiveBuffer);
    assert_eq!(buffer.messages("u1").await, vec![fresh]);
}

#[tokio::test]
async fn test_restore_twice_is_a_no_op() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );
    controller.on_message_appended(&text_message("u1", "a"));
    controller.flush().await;

    let first = controller.restore("u1").await;
    let before = buffer.messages("u1").await;
    let second = controller.restore("u1").await;

    assert_eq!(first, RestoreOutcome::Installed { restored: 1, dropped: 0 });
    assert_eq!(second, RestoreOutcome::SkippedLiveBuffer);
    assert_eq!(buffer.messages("u1").await, before);
}

#[tokio::test]
async fn test_unresolvable_messages_are_dropped_in_order() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let group = StableConversationKey::new("Book club", "");
    let stored = |text: &str, name: &str| -> StoredMessage {
        serde_json::from_value(json!({
            "text": text,
            "peer_display_name": name,
            "peer_alias": "",
        }))
        .unwrap()
    };
    store.append(&group, stored("one", "Book club")).await.unwrap();
    store.append(&group, stored("two", "Departed")).await.unwrap();
    store.append(&group, stored("three", "Book club")).await.unwrap();

    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("g7", "Book club", "")]),
        ControllerOptions::default(),
    );

    let outcome = controller.on_conversation_selected("g7").await.unwrap();

    assert_eq!(outcome, RestoreOutcome::Installed { restored: 2, dropped: 1 });
    assert_eq!(texts(&buffer.messages("g7").await), vec!["one", "three"]);
}

#[tokio::test]
async fn test_separator_inside_names_keeps_conversations_apart() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("x", "A_&&_b", ""), ("y", "A", "b_&&_")]),
        ControllerOptions::default(),
    );
    controller.on_message_appended(&text_message("x", "only for x"));
    controller.flush().await;

    let outcome = controller.restore("y").await;
    assert_eq!(outcome, RestoreOutcome::NothingToRestore { dropped: 0 });
    assert!(buffer.messages("y").await.is_empty());

    let outcome = controller.restore("x").await;
    assert_eq!(outcome, RestoreOutcome::Installed { restored: 1, dropped: 0 });
    assert_eq!(texts(&buffer.messages("x").await), vec!["only for x"]);
}

#[tokio::test]
async fn test_record_for_other_peer_is_not_restored() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let alice = StableConversationKey::new("Alice", "");
    let stored = |text: &str, name: &str| -> StoredMessage {
        serde_json::from_value(json!({
            "text": text,
            "peer_display_name": name,
            "peer_alias": "",
        }))
        .unwrap()
    };
    store.append(&alice, stored("mine", "Alice")).await.unwrap();
    store.append(&alice, stored("stray", "Bob")).await.unwrap();

    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("u1", "Alice", ""), ("u2", "Bob", "")]),
        ControllerOptions::default(),
    );

    let outcome = controller.restore("u1").await;

    assert_eq!(outcome, RestoreOutcome::Installed { restored: 1, dropped: 1 });
    let restored = buffer.messages("u1").await;
    assert_eq!(texts(&restored), vec!["mine"]);
    assert_eq!(restored[0].get_str("peer"), Some("u1"));
    assert!(buffer.messages("u2").await.is_empty());
}

#[tokio::test]
async fn test_unknown_conversation_leaves_phase_idle() {
    let store = Arc::new(CountingStore::new());
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store.clone(),
        buffer,
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );

    assert_eq!(controller.restore("ghost").await, RestoreOutcome::UnknownConversation);
    assert_eq!(controller.phase("ghost"), ConversationPhase::Idle);
    assert_eq!(controller.restore("ghost").await, RestoreOutcome::UnknownConversation);
    assert!(store.reads().is_empty());
}

#[tokio::test]
async fn test_appended_message_is_sanitized_before_storage() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let controller = HistorySyncController::new(
        store.clone(),
        Arc::new(InMemoryLiveBuffer::new()),
        session(&[("u2", "Bob", "bobby")]),
        ControllerOptions::default(),
    );

    let cancel: Callback = Arc::new(|| {});
    let message = text_message("u2", "file.zip")
        .with("size", json!(2048))
        .with("cancel_upload", LiveValue::Callback(cancel))
        .with("recommend_info", json!({"card": true}));

    let outcome = controller.on_message_appended(&message);
    controller.flush().await;

    match outcome {
        AppendOutcome::Queued { key, mut stripped } => {
            assert_eq!(key, StableConversationKey::new("Bob", "bobby"));
            stripped.sort();
            assert_eq!(stripped, vec!["cancel_upload", "recommend_info"]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let history = store
        .read(&StableConversationKey::new("Bob", "bobby"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&history).unwrap(),
        json!([{
            "peer": "u2",
            "text": "file.zip",
            "size": 2048,
            "peer_display_name": "Bob",
            "peer_alias": "bobby",
        }])
    );
}

#[tokio::test]
async fn test_append_without_known_peer_is_skipped() {
    let store = Arc::new(CountingStore::new());
    let controller = HistorySyncController::new(
        store.clone(),
        Arc::new(InMemoryLiveBuffer::new()),
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );

    assert_eq!(
        controller.on_message_appended(&text_message("stranger", "hello")),
        AppendOutcome::UnknownPeer("stranger".to_string())
    );
    assert_eq!(
        controller.on_message_appended(&LiveMessage::new().with("text", "no peer")),
        AppendOutcome::MissingPeer
    );

    controller.flush().await;
    assert!(store.conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_persistence_failures_stay_contained() {
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        Arc::new(FailingStore),
        buffer.clone(),
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );

    let outcome = controller.on_message_appended(&text_message("u1", "lost"));
    assert!(matches!(outcome, AppendOutcome::Queued { .. }));
    controller.flush().await;
    let stats = controller.writer_stats();
    assert_eq!((stats.persisted, stats.failed), (0, 1));

    let restore = controller.restore("u1").await;
    assert!(matches!(restore, RestoreOutcome::Failed(ref e) if e.contains("backend not initialized")));
    assert_eq!(controller.phase("u1"), ConversationPhase::Idle);
    assert!(buffer.messages("u1").await.is_empty());
}

#[tokio::test]
async fn test_same_key_appends_keep_issue_order() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store,
        buffer.clone(),
        session(&[("u1", "Alice", ""), ("u2", "Bob", "")]),
        ControllerOptions::default(),
    );

    for i in 0..10 {
        controller.on_message_appended(&text_message("u1", &format!("a{}", i)));
        controller.on_message_appended(&text_message("u2", &format!("b{}", i)));
    }
    controller.flush().await;
    assert_eq!(controller.writer_stats().persisted, 20);

    controller.restore("u1").await;
    let expected: Vec<String> = (0..10).map(|i| format!("a{}", i)).collect();
    assert_eq!(texts(&buffer.messages("u1").await), expected);
}

#[tokio::test(start_paused = true)]
async fn test_change_burst_triggers_one_restore_for_last_conversation() {
    let store = Arc::new(CountingStore::new());
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store.clone(),
        buffer.clone(),
        session(&[("u1", "Alice", ""), ("u2", "Bob", ""), ("u3", "Carol", "")]),
        ControllerOptions {
            restore_debounce: Duration::from_millis(100),
            ..ControllerOptions::default()
        },
    );
    for peer in ["u1", "u2", "u3"] {
        controller.on_message_appended(&text_message(peer, peer));
    }
    controller.flush().await;

    for current in ["u1", "u2", "u1", "u3"] {
        controller.handle(HostEvent::ConversationChanged(Some(current.to_string())));
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(store.reads().is_empty());

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(store.reads(), vec![StableConversationKey::new("Carol", "")]);
    assert_eq!(texts(&buffer.messages("u3").await), vec!["u3"]);
    assert!(buffer.messages("u1").await.is_empty());
}

#[tokio::test]
async fn test_new_session_during_read_discards_restore() {
    let store = Arc::new(GatedStore {
        inner: KvHistoryStore::new(MemoryBackend::new()),
        entered: Notify::new(),
        gate: Notify::new(),
    });
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store.clone(),
        buffer.clone(),
        session(&[("u1", "Alice", "")]),
        ControllerOptions::default(),
    );
    controller.on_message_appended(&text_message("u1", "hi"));
    controller.flush().await;

    let pending = controller.on_conversation_selected("u1");
    store.entered.notified().await;
    controller.start_session(session(&[("u1", "Mallory", "")]));
    store.gate.notify_one();

    assert_eq!(pending.await.unwrap(), RestoreOutcome::Stale);
    assert!(buffer.messages("u1").await.is_empty());
}

#[tokio::test]
async fn test_event_loop_drives_controller() {
    let store = Arc::new(KvHistoryStore::new(MemoryBackend::new()));
    let buffer = Arc::new(InMemoryLiveBuffer::new());
    let controller = HistorySyncController::new(
        store.clone(),
        buffer,
        SessionContext::default(),
        ControllerOptions::default(),
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let running = tokio::spawn(controller.run(rx));

    tx.send(HostEvent::SessionStarted(session(&[("u5", "Dana", "")])))
        .unwrap();
    tx.send(HostEvent::MessageAppended(text_message("u5", "one")))
        .unwrap();
    tx.send(HostEvent::MessageAppended(text_message("u5", "two")))
        .unwrap();
    drop(tx);
    running.await.unwrap();

    let history = store
        .read(&StableConversationKey::new("Dana", ""))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].get_str("text"), Some("two"));
}
