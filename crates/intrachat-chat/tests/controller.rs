use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use intrachat_chat::{BeginSend, ConversationController, SendOutcome, SendStatus, SkipReason};
use intrachat_logging::ConversationLogger;
use intrachat_responder::{RemoteReply, Responder, ResponderError};
use intrachat_storage::{
    FileStore, KeyValueStore, MemoryStore, SessionStore, StorageError, StorageResult, CONVERSATIONS_KEY,
    SELECTED_TOPIC_KEY,
};
use intrachat_types::{
    seed_conversations, Conversation, ExchangeTurn, Sender, Topic, APOLOGY_MESSAGE, FALLBACK_REPLY, NEW_CHAT_PREVIEW,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

/// Responder that plays back a fixed sequence of results and records calls
#[derive(Default)]
struct ScriptedResponder {
    replies: Mutex<VecDeque<Result<RemoteReply, ResponderError>>>,
    calls: Mutex<Vec<(String, Vec<ExchangeTurn>)>>,
}

impl ScriptedResponder {
    fn with(replies: Vec<Result<RemoteReply, ResponderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::default(),
        }
    }

    fn calls(&self) -> Vec<(String, Vec<ExchangeTurn>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for ScriptedResponder {
    async fn respond(&self, text: &str, history: &[ExchangeTurn]) -> Result<RemoteReply, ResponderError> {
        self.calls.lock().unwrap().push((text.to_string(), history.to_vec()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(RemoteReply::Text("default".to_string())))
    }
}

type TestController = ConversationController<Arc<MemoryStore>, ScriptedResponder>;

fn controller(replies: Vec<Result<RemoteReply, ResponderError>>) -> (TestController, Arc<MemoryStore>) {
    let backend = Arc::new(MemoryStore::new());
    let store = SessionStore::new(Arc::clone(&backend));
    let controller = ConversationController::open(store, ScriptedResponder::with(replies)).unwrap();
    (controller, backend)
}

fn persisted_list(backend: &MemoryStore) -> Vec<Conversation> {
    serde_json::from_str(&backend.get(CONVERSATIONS_KEY).unwrap().unwrap()).unwrap()
}

fn outage() -> Result<RemoteReply, ResponderError> {
    Err(ResponderError::Status { status: 502, body: "bad gateway".to_string() })
}

#[tokio::test]
async fn opening_seeds_the_list() {
    let (controller, backend) = controller(vec![]);
    assert_eq!(controller.conversations(), seed_conversations().as_slice());
    assert_eq!(persisted_list(&backend), seed_conversations());
    assert_eq!(controller.active_id(), None);
    assert_eq!(controller.status(), SendStatus::Idle);
}

#[tokio::test]
async fn persisted_list_tracks_every_action() {
    let (mut controller, backend) = controller(vec![]);

    let first = controller.new_conversation("  Contracts  ").await.unwrap().unwrap();
    assert_eq!(first.title, "Contracts");
    assert_eq!(first.preview, NEW_CHAT_PREVIEW);
    assert_eq!(persisted_list(&backend), controller.conversations());

    let second = controller.new_conversation("Torts").await.unwrap().unwrap();
    assert_eq!(controller.conversations()[0], second);
    assert_eq!(persisted_list(&backend), controller.conversations());

    controller.select(&first.id).unwrap();
    assert_eq!(persisted_list(&backend), controller.conversations());

    controller.delete(&second.id).await.unwrap();
    assert_eq!(persisted_list(&backend), controller.conversations());

    controller.delete("1").await.unwrap();
    assert_eq!(persisted_list(&backend), controller.conversations());
    assert_eq!(controller.conversations().len(), 2);
}

#[tokio::test]
async fn blank_title_creates_nothing() {
    let (mut controller, _) = controller(vec![]);
    assert!(controller.new_conversation("   ").await.unwrap().is_none());
    assert_eq!(controller.conversations().len(), 2);
}

#[tokio::test]
async fn deleting_removes_derived_keys_and_resets_active_state() {
    let (mut controller, backend) = controller(vec![
        Ok(RemoteReply::Exchange {
            ai_response: "hi".to_string(),
            history: Some(vec![ExchangeTurn::human("hello"), ExchangeTurn::ai("hi")]),
        }),
    ]);

    controller.send_message("hello").await.unwrap();
    let id = controller.active_id().unwrap().to_string();
    assert!(backend.contains(&format!("chat_{id}")));
    assert!(backend.contains(&format!("history_{id}")));

    assert!(controller.delete(&id).await.unwrap());
    assert!(!backend.contains(&format!("chat_{id}")));
    assert!(!backend.contains(&format!("history_{id}")));
    assert_eq!(controller.active_id(), None);
    assert!(controller.messages().is_empty());
    assert!(controller.history().is_empty());

    // Loading a deleted conversation yields empty state, not an error
    assert!(!controller.select(&id).unwrap());
    assert_eq!(controller.active_id(), None);
    assert!(controller.messages().is_empty());
    assert!(controller.history().is_empty());
}

#[tokio::test]
async fn sending_after_selecting_a_deleted_conversation_starts_a_new_one() {
    let (mut controller, backend) = controller(vec![
        Ok(RemoteReply::Text("first".to_string())),
        Ok(RemoteReply::Text("second".to_string())),
    ]);

    controller.send_message("hello").await.unwrap();
    let deleted = controller.active_id().unwrap().to_string();
    controller.delete(&deleted).await.unwrap();

    assert!(!controller.select(&deleted).unwrap());
    let outcome = controller.send_message("again").await.unwrap();

    let SendOutcome::Answered { conversation_id, created_conversation, reply } = outcome else {
        panic!("expected an answer");
    };
    assert!(created_conversation);
    assert_ne!(conversation_id, deleted);
    assert_eq!(reply.content, "second");
    assert!(!backend.contains(&format!("chat_{deleted}")));

    let ids: Vec<_> = persisted_list(&backend).into_iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![conversation_id, "1".to_string(), "2".to_string()]);
}

#[tokio::test]
async fn selecting_an_unknown_id_keeps_the_baseline() {
    let (mut controller, backend) = controller(vec![]);
    assert!(!controller.select("never-created").unwrap());
    assert_eq!(controller.active_id(), None);
    assert!(!backend.contains("chat_never-created"));
}

#[tokio::test]
async fn deleting_another_conversation_keeps_active_state() {
    let (mut controller, _) = controller(vec![]);
    controller.send_message("keep me").await.unwrap();
    let active = controller.active_id().unwrap().to_string();

    controller.delete("2").await.unwrap();
    assert_eq!(controller.active_id(), Some(active.as_str()));
    assert_eq!(controller.messages().len(), 2);
}

#[tokio::test]
async fn first_send_creates_exactly_one_conversation() {
    let (mut controller, backend) = controller(vec![Ok(RemoteReply::Text("ok".to_string()))]);
    let input = "What are the latest updates on international law and treaties?";

    let outcome = controller.send_message(input).await.unwrap();

    let SendOutcome::Answered { conversation_id, created_conversation, reply } = outcome else {
        panic!("expected an answer");
    };
    assert!(created_conversation);
    assert_eq!(reply.content, "ok");
    assert_eq!(controller.conversations().len(), 3);

    let created = &controller.conversations()[0];
    assert_eq!(created.id, conversation_id);
    assert_eq!(created.title, "What are the latest updates on...");
    assert_eq!(created.preview, "What are the latest updates on international law a");
    assert_eq!(persisted_list(&backend), controller.conversations());

    // A second send reuses the conversation
    let outcome = controller.send_message("and more?").await.unwrap();
    assert!(matches!(outcome, SendOutcome::Answered { created_conversation: false, .. }));
    assert_eq!(controller.conversations().len(), 3);
    assert_eq!(controller.conversations()[0].preview, "and more?");
    assert_eq!(controller.messages().len(), 4);
}

#[tokio::test]
async fn short_first_message_is_used_verbatim_as_title() {
    let (mut controller, _) = controller(vec![]);
    controller.send_message("hello").await.unwrap();
    let created = controller.active_conversation().unwrap();
    assert_eq!(created.title, "hello");
    assert_eq!(created.preview, "hello");
}

#[tokio::test]
async fn empty_input_is_a_no_op() {
    let (mut controller, backend) = controller(vec![]);
    let keys_before = backend.keys();

    let outcome = controller.send_message("   \n").await.unwrap();

    assert!(matches!(outcome, SendOutcome::Skipped(SkipReason::EmptyInput)));
    assert_eq!(controller.conversations().len(), 2);
    assert_eq!(backend.keys(), keys_before);
    assert!(controller.responder().calls().is_empty());
}

#[tokio::test]
async fn second_send_while_sending_is_rejected() {
    let (mut controller, _) = controller(vec![Ok(RemoteReply::Text("first".to_string()))]);

    let BeginSend::Pending(pending) = controller.begin_send("one").await.unwrap() else {
        panic!("expected a pending send");
    };
    assert_eq!(controller.status(), SendStatus::Sending);
    assert!(matches!(
        controller.begin_send("two").await.unwrap(),
        BeginSend::Skipped(SkipReason::AlreadySending)
    ));

    // Optimistic append is already persisted
    let transcript = controller.store().load_transcript(&pending.conversation_id).unwrap();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].content, "one");

    controller
        .complete_send(pending, Ok(RemoteReply::Text("reply".to_string())))
        .await
        .unwrap();
    assert_eq!(controller.status(), SendStatus::Idle);
    assert_eq!(controller.messages().len(), 2);
}

#[tokio::test]
async fn network_failure_records_one_apology() {
    let (mut controller, _) = controller(vec![outage()]);

    let outcome = controller.send_message("are you there?").await.unwrap();

    let SendOutcome::Failed { conversation_id, reply, error, .. } = outcome else {
        panic!("expected a failure");
    };
    assert_eq!(reply.content, APOLOGY_MESSAGE);
    assert!(matches!(error, ResponderError::Status { status: 502, .. }));

    let transcript = controller.store().load_transcript(&conversation_id).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].sender, Sender::User);
    assert_eq!(transcript[0].content, "are you there?");
    assert_eq!(transcript[1].sender, Sender::Ai);
    assert_eq!(transcript[1].content, APOLOGY_MESSAGE);
    assert_eq!(transcript, controller.messages());
    assert_eq!(controller.status(), SendStatus::Idle);

    // Exactly one attempt
    assert_eq!(controller.responder().calls().len(), 1);
}

#[tokio::test]
async fn topic_list_and_unknown_replies_are_formatted() {
    let topics = vec![
        Topic { id: None, title: "Legal Insights".into(), description: "Updates".into() },
        Topic { id: None, title: "Global Justice".into(), description: "Trends".into() },
    ];
    let (mut controller, _) = controller(vec![
        Ok(RemoteReply::Topics(topics)),
        Ok(RemoteReply::Unrecognized(json!({ "message": "Welcome" }))),
    ]);

    controller.send_message("topics?").await.unwrap();
    controller.send_message("again").await.unwrap();

    let messages = controller.messages();
    assert_eq!(
        messages[1].content,
        "Here are some topics:\n\n1. Legal Insights\nUpdates\n\n2. Global Justice\nTrends"
    );
    assert_eq!(messages[3].content, FALLBACK_REPLY);
}

#[tokio::test]
async fn exchange_history_is_carried_and_replaced() {
    let turn_one = vec![ExchangeTurn::human("hi"), ExchangeTurn::ai("hello")];
    let turn_two = vec![
        ExchangeTurn::human("hi"),
        ExchangeTurn::ai("hello"),
        ExchangeTurn::human("how?"),
        ExchangeTurn::ai("like this"),
    ];
    let (mut controller, _) = controller(vec![
        Ok(RemoteReply::Exchange { ai_response: "hello".into(), history: Some(turn_one.clone()) }),
        Ok(RemoteReply::Exchange { ai_response: "like this".into(), history: Some(turn_two.clone()) }),
    ]);

    controller.send_message("hi").await.unwrap();
    controller.send_message("how?").await.unwrap();

    let calls = controller.responder().calls();
    assert_eq!(calls[0], ("hi".to_string(), vec![]));
    assert_eq!(calls[1], ("how?".to_string(), turn_one));

    let id = controller.active_id().unwrap().to_string();
    assert_eq!(controller.history(), turn_two.as_slice());
    assert_eq!(controller.store().load_history(&id).unwrap(), turn_two);

    // Re-selecting restores both transcript and history
    controller.deselect();
    controller.select(&id).unwrap();
    assert_eq!(controller.messages().len(), 4);
    assert_eq!(controller.history(), turn_two.as_slice());
}

#[tokio::test]
async fn failed_send_keeps_previous_history() {
    let history = vec![ExchangeTurn::human("a"), ExchangeTurn::ai("b")];
    let (mut controller, _) = controller(vec![
        Ok(RemoteReply::Exchange { ai_response: "b".into(), history: Some(history.clone()) }),
        outage(),
    ]);

    controller.send_message("a").await.unwrap();
    controller.send_message("c").await.unwrap();

    let id = controller.active_id().unwrap().to_string();
    assert_eq!(controller.store().load_history(&id).unwrap(), history);
}

#[tokio::test]
async fn reply_lands_in_original_conversation_after_switching() {
    let (mut controller, _) = controller(vec![]);

    let BeginSend::Pending(pending) = controller.begin_send("question").await.unwrap() else {
        panic!("expected a pending send");
    };
    let origin = pending.conversation_id.clone();

    controller.select("1").unwrap();
    controller
        .complete_send(pending, Ok(RemoteReply::Text("answer".into())))
        .await
        .unwrap();

    assert!(controller.messages().is_empty());
    let transcript = controller.store().load_transcript(&origin).unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].content, "answer");
}

#[tokio::test]
async fn reply_for_deleted_conversation_is_discarded() {
    let (mut controller, backend) = controller(vec![]);

    let BeginSend::Pending(pending) = controller.begin_send("question").await.unwrap() else {
        panic!("expected a pending send");
    };
    let id = pending.conversation_id.clone();
    controller.delete(&id).await.unwrap();

    let outcome = controller
        .complete_send(pending, Ok(RemoteReply::Text("late".into())))
        .await
        .unwrap();

    assert!(matches!(outcome, SendOutcome::Discarded { .. }));
    assert!(!backend.contains(&format!("chat_{id}")));
    assert_eq!(controller.status(), SendStatus::Idle);
}

#[tokio::test]
async fn search_filters_without_mutating_storage() {
    let (mut controller, backend) = controller(vec![]);
    controller.new_conversation("Weekend Plans").await.unwrap();
    let persisted_before = backend.get(CONVERSATIONS_KEY).unwrap();

    let hits = controller.search("WEEKEND").unwrap().to_vec();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Weekend Plans");

    // Preview text is searched too
    assert_eq!(controller.search("previous").unwrap().len(), 1);

    assert!(controller.search("xyz-no-match").unwrap().is_empty());
    assert_eq!(controller.search_query(), Some("xyz-no-match"));

    assert_eq!(controller.search("").unwrap().len(), 3);
    assert_eq!(controller.search_query(), None);

    assert_eq!(backend.get(CONVERSATIONS_KEY).unwrap(), persisted_before);
    assert_eq!(controller.conversations().len(), 3);
}

#[tokio::test]
async fn mutations_during_search_persist_the_full_list() {
    let (mut controller, backend) = controller(vec![]);
    controller.search("quick").unwrap();
    assert_eq!(controller.visible_conversations().len(), 1);

    controller.new_conversation("Quick note").await.unwrap();

    assert_eq!(controller.visible_conversations().len(), 2);
    assert_eq!(controller.conversations().len(), 3);
    assert_eq!(persisted_list(&backend).len(), 3);

    controller.clear_search();
    assert_eq!(controller.visible_conversations(), controller.conversations());
}

#[tokio::test]
async fn rename_updates_list() {
    let (mut controller, backend) = controller(vec![]);
    assert!(controller.rename("2", "  Renamed ").unwrap());
    assert_eq!(controller.find("2").unwrap().title, "Renamed");
    assert_eq!(persisted_list(&backend), controller.conversations());

    assert!(!controller.rename("2", " ").unwrap());
    assert!(!controller.rename("missing", "x").unwrap());
}

#[tokio::test]
async fn topic_selection_is_remembered() {
    let (mut controller, backend) = controller(vec![]);
    controller.select_topic("3").unwrap();
    assert_eq!(backend.get(SELECTED_TOPIC_KEY).unwrap().as_deref(), Some("3"));
}

#[tokio::test]
async fn file_backed_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let conversation_id;
    {
        let store = SessionStore::new(FileStore::new(temp.path()).unwrap());
        let logger = ConversationLogger::new(temp.path()).await.unwrap();
        let mut controller = ConversationController::open(store, ScriptedResponder::with(vec![outage()]))
            .unwrap()
            .with_logger(logger);

        controller.send_message("persist me").await.unwrap();
        conversation_id = controller.active_id().unwrap().to_string();
        controller.shutdown().await;
    }

    let store = SessionStore::new(FileStore::new(temp.path()).unwrap());
    let mut controller = ConversationController::open(store, ScriptedResponder::default()).unwrap();
    assert_eq!(controller.conversations()[0].id, conversation_id);
    assert_eq!(controller.conversations().len(), 3);

    controller.select(&conversation_id).unwrap();
    let contents: Vec<&str> = controller.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["persist me", APOLOGY_MESSAGE]);

    let log_files: Vec<_> = std::fs::read_dir(temp.path().join("logs")).unwrap().collect();
    assert_eq!(log_files.len(), 1);
}

/// Memory backend whose transcript writes can be made to fail
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_transcripts: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if key.starts_with("chat_") && self.fail_transcripts.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key)
    }
}

#[tokio::test]
async fn failed_transcript_write_leaves_state_untouched() {
    let backend = Arc::new(FlakyStore::default());
    let store = SessionStore::new(Arc::clone(&backend));
    let mut controller = ConversationController::open(store, ScriptedResponder::default()).unwrap();

    controller.send_message("hello").await.unwrap();
    let id = controller.active_id().unwrap().to_string();

    backend.fail_transcripts.store(true, Ordering::SeqCst);
    assert!(controller.send_message("lost").await.is_err());

    let contents: Vec<&str> = controller.messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hello", "default"]);
    assert_eq!(controller.find(&id).unwrap().preview, "hello");
    assert_eq!(controller.status(), SendStatus::Idle);
    assert_eq!(controller.store().load_transcript(&id).unwrap().len(), 2);
}
