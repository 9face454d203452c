use intrachat_logging::ConversationLogger;
use intrachat_responder::{RemoteReply, Responder, ResponderError};
use intrachat_storage::{KeyValueStore, SessionStore, StorageResult};
use intrachat_types::{preview_from_input, Conversation, ExchangeTurn, Message, APOLOGY_MESSAGE};

// ============================================================================
// Send state machine types
// ============================================================================

/// Which conversation a send goes to, decided before anything is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveConversation {
    Existing(String),
    New(Conversation),
}

impl ActiveConversation {
    pub fn id(&self) -> &str {
        match self {
            ActiveConversation::Existing(id) => id,
            ActiveConversation::New(conversation) => &conversation.id,
        }
    }
}

/// Precondition check of a send: reuse the active conversation or synthesize
/// one from the input.
pub fn ensure_conversation(active_id: Option<&str>, input: &str) -> ActiveConversation {
    match active_id {
        Some(id) => ActiveConversation::Existing(id.to_string()),
        None => ActiveConversation::New(Conversation::from_first_message(input)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendStatus {
    #[default]
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EmptyInput,
    AlreadySending,
}

/// A send that has been optimistically recorded and awaits its reply
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub conversation_id: String,
    pub created_conversation: bool,
    pub user_message: Message,
    /// Exchange history at the time of sending
    pub history: Vec<ExchangeTurn>,
}

#[derive(Debug)]
pub enum BeginSend {
    Skipped(SkipReason),
    Pending(PendingSend),
}

#[derive(Debug)]
pub enum SendOutcome {
    Skipped(SkipReason),
    Answered {
        conversation_id: String,
        created_conversation: bool,
        reply: Message,
    },
    /// The responder failed; the apology message was recorded instead.
    Failed {
        conversation_id: String,
        created_conversation: bool,
        reply: Message,
        error: ResponderError,
    },
    /// The conversation was deleted while its request was in flight.
    Discarded { conversation_id: String },
}

// ============================================================================
// Controller
// ============================================================================

/// In-memory chat state kept in step with the session store.
pub struct ConversationController<S, R> {
    store: SessionStore<S>,
    responder: R,
    logger: Option<ConversationLogger>,
    /// Full list, newest first; always equal to what is persisted
    conversations: Vec<Conversation>,
    /// Search view over `conversations`
    query: Option<String>,
    visible: Vec<Conversation>,
    active_id: Option<String>,
    messages: Vec<Message>,
    history: Vec<ExchangeTurn>,
    status: SendStatus,
}

impl<S: KeyValueStore, R: Responder> ConversationController<S, R> {
    /// Load the persisted conversation list (seeding it on first run).
    pub fn open(store: SessionStore<S>, responder: R) -> StorageResult<Self> {
        let conversations = store.load_conversations()?;
        Ok(Self {
            store,
            responder,
            logger: None,
            visible: conversations.clone(),
            conversations,
            query: None,
            active_id: None,
            messages: Vec::new(),
            history: Vec::new(),
            status: SendStatus::Idle,
        })
    }

    pub fn with_logger(mut self, logger: ConversationLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    /// Every conversation, newest first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Conversations matching the current search, or all of them
    pub fn visible_conversations(&self) -> &[Conversation] {
        &self.visible
    }

    pub fn search_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|conversation| conversation.id == id)
    }

    pub fn find(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|conversation| conversation.id == id)
    }

    /// Transcript of the active conversation
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn history(&self) -> &[ExchangeTurn] {
        &self.history
    }

    pub fn status(&self) -> SendStatus {
        self.status
    }

    // ------------------------------------------------------------------------
    // Conversation list actions
    // ------------------------------------------------------------------------

    /// Create a named conversation and make it active. Blank titles are ignored.
    pub async fn new_conversation(&mut self, title: &str) -> StorageResult<Option<Conversation>> {
        if title.trim().is_empty() {
            return Ok(None);
        }

        let conversation = Conversation::named(title);
        self.insert_conversation(conversation.clone())?;

        self.active_id = Some(conversation.id.clone());
        self.messages.clear();
        self.history.clear();
        self.store.save_transcript(&conversation.id, &self.messages)?;

        self.log_event(&conversation.id, "created").await;
        Ok(Some(conversation))
    }

    /// Make `id` the active conversation and load its transcript and history.
    ///
    /// An id missing from the list (deleted, or never created) leaves the
    /// controller at the no-conversation baseline and returns `false`.
    pub fn select(&mut self, id: &str) -> StorageResult<bool> {
        if self.find(id).is_none() {
            tracing::warn!(conversation_id = id, "Selected unknown conversation");
            self.deselect();
            return Ok(false);
        }

        let messages = self.store.load_transcript(id)?;
        let history = self.store.load_history(id)?;
        self.messages = messages;
        self.history = history;
        self.active_id = Some(id.to_string());
        tracing::info!(conversation_id = id, messages = self.messages.len(), "Selected conversation");
        Ok(true)
    }

    /// Return to the no-conversation baseline without deleting anything
    pub fn deselect(&mut self) {
        self.active_id = None;
        self.messages.clear();
        self.history.clear();
    }

    /// Delete a conversation with its transcript and history. Returns whether
    /// it was in the list.
    pub async fn delete(&mut self, id: &str) -> StorageResult<bool> {
        let existed = self.conversations.iter().any(|conversation| conversation.id == id);

        self.conversations = self.store.delete_conversation(id)?;
        self.refresh_visible();

        if self.active_id.as_deref() == Some(id) {
            self.deselect();
        }

        if existed {
            self.log_event(id, "deleted").await;
        }
        Ok(existed)
    }

    /// Filter the conversation list by case-insensitive substring on title and
    /// preview. Always filters the full persisted list; an empty query clears
    /// the filter.
    pub fn search(&mut self, query: &str) -> StorageResult<&[Conversation]> {
        let all = self.store.load_conversations()?;
        let query = query.trim();

        if query.is_empty() {
            self.query = None;
            self.visible = all;
        } else {
            let needle = query.to_lowercase();
            self.visible = all.into_iter().filter(|c| c.matches(&needle)).collect();
            self.query = Some(query.to_string());
        }
        Ok(self.visible.as_slice())
    }

    pub fn clear_search(&mut self) {
        self.query = None;
        self.visible = self.conversations.clone();
    }

    /// Change a conversation's title. Blank titles and unknown ids are ignored.
    pub fn rename(&mut self, id: &str, title: &str) -> StorageResult<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        conversation.title = title.to_string();
        self.store.save_conversations(&self.conversations)?;
        self.refresh_visible();
        Ok(true)
    }

    /// Remember which welcome topic card was picked
    pub fn select_topic(&mut self, topic_id: &str) -> StorageResult<()> {
        self.store.save_selected_topic(topic_id)
    }

    // ------------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------------

    /// Send `input` to the responder and record both sides of the exchange.
    pub async fn send_message(&mut self, input: &str) -> StorageResult<SendOutcome> {
        let pending = match self.begin_send(input).await? {
            BeginSend::Skipped(reason) => return Ok(SendOutcome::Skipped(reason)),
            BeginSend::Pending(pending) => pending,
        };

        let result = self
            .responder
            .respond(&pending.user_message.content, &pending.history)
            .await;

        self.complete_send(pending, result).await
    }

    /// First half of a send: ensure a conversation exists, append and persist
    /// the user's message, update the preview, and enter `Sending`.
    pub async fn begin_send(&mut self, input: &str) -> StorageResult<BeginSend> {
        if input.trim().is_empty() {
            return Ok(BeginSend::Skipped(SkipReason::EmptyInput));
        }
        if self.status == SendStatus::Sending {
            return Ok(BeginSend::Skipped(SkipReason::AlreadySending));
        }

        let target = ensure_conversation(self.active_id.as_deref(), input);
        let conversation_id = target.id().to_string();
        let created_conversation = matches!(target, ActiveConversation::New(_));

        if let ActiveConversation::New(conversation) = target {
            self.insert_conversation(conversation)?;
            self.active_id = Some(conversation_id.clone());
            self.messages.clear();
            self.history.clear();
            self.log_event(&conversation_id, "created").await;
        }

        let user_message = Message::user(input);
        let mut transcript = self.messages.clone();
        transcript.push(user_message.clone());
        self.store.save_transcript(&conversation_id, &transcript)?;
        self.messages = transcript;

        let preview = preview_from_input(input);
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == conversation_id) {
            conversation.preview = preview;
        }
        self.store.save_conversations(&self.conversations)?;
        self.refresh_visible();

        self.log_message(&conversation_id, &user_message).await;
        self.status = SendStatus::Sending;

        Ok(BeginSend::Pending(PendingSend {
            conversation_id,
            created_conversation,
            user_message,
            history: self.history.clone(),
        }))
    }

    /// Second half of a send: record the reply (or the apology) and return to
    /// `Idle`.
    pub async fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<RemoteReply, ResponderError>,
    ) -> StorageResult<SendOutcome> {
        self.status = SendStatus::Idle;
        let PendingSend { conversation_id, created_conversation, .. } = pending;

        if self.find(&conversation_id).is_none() {
            tracing::warn!(conversation_id = %conversation_id, "Dropping reply for deleted conversation");
            return Ok(SendOutcome::Discarded { conversation_id });
        }

        let (reply, new_history, error) = match result {
            Ok(remote) => {
                if let RemoteReply::Unrecognized(ref value) = remote {
                    tracing::warn!(%value, "Unrecognized responder reply");
                }
                let reply = Message::ai(remote.render());
                (reply, remote.history().cloned(), None)
            }
            Err(error) => {
                tracing::warn!(conversation_id = %conversation_id, error = %error, "Responder call failed");
                (Message::ai(APOLOGY_MESSAGE), None, Some(error))
            }
        };

        self.append_reply(&conversation_id, &reply, new_history)?;
        self.log_message(&conversation_id, &reply).await;

        Ok(match error {
            None => SendOutcome::Answered { conversation_id, created_conversation, reply },
            Some(error) => SendOutcome::Failed { conversation_id, created_conversation, reply, error },
        })
    }

    fn append_reply(
        &mut self,
        conversation_id: &str,
        reply: &Message,
        new_history: Option<Vec<ExchangeTurn>>,
    ) -> StorageResult<()> {
        if self.active_id.as_deref() == Some(conversation_id) {
            self.messages.push(reply.clone());
            self.store.save_transcript(conversation_id, &self.messages)?;
            if let Some(history) = new_history {
                self.history = history;
                self.store.save_history(conversation_id, &self.history)?;
            }
        } else {
            // The user switched conversations while the request was in flight
            let mut transcript = self.store.load_transcript(conversation_id)?;
            transcript.push(reply.clone());
            self.store.save_transcript(conversation_id, &transcript)?;
            if let Some(history) = new_history {
                self.store.save_history(conversation_id, &history)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn insert_conversation(&mut self, conversation: Conversation) -> StorageResult<()> {
        self.conversations.insert(0, conversation);
        self.store.save_conversations(&self.conversations)?;
        self.refresh_visible();
        Ok(())
    }

    /// Re-apply the current search to the full list
    fn refresh_visible(&mut self) {
        self.visible = match &self.query {
            Some(query) => {
                let needle = query.to_lowercase();
                self.conversations.iter().filter(|c| c.matches(&needle)).cloned().collect()
            }
            None => self.conversations.clone(),
        };
    }

    async fn log_message(&mut self, conversation_id: &str, message: &Message) {
        if let Some(logger) = &mut self.logger {
            logger.log_message(conversation_id, message).await;
        }
    }

    async fn log_event(&mut self, conversation_id: &str, event: &str) {
        if let Some(logger) = &mut self.logger {
            logger.log_event(conversation_id, event).await;
        }
    }

    /// Flush and close the conversation log
    pub async fn shutdown(&mut self) {
        if let Some(logger) = &mut self.logger {
            logger.shutdown().await;
        }
    }
}
