use serde::de::DeserializeOwned;
use serde::Serialize;

use intrachat_types::{seed_conversations, Conversation, ExchangeTurn, Message};

use crate::error::{StorageError, StorageResult};
use crate::kv::KeyValueStore;

/// Key holding the conversation list
pub const CONVERSATIONS_KEY: &str = "recentChats";

/// Key holding the id of the last welcome topic the user picked
pub const SELECTED_TOPIC_KEY: &str = "selectedTopic";

pub fn transcript_key(conversation_id: &str) -> String {
    format!("chat_{}", conversation_id)
}

pub fn history_key(conversation_id: &str) -> String {
    format!("history_{}", conversation_id)
}

/// Conversation list, transcripts and exchange history over a key-value backend.
pub struct SessionStore<S> {
    backend: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Persisted conversation list, newest first.
    ///
    /// On first run (no list stored yet) the two seed conversations are
    /// persisted and returned. A list that can't be parsed reads as empty.
    pub fn load_conversations(&self) -> StorageResult<Vec<Conversation>> {
        match self.backend.get(CONVERSATIONS_KEY)? {
            Some(raw) => Ok(parse_or_default(CONVERSATIONS_KEY, &raw)),
            None => {
                let seed = seed_conversations();
                self.save_conversations(&seed)?;
                tracing::info!(count = seed.len(), "Seeded conversation list");
                Ok(seed)
            }
        }
    }

    pub fn save_conversations(&self, conversations: &[Conversation]) -> StorageResult<()> {
        self.write_json(CONVERSATIONS_KEY, conversations)
    }

    /// Messages of a conversation; empty when nothing is stored.
    pub fn load_transcript(&self, conversation_id: &str) -> StorageResult<Vec<Message>> {
        self.read_json(&transcript_key(conversation_id))
    }

    pub fn save_transcript(&self, conversation_id: &str, messages: &[Message]) -> StorageResult<()> {
        self.write_json(&transcript_key(conversation_id), messages)
    }

    /// Exchange history of a conversation; empty when nothing is stored.
    pub fn load_history(&self, conversation_id: &str) -> StorageResult<Vec<ExchangeTurn>> {
        self.read_json(&history_key(conversation_id))
    }

    pub fn save_history(&self, conversation_id: &str, history: &[ExchangeTurn]) -> StorageResult<()> {
        self.write_json(&history_key(conversation_id), history)
    }

    /// Remove a conversation from the list and drop its transcript and
    /// history. Returns the remaining list.
    pub fn delete_conversation(&self, conversation_id: &str) -> StorageResult<Vec<Conversation>> {
        let mut conversations = self.load_conversations()?;
        conversations.retain(|conversation| conversation.id != conversation_id);
        self.save_conversations(&conversations)?;
        self.backend.delete(&transcript_key(conversation_id))?;
        self.backend.delete(&history_key(conversation_id))?;
        Ok(conversations)
    }

    pub fn save_selected_topic(&self, topic_id: &str) -> StorageResult<()> {
        self.backend.set(SELECTED_TOPIC_KEY, topic_id)
    }

    pub fn load_selected_topic(&self) -> StorageResult<Option<String>> {
        self.backend.get(SELECTED_TOPIC_KEY)
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> StorageResult<T> {
        Ok(match self.backend.get(key)? {
            Some(raw) => parse_or_default(key, &raw),
            None => T::default(),
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.backend.set(key, &json)
    }
}

fn parse_or_default<T: DeserializeOwned + Default>(key: &str, raw: &str) -> T {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed persisted value");
            T::default()
        }
    }
}
