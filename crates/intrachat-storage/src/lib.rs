//! Local persistence for conversations.
//!
//! Everything is stored as JSON strings in a [`KeyValueStore`]. The
//! [`SessionStore`] layers the conversation list, transcripts and exchange
//! history on top of whichever backend the caller injects.

pub mod error;
pub mod file_store;
pub mod kv;
pub mod session_store;

pub use error::{StorageError, StorageResult};
pub use file_store::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use session_store::{
    history_key, transcript_key, SessionStore, CONVERSATIONS_KEY, SELECTED_TOPIC_KEY,
};
