//! Core types and structures for intrachat
//!
//! This crate provides the foundational types used across all intrachat crates:
//! conversations, transcript messages, exchange history and topics.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

// ============================================================================
// Constants
// ============================================================================

/// Maximum characters of the first message used as a synthesized title
pub const TITLE_MAX_CHARS: usize = 30;

/// Maximum characters of a message shown as a conversation preview
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Marker appended to a synthesized title that was cut short
pub const ELLIPSIS: &str = "...";

/// Preview of a conversation created explicitly before any message is sent
pub const NEW_CHAT_PREVIEW: &str = "Just started";

/// AI message appended when the remote responder could not be reached
pub const APOLOGY_MESSAGE: &str = "Sorry, I couldn't fetch the information. Please try again.";

/// AI message used when the responder answered with a shape we don't know
pub const FALLBACK_REPLY: &str = "Received response from server.";

/// Heading of a rendered topic list
pub const TOPICS_HEADER: &str = "Here are some topics:";

// ============================================================================
// Conversations
// ============================================================================

/// A named chat thread as shown in the conversation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub preview: String,
}

impl Conversation {
    /// Conversation created from the "new chat" action with a user supplied title
    pub fn named(title: &str) -> Self {
        Self {
            id: next_conversation_id(),
            title: title.trim().to_string(),
            preview: NEW_CHAT_PREVIEW.to_string(),
        }
    }

    /// Conversation synthesized from the first message sent without an active chat
    pub fn from_first_message(input: &str) -> Self {
        Self {
            id: next_conversation_id(),
            title: title_from_input(input),
            preview: preview_from_input(input),
        }
    }

    /// Case-insensitive substring match against title and preview.
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.preview.to_lowercase().contains(needle)
    }
}

/// The two conversations shown on first run
pub fn seed_conversations() -> Vec<Conversation> {
    vec![
        Conversation {
            id: "1".to_string(),
            title: "Quick access to your lates...".to_string(),
            preview: "Recent conversation".to_string(),
        },
        Conversation {
            id: "2".to_string(),
            title: "Pick up right where you le...".to_string(),
            preview: "Previous discussion".to_string(),
        },
    ]
}

static LAST_CONVERSATION_ID: AtomicI64 = AtomicI64::new(0);

/// Time-based conversation id (Unix milliseconds).
///
/// Ids handed out by one process are strictly increasing, so two conversations
/// created within the same millisecond still get distinct ids.
pub fn next_conversation_id() -> String {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_CONVERSATION_ID.load(Ordering::Relaxed);
    loop {
        let next = if now > last { now } else { last + 1 };
        match LAST_CONVERSATION_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(actual) => last = actual,
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Who wrote a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

/// One entry of a conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    /// ISO-8601 UTC timestamp
    pub timestamp: String,
}

impl Message {
    pub fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            sender,
            timestamp: now_iso8601(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Sender::User)
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(content, Sender::Ai)
    }
}

/// Current time in the `2024-05-01T12:30:00.123Z` form
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Exchange history
// ============================================================================

/// Speaker of an exchange history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

/// One turn of the context the chat endpoint echoes back and forth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeTurn {
    pub role: Role,
    pub content: String,
}

impl ExchangeTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: Role::Human, content: content.into() }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self { role: Role::Ai, content: content.into() }
    }
}

pub type ExchangeHistory = Vec<ExchangeTurn>;

// ============================================================================
// Topics
// ============================================================================

/// Topic entry returned by the topic lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Topic cards offered on an empty transcript
pub fn welcome_topics() -> Vec<Topic> {
    let topic = |id: &str, title: &str, description: &str| Topic {
        id: Some(id.to_string()),
        title: title.to_string(),
        description: description.to_string(),
    };
    vec![
        topic(
            "1",
            "Legal Insights",
            "Explore the latest updates and key discussions on legal topics today.",
        ),
        topic(
            "2",
            "Global Justice",
            "Discover important trends and changes shaping international law.",
        ),
        topic(
            "3",
            "Modern Law & Technology",
            "Explore the latest updates and key discussions on legal topics today.",
        ),
    ]
}

// ============================================================================
// Text helpers
// ============================================================================

/// First `max_chars` characters of `s`, never splitting a code point
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Title synthesized from the first message of an implicitly created conversation
pub fn title_from_input(input: &str) -> String {
    let mut title = truncate_chars(input, TITLE_MAX_CHARS);
    if input.chars().count() > TITLE_MAX_CHARS {
        title.push_str(ELLIPSIS);
    }
    title
}

pub fn preview_from_input(input: &str) -> String {
    truncate_chars(input, PREVIEW_MAX_CHARS)
}
