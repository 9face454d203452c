//! Conversation state and the send flow.
//!
//! [`ConversationController`] keeps the active conversation, its transcript
//! and exchange history in memory, mirrors every change into the session
//! store, and drives the single responder call per message.

pub mod canned;
pub mod controller;
pub mod export;

pub use canned::CannedResponder;
pub use controller::{
    ensure_conversation, ActiveConversation, BeginSend, ConversationController, PendingSend,
    SendOutcome, SendStatus, SkipReason,
};
pub use export::{render_transcript, ExportFormat};
