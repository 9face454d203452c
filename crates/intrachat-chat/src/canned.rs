use async_trait::async_trait;

use intrachat_responder::{RemoteReply, Responder, ResponderError};
use intrachat_types::ExchangeTurn;

/// Offline responder that answers every message with the same text.
pub struct CannedResponder {
    text: String,
}

impl CannedResponder {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, _text: &str, _history: &[ExchangeTurn]) -> Result<RemoteReply, ResponderError> {
        Ok(RemoteReply::Text(self.text.clone()))
    }
}
