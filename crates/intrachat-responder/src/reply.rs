use serde_json::Value;

use intrachat_types::{ExchangeHistory, Topic, FALLBACK_REPLY, TOPICS_HEADER};

/// Every response shape the remote responder is known to produce
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteReply {
    /// A bare string, either top-level or under `data`
    Text(String),
    /// A list of topics, either top-level or under `data`
    Topics(Vec<Topic>),
    /// Chat endpoint reply; `history` replaces the conversation's exchange
    /// history when present
    Exchange {
        ai_response: String,
        history: Option<ExchangeHistory>,
    },
    /// Anything else; kept for diagnostics
    Unrecognized(Value),
}

impl RemoteReply {
    /// Classify a decoded response body.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) => RemoteReply::Text(text),
            Value::Array(_) => Self::topics_or_unrecognized(value),
            Value::Object(mut map) => {
                if let Some(Value::String(ai_response)) = map.remove("ai_response") {
                    let history = map
                        .remove("new_chat_history")
                        .and_then(|raw| match serde_json::from_value::<ExchangeHistory>(raw) {
                            Ok(history) => Some(history),
                            Err(e) => {
                                tracing::warn!(error = %e, "Ignoring malformed new_chat_history");
                                None
                            }
                        });
                    return RemoteReply::Exchange { ai_response, history };
                }

                match map.remove("data") {
                    Some(Value::String(text)) => RemoteReply::Text(text),
                    Some(data @ Value::Array(_)) => Self::topics_or_unrecognized(data),
                    Some(other) => {
                        map.insert("data".to_string(), other);
                        RemoteReply::Unrecognized(Value::Object(map))
                    }
                    None => RemoteReply::Unrecognized(Value::Object(map)),
                }
            }
            other => RemoteReply::Unrecognized(other),
        }
    }

    fn topics_or_unrecognized(value: Value) -> Self {
        match serde_json::from_value::<Vec<Topic>>(value.clone()) {
            Ok(topics) => RemoteReply::Topics(topics),
            Err(_) => RemoteReply::Unrecognized(value),
        }
    }

    /// Text of the AI message this reply turns into.
    pub fn render(&self) -> String {
        match self {
            RemoteReply::Text(text) => text.trim().to_string(),
            RemoteReply::Topics(topics) => render_topics(topics),
            RemoteReply::Exchange { ai_response, .. } => ai_response.trim().to_string(),
            RemoteReply::Unrecognized(_) => FALLBACK_REPLY.to_string(),
        }
    }

    /// Replacement exchange history, if the reply carried one
    pub fn history(&self) -> Option<&ExchangeHistory> {
        match self {
            RemoteReply::Exchange { history, .. } => history.as_ref(),
            _ => None,
        }
    }
}

/// Numbered list of title and description, one blank line between entries
pub fn render_topics(topics: &[Topic]) -> String {
    let mut out = format!("{}\n\n", TOPICS_HEADER);
    for (index, topic) in topics.iter().enumerate() {
        out.push_str(&format!("{}. {}\n{}\n\n", index + 1, topic.title, topic.description));
    }
    out.trim().to_string()
}
