use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use intrachat_logging::{log_request, log_response};
use intrachat_types::ExchangeTurn;

use crate::config::{ResponderConfig, ResponderContract};
use crate::error::ResponderError;
use crate::reply::RemoteReply;

/// Anything that can answer a user's message.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Issue exactly one request for `text`. `history` is the conversation's
    /// current exchange history; contracts that don't use it ignore it.
    async fn respond(&self, text: &str, history: &[ExchangeTurn]) -> Result<RemoteReply, ResponderError>;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Box<T> {
    async fn respond(&self, text: &str, history: &[ExchangeTurn]) -> Result<RemoteReply, ResponderError> {
        (**self).respond(text, history).await
    }
}

/// Responder reached over HTTP
pub struct HttpResponder {
    config: ResponderConfig,
    client: reqwest::Client,
}

impl HttpResponder {
    pub fn new(config: ResponderConfig) -> Result<Self, ResponderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ResponderError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    fn request_body(&self, text: &str, history: &[ExchangeTurn]) -> Option<Value> {
        match self.config.contract {
            ResponderContract::Chat => Some(json!({
                "user_input": text,
                "chat_history": history,
            })),
            // The topic lookup takes no input; only send one if the method allows a body
            ResponderContract::Topics => {
                if self.config.method() == Method::GET {
                    None
                } else {
                    Some(json!({ "text": text }))
                }
            }
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn respond(&self, text: &str, history: &[ExchangeTurn]) -> Result<RemoteReply, ResponderError> {
        let url = self.config.endpoint();
        let method = self.config.method();
        let body = self.request_body(text, history);

        log_request(&method, &url, body.as_ref(), self.config.verbose);
        tracing::info!(%method, %url, contract = %self.config.contract, "Calling responder");

        let mut request = self.client.request(method, &url);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ResponderError::Http {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let response_text = response.text().await.map_err(|source| ResponderError::Http {
            url: url.clone(),
            source,
        })?;

        log_response(&status, &headers, &response_text, self.config.verbose);

        if !status.is_success() {
            return Err(ResponderError::Status {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let value: Value = serde_json::from_str(&response_text)?;
        Ok(RemoteReply::from_value(value))
    }
}
