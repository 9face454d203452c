use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::ResponderError;

/// Default responder base URL (the bundled stub server)
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Which request/response shape the remote endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderContract {
    /// `GET /api/topics` answering `{"data": "<text>" | [topics]}`
    #[default]
    Topics,
    /// `POST /chat` with `{user_input, chat_history}` answering
    /// `{ai_response, new_chat_history}`
    Chat,
}

impl ResponderContract {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponderContract::Topics => "topics",
            ResponderContract::Chat => "chat",
        }
    }

    pub fn default_method(&self) -> Method {
        match self {
            ResponderContract::Topics => Method::GET,
            ResponderContract::Chat => Method::POST,
        }
    }

    pub fn default_path(&self) -> &'static str {
        match self {
            ResponderContract::Topics => "/api/topics",
            ResponderContract::Chat => "/chat",
        }
    }
}

impl fmt::Display for ResponderContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponderContract {
    type Err = ResponderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "topics" | "topic" => Ok(ResponderContract::Topics),
            "chat" => Ok(ResponderContract::Chat),
            other => Err(ResponderError::Config(format!(
                "unknown contract '{}' (expected 'topics' or 'chat')",
                other
            ))),
        }
    }
}

/// Where and how to reach the remote responder
#[derive(Debug, Clone)]
pub struct ResponderConfig {
    pub base_url: String,
    pub contract: ResponderContract,
    /// Overrides the contract's default method
    pub method: Option<Method>,
    /// Overrides the contract's default path
    pub path: Option<String>,
    /// No timeout when unset; a hanging request keeps the send pending
    pub timeout: Option<Duration>,
    /// Print request/response details to the console
    pub verbose: bool,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            contract: ResponderContract::default(),
            method: None,
            path: None,
            timeout: None,
            verbose: false,
        }
    }
}

impl ResponderConfig {
    pub fn new(base_url: impl Into<String>, contract: ResponderContract) -> Self {
        Self {
            base_url: base_url.into(),
            contract,
            ..Self::default()
        }
    }

    pub fn method(&self) -> Method {
        self.method.clone().unwrap_or_else(|| self.contract.default_method())
    }

    /// Full endpoint URL: base URL without trailing slash plus the path.
    pub fn endpoint(&self) -> String {
        let path = self.path.as_deref().unwrap_or_else(|| self.contract.default_path());
        let base = self.base_url.trim_end_matches('/');
        if path.is_empty() {
            base.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}
