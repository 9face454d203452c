use anyhow::{Context, Result};
use colored::Colorize;

use intrachat_chat::{CannedResponder, ConversationController};
use intrachat_logging::ConversationLogger;
use intrachat_responder::{HttpResponder, Responder};
use intrachat_storage::{FileStore, KeyValueStore, MemoryStore, SessionStore};

use crate::config::ClientConfig;

/// Controller with the backend and responder chosen at runtime
pub type AppController = ConversationController<Box<dyn KeyValueStore>, Box<dyn Responder>>;

pub fn build_responder(config: &ClientConfig) -> Result<Box<dyn Responder>> {
    match &config.offline_reply {
        Some(text) => Ok(Box::new(CannedResponder::new(text.clone()))),
        None => {
            let responder = HttpResponder::new(config.responder.clone())
                .context("Failed to create HTTP client")?;
            Ok(Box::new(responder))
        }
    }
}

/// Open the session store, load the conversation list and attach the
/// conversation log.
pub async fn build_controller(config: &ClientConfig) -> Result<AppController> {
    let responder = build_responder(config)?;

    if config.ephemeral {
        let backend: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        return Ok(ConversationController::open(SessionStore::new(backend), responder)?);
    }

    let file_store = FileStore::new(&config.data_dir)
        .with_context(|| format!("Failed to open data directory {}", config.data_dir.display()))?;
    let data_dir = file_store.data_dir().to_path_buf();

    let backend: Box<dyn KeyValueStore> = Box::new(file_store);
    let controller = ConversationController::open(SessionStore::new(backend), responder)
        .context("Failed to load conversations")?;

    if !config.conversation_log {
        return Ok(controller);
    }

    match ConversationLogger::new(&data_dir).await {
        Ok(logger) => {
            tracing::info!(path = %logger.file_path().display(), "Conversation log opened");
            Ok(controller.with_logger(logger))
        }
        Err(e) => {
            eprintln!("{} Conversation logging disabled: {}", "⚠️".yellow(), e);
            Ok(controller)
        }
    }
}
