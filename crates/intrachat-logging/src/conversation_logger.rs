use chrono::Local;
use serde::Serialize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use intrachat_types::Message;

#[derive(Serialize)]
struct LogEntry<'a> {
    timestamp: String, // ISO‑8601 Local time
    role: &'a str,
    content: &'a str,
    conversation_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<&'a str>,
}

/// Append-only JSONL log of every message exchanged during one client run.
pub struct ConversationLogger {
    file_path: PathBuf,
    file: Option<tokio::fs::File>,
}

impl ConversationLogger {
    /// Create a new logger under `<data_dir>/logs`; the file name is based on
    /// the current local time.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let logs_dir = data_dir.join("logs");
        fs::create_dir_all(&logs_dir).await?;

        let now_local = Local::now();
        let filename = format!(
            "ichat-{}.jsonl",
            now_local.format("%Y-%m-%d-%H%M%S")
        );
        let file_path = logs_dir.join(filename);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await?;
        Ok(Self { file_path, file: Some(file) })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Append a transcript message.
    pub async fn log_message(&mut self, conversation_id: &str, message: &Message) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: message.sender.as_str(),
            content: &message.content,
            conversation_id,
            message_id: Some(&message.id),
        };
        self.write_entry(&entry).await;
    }

    /// Append a lifecycle event (conversation created, deleted, ...).
    pub async fn log_event(&mut self, conversation_id: &str, event: &str) {
        let entry = LogEntry {
            timestamp: Local::now().to_rfc3339(),
            role: "event",
            content: event,
            conversation_id,
            message_id: None,
        };
        self.write_entry(&entry).await;
    }

    async fn write_entry(&mut self, entry: &LogEntry<'_>) {
        if let Some(file) = &mut self.file {
            if let Ok(json) = serde_json::to_string(entry) {
                if let Err(e) = file.write_all(json.as_bytes()).await {
                    eprintln!("[Logging error] {}", e);
                } else if let Err(e) = file.write_all(b"\n").await {
                    eprintln!("[Logging error] {}", e);
                } else {
                    let _ = file.flush().await;
                }
            }
        }
    }

    /// Close the logger (explicit drop). Called on graceful shutdown.
    pub async fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.sync_all().await;
        }
    }
}
