use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use std::path::Path;

use intrachat_chat::{render_transcript, ExportFormat, SendOutcome, SkipReason};
use intrachat_types::Conversation;

use crate::app::setup::{build_controller, AppController};
use crate::cli::Commands;
use crate::config::ClientConfig;
use crate::render;

/// Resolve a conversation reference: a 1-based index into the visible list,
/// or a conversation id.
pub fn resolve_conversation(controller: &AppController, reference: &str) -> Option<Conversation> {
    let reference = reference.trim();
    if let Some(conversation) = controller.find(reference) {
        return Some(conversation.clone());
    }
    let index: usize = reference.parse().ok()?;
    controller
        .visible_conversations()
        .get(index.checked_sub(1)?)
        .cloned()
}

fn require_conversation(controller: &AppController, reference: &str) -> Result<Conversation> {
    resolve_conversation(controller, reference)
        .ok_or_else(|| anyhow!("No conversation matches '{}'", reference))
}

/// Print what a send produced. Returns whether the responder call failed.
pub fn report_outcome(controller: &AppController, outcome: &SendOutcome) -> bool {
    match outcome {
        SendOutcome::Skipped(SkipReason::EmptyInput) => false,
        SendOutcome::Skipped(SkipReason::AlreadySending) => {
            println!("{}", "⏳ Still waiting for the previous reply".yellow());
            false
        }
        SendOutcome::Answered { conversation_id, created_conversation, reply } => {
            announce_created(controller, conversation_id, *created_conversation);
            render::print_message(reply);
            false
        }
        SendOutcome::Failed { conversation_id, created_conversation, reply, error } => {
            announce_created(controller, conversation_id, *created_conversation);
            render::print_message(reply);
            eprintln!("{} {}", "❌ Responder error:".bright_red(), error);
            true
        }
        SendOutcome::Discarded { .. } => false,
    }
}

fn announce_created(controller: &AppController, conversation_id: &str, created: bool) {
    if !created {
        return;
    }
    if let Some(conversation) = controller.find(conversation_id) {
        println!(
            "{}",
            format!("🆕 Started conversation '{}' ({})", conversation.title, conversation.id).bright_black()
        );
    }
}

/// Write a conversation's transcript to `path`, Markdown or HTML by extension
pub async fn export_conversation(controller: &AppController, conversation: &Conversation, path: &Path) -> Result<()> {
    let messages = controller.store().load_transcript(&conversation.id)?;
    let contents = render_transcript(ExportFormat::from_path(path), conversation, &messages);
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Run a one-shot subcommand against the persisted conversations
pub async fn run_command(command: Commands, config: ClientConfig) -> Result<()> {
    let mut controller = build_controller(&config).await?;
    let result = execute(&mut controller, command).await;
    controller.shutdown().await;
    result
}

async fn execute(controller: &mut AppController, command: Commands) -> Result<()> {
    match command {
        Commands::List { search } => {
            if let Some(query) = search.as_deref() {
                controller.search(query)?;
            }
            render::print_conversation_list(
                controller.visible_conversations(),
                None,
                controller.search_query(),
            );
        }

        Commands::Send { text, chat } => {
            if text.trim().is_empty() {
                bail!("Nothing to send");
            }
            if let Some(reference) = chat {
                let conversation = require_conversation(controller, &reference)?;
                controller.select(&conversation.id)?;
            }
            let outcome = controller.send_message(&text).await?;
            if report_outcome(controller, &outcome) {
                bail!("The responder could not be reached");
            }
        }

        Commands::Show { id } => {
            let conversation = require_conversation(controller, &id)?;
            let messages = controller.store().load_transcript(&conversation.id)?;
            render::print_transcript(&conversation, &messages);
        }

        Commands::Delete { id } => {
            let conversation = require_conversation(controller, &id)?;
            controller.delete(&conversation.id).await?;
            println!("{} Deleted '{}'", "🗑️".bright_green(), conversation.title);
        }

        Commands::Rename { id, title } => {
            let conversation = require_conversation(controller, &id)?;
            if !controller.rename(&conversation.id, &title)? {
                bail!("Title must not be empty");
            }
            println!("{} Renamed to '{}'", "✏️".bright_green(), title.trim());
        }

        Commands::Export { id, path } => {
            let conversation = require_conversation(controller, &id)?;
            export_conversation(controller, &conversation, &path).await?;
            println!("{} Exported '{}' to {}", "💾".bright_green(), conversation.title, path.display());
        }

        Commands::Chat | Commands::Serve { .. } => {
            bail!("Not a one-shot command");
        }
    }
    Ok(())
}
