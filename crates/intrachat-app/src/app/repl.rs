use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use intrachat_logging::safe_truncate;
use intrachat_types::welcome_topics;

use crate::app::commands::{export_conversation, report_outcome, resolve_conversation};
use crate::app::setup::{build_controller, AppController};
use crate::config::ClientConfig;
use crate::render;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New(String),
    List,
    Open(String),
    Close,
    Delete(String),
    Search(Option<String>),
    Rename { reference: String, title: String },
    Topics,
    Topic(usize),
    Export(PathBuf),
    Help,
    Quit,
}

/// Parse a line starting with `/`. Errors carry a usage hint.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let body = line.strip_prefix('/').unwrap_or(line);
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    let required = |usage: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("Usage: {}", usage))
        } else {
            Ok(rest.to_string())
        }
    };

    match name {
        "new" => required("/new <title>").map(ReplCommand::New),
        "list" | "ls" => Ok(ReplCommand::List),
        "open" => required("/open <n|id>").map(ReplCommand::Open),
        "close" => Ok(ReplCommand::Close),
        "delete" | "rm" => required("/delete <n|id>").map(ReplCommand::Delete),
        "search" => Ok(ReplCommand::Search((!rest.is_empty()).then(|| rest.to_string()))),
        "rename" => {
            let usage = "Usage: /rename <n|id> <title>";
            let (reference, title) = rest.split_once(char::is_whitespace).ok_or(usage)?;
            let title = title.trim();
            if title.is_empty() {
                return Err(usage.to_string());
            }
            Ok(ReplCommand::Rename {
                reference: reference.to_string(),
                title: title.to_string(),
            })
        }
        "topics" => Ok(ReplCommand::Topics),
        "topic" => {
            let n = required("/topic <n>")?;
            n.parse::<usize>()
                .ok()
                .filter(|n| *n >= 1)
                .map(ReplCommand::Topic)
                .ok_or_else(|| "Usage: /topic <n>".to_string())
        }
        "export" => required("/export <path>").map(|path| ReplCommand::Export(PathBuf::from(path))),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("Unknown command '/{}'. Type /help for a list.", other)),
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Run interactive REPL mode
pub async fn run_repl_mode(config: ClientConfig) -> Result<()> {
    println!("{}", "💬 IntraChat".bright_cyan().bold());
    if config.offline_reply.is_some() {
        println!("{}", "Offline mode: replies are answered locally".bright_black());
    } else {
        println!(
            "{}",
            format!("Responder: {} {} ({})", config.responder.method(), config.responder.endpoint(), config.responder.contract)
                .bright_black()
        );
    }
    if config.ephemeral {
        println!("{}", "Ephemeral session: nothing will be saved".bright_black());
    } else {
        println!("{}", format!("Data directory: {}", config.data_dir.display()).bright_black());
    }
    println!("{}", "Type /help for commands, 'exit' or 'quit' to leave\n".bright_black());

    let mut controller = build_controller(&config).await?;
    let mut rl = DefaultEditor::new()?;

    render::print_conversation_list(controller.visible_conversations(), None, None);
    println!();
    render::print_topics(&welcome_topics());

    loop {
        let prompt = match controller.active_conversation() {
            Some(conversation) => format!("[{}] {} ", safe_truncate(&conversation.title, 24), "You:".bright_green().bold()),
            None => format!("{} ", "You:".bright_green().bold()),
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line == "exit" || line == "quit" {
                    break;
                }

                if line.starts_with('/') {
                    match parse_command(line) {
                        Ok(command) => match handle_command(&mut controller, command).await {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Quit) => break,
                            Err(e) => eprintln!("{} {}", "❌".bright_red(), e),
                        },
                        Err(usage) => eprintln!("{} {}", "💡".bright_yellow(), usage),
                    }
                    continue;
                }

                match controller.send_message(line).await {
                    Ok(outcome) => {
                        report_outcome(&controller, &outcome);
                    }
                    Err(e) => eprintln!("{} Failed to save conversation: {}", "❌".bright_red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{} {}", "❌ Input error:".bright_red(), err);
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_cyan());
    controller.shutdown().await;
    Ok(())
}

async fn handle_command(controller: &mut AppController, command: ReplCommand) -> Result<Flow> {
    match command {
        ReplCommand::New(title) => {
            if let Some(conversation) = controller.new_conversation(&title).await? {
                println!("{}", format!("🆕 Started '{}'", conversation.title).bright_green());
                render::print_topics(&welcome_topics());
            }
        }

        ReplCommand::List => {
            render::print_conversation_list(
                controller.visible_conversations(),
                controller.active_id(),
                controller.search_query(),
            );
        }

        ReplCommand::Open(reference) => match resolve_conversation(controller, &reference) {
            Some(conversation) => {
                controller.select(&conversation.id)?;
                render::print_transcript(&conversation, controller.messages());
                if controller.messages().is_empty() {
                    render::print_topics(&welcome_topics());
                }
            }
            None => eprintln!("{} No conversation matches '{}'", "❌".bright_red(), reference),
        },

        ReplCommand::Close => controller.deselect(),

        ReplCommand::Delete(reference) => match resolve_conversation(controller, &reference) {
            Some(conversation) => {
                controller.delete(&conversation.id).await?;
                println!("{} Deleted '{}'", "🗑️".bright_green(), conversation.title);
            }
            None => eprintln!("{} No conversation matches '{}'", "❌".bright_red(), reference),
        },

        ReplCommand::Search(query) => {
            match query {
                Some(query) => {
                    controller.search(&query)?;
                }
                None => controller.clear_search(),
            }
            render::print_conversation_list(
                controller.visible_conversations(),
                controller.active_id(),
                controller.search_query(),
            );
        }

        ReplCommand::Rename { reference, title } => match resolve_conversation(controller, &reference) {
            Some(conversation) => {
                if controller.rename(&conversation.id, &title)? {
                    println!("{} Renamed to '{}'", "✏️".bright_green(), title);
                }
            }
            None => eprintln!("{} No conversation matches '{}'", "❌".bright_red(), reference),
        },

        ReplCommand::Topics => render::print_topics(&welcome_topics()),

        ReplCommand::Topic(n) => {
            let topics = welcome_topics();
            match topics.get(n - 1) {
                Some(topic) => {
                    let topic_id = topic.id.clone().unwrap_or_else(|| n.to_string());
                    controller.select_topic(&topic_id)?;
                    println!("{}", format!("📌 Topic selected: {}", topic.title).bright_green());
                }
                None => eprintln!("{} There are only {} topics", "💡".bright_yellow(), topics.len()),
            }
        }

        ReplCommand::Export(path) => match controller.active_conversation().cloned() {
            Some(conversation) => {
                export_conversation(controller, &conversation, &path).await?;
                println!("{} Exported to {}", "💾".bright_green(), path.display());
            }
            None => eprintln!("{} Open a conversation first", "💡".bright_yellow()),
        },

        ReplCommand::Help => render::print_help(),

        ReplCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_command("/new  Weekly sync "), Ok(ReplCommand::New("Weekly sync".into())));
        assert_eq!(parse_command("/open 2"), Ok(ReplCommand::Open("2".into())));
        assert_eq!(
            parse_command("/rename 3 Budget review"),
            Ok(ReplCommand::Rename { reference: "3".into(), title: "Budget review".into() })
        );
        assert_eq!(parse_command("/topic 1"), Ok(ReplCommand::Topic(1)));
        assert_eq!(parse_command("/export notes.md"), Ok(ReplCommand::Export(PathBuf::from("notes.md"))));
    }

    #[test]
    fn search_without_query_clears() {
        assert_eq!(parse_command("/search"), Ok(ReplCommand::Search(None)));
        assert_eq!(parse_command("/search Legal"), Ok(ReplCommand::Search(Some("Legal".into()))));
    }

    #[test]
    fn missing_arguments_give_usage() {
        assert_eq!(parse_command("/new"), Err("Usage: /new <title>".to_string()));
        assert!(parse_command("/rename 3").is_err());
        assert!(parse_command("/topic zero").is_err());
        assert!(parse_command("/topic 0").is_err());
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = parse_command("/frobnicate").unwrap_err();
        assert!(err.contains("/frobnicate"));
    }

    #[test]
    fn aliases() {
        assert_eq!(parse_command("/ls"), Ok(ReplCommand::List));
        assert_eq!(parse_command("/exit"), Ok(ReplCommand::Quit));
        assert_eq!(parse_command("/?"), Ok(ReplCommand::Help));
    }
}
