use chrono::{DateTime, Local};
use colored::Colorize;

use intrachat_logging::safe_truncate;
use intrachat_types::{Conversation, Message, Sender, Topic};

/// Local wall-clock time (`HH:MM`) of an ISO-8601 timestamp; the raw value
/// when it doesn't parse.
pub fn format_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(time) => time.with_timezone(&Local).format("%H:%M").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

pub fn print_message(message: &Message) {
    let time = format!("[{}]", format_time(&message.timestamp)).bright_black();
    match message.sender {
        Sender::User => println!("{} {} {}", time, "You:".bright_green().bold(), message.content),
        Sender::Ai => println!("{} {} {}", time, "AI:".bright_cyan().bold(), message.content),
    }
}

pub fn print_transcript(conversation: &Conversation, messages: &[Message]) {
    println!("{}", format!("💬 {}", conversation.title).bright_cyan().bold());
    if messages.is_empty() {
        println!("{}", "  (no messages yet)".bright_black());
    }
    for message in messages {
        print_message(message);
    }
}

/// One list line: index, title, preview and id. The active entry is marked.
pub fn conversation_line(index: usize, conversation: &Conversation, active: bool) -> String {
    let marker = if active { "▶" } else { " " };
    format!(
        "{} {:>2}. {}  {}  ({})",
        marker,
        index,
        conversation.title,
        safe_truncate(&conversation.preview, 40),
        conversation.id
    )
}

pub fn print_conversation_list(conversations: &[Conversation], active_id: Option<&str>, query: Option<&str>) {
    match query {
        Some(query) => println!("{}", format!("🔎 Conversations matching '{}':", query).bright_cyan()),
        None => println!("{}", "📚 Recent conversations:".bright_cyan()),
    }

    if conversations.is_empty() {
        println!("{}", "  (none)".bright_black());
        return;
    }

    for (i, conversation) in conversations.iter().enumerate() {
        let active = active_id == Some(conversation.id.as_str());
        let line = conversation_line(i + 1, conversation, active);
        if active {
            println!("{}", line.bright_green());
        } else {
            println!("{}", line);
        }
    }
}

pub fn print_topics(topics: &[Topic]) {
    println!("{}", "✨ Pick a topic with /topic <n>, or just start typing:".bright_cyan());
    for (i, topic) in topics.iter().enumerate() {
        println!("  {}. {}", i + 1, topic.title.bold());
        if !topic.description.is_empty() {
            println!("     {}", topic.description.bright_black());
        }
    }
}

pub fn print_help() {
    println!("{}", "Commands:".bright_cyan().bold());
    let commands = [
        ("/new <title>", "start a named conversation"),
        ("/list", "show conversations (respects the current search)"),
        ("/open <n|id>", "switch to a conversation"),
        ("/close", "leave the current conversation"),
        ("/delete <n|id>", "delete a conversation"),
        ("/search [query]", "filter conversations; no query clears the filter"),
        ("/rename <n|id> <title>", "change a conversation's title"),
        ("/topics", "show the welcome topics"),
        ("/topic <n>", "pick a welcome topic"),
        ("/export <path>", "write the open conversation to .md or .html"),
        ("/help", "show this help"),
        ("/quit", "exit (also 'exit' or 'quit')"),
    ];
    for (command, description) in commands {
        println!("  {} {}", format!("{:<24}", command).bright_yellow(), description);
    }
}
