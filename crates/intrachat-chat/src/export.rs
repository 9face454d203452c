use std::path::Path;

use pulldown_cmark::{html, Options, Parser};

use intrachat_types::{Conversation, Message, Sender};

/// Output format of a transcript export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Html,
}

impl ExportFormat {
    /// `.html`/`.htm` export HTML, everything else Markdown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_lowercase()) {
            Some(ext) if ext == "html" || ext == "htm" => ExportFormat::Html,
            _ => ExportFormat::Markdown,
        }
    }
}

pub fn render_transcript(format: ExportFormat, conversation: &Conversation, messages: &[Message]) -> String {
    match format {
        ExportFormat::Markdown => render_transcript_markdown(conversation, messages),
        ExportFormat::Html => render_transcript_html(conversation, messages),
    }
}

fn speaker(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Ai => "AI",
    }
}

pub fn render_transcript_markdown(conversation: &Conversation, messages: &[Message]) -> String {
    let mut out = format!("# {}\n\n", conversation.title);
    if messages.is_empty() {
        out.push_str("_No messages yet._\n");
    }
    for message in messages {
        out.push_str(&format!(
            "**{}** · {}\n\n{}\n\n",
            speaker(message.sender),
            message.timestamp,
            message.content
        ));
    }
    out
}

pub fn render_transcript_html(conversation: &Conversation, messages: &[Message]) -> String {
    let mut body = String::new();
    for message in messages {
        // AI replies are rendered as markdown, user text is shown verbatim
        let content = render_message_content(&message.content, message.sender == Sender::Ai);
        body.push_str(&format!(
            "<div class=\"message {}\">\n<div class=\"meta\">{} · {}</div>\n<div class=\"content\">{}</div>\n</div>\n",
            message.sender.as_str(),
            speaker(message.sender),
            escape_html(&message.timestamp),
            content
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = escape_html(&conversation.title),
        body = body
    )
}

/// Render markdown to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Render a message with markdown support
pub fn render_message_content(content: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(content)
    } else {
        escape_html(content).replace('\n', "<br>")
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
