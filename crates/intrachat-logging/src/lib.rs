// Logging module - conversation, request and diagnostic logging
pub mod conversation_logger;
pub mod request_logger;

use tracing_subscriber::EnvFilter;

pub use conversation_logger::ConversationLogger;

pub use request_logger::{log_request, log_response};

/// Safely truncate a string to a maximum number of characters
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        // Reserve space for "..." suffix
        let trunc_chars = if max_chars >= 3 { max_chars - 3 } else { 0 };
        format!("{}...", s.chars().take(trunc_chars).collect::<String>())
    }
}

/// Install the global diagnostics subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or `info`
/// and above for our own crates when `verbose` is on.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "warn,intrachat=info,intrachat_chat=info,intrachat_storage=info,intrachat_responder=info,intrachat_server=info"
    } else {
        "warn,intrachat_server=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed (tests, embedding); that's fine.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
