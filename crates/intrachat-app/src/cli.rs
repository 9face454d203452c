use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use intrachat_responder::{ResponderContract, DEFAULT_BASE_URL};

/// CLI arguments for intrachat
#[derive(Parser, Debug)]
#[command(name = "intrachat")]
#[command(about = "IntraChat - terminal chat client with locally persisted conversations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Base URL of the remote responder
    #[arg(long, env = "INTRACHAT_API_URL", default_value = DEFAULT_BASE_URL, value_name = "URL", global = true)]
    pub api_url: String,

    /// Request/response shape of the responder: 'topics' or 'chat'
    #[arg(long, env = "INTRACHAT_CONTRACT", default_value = "topics", value_parser = parse_contract, global = true)]
    pub contract: ResponderContract,

    /// Override the HTTP method used for the responder call
    #[arg(long, value_name = "METHOD", global = true)]
    pub method: Option<String>,

    /// Override the endpoint path appended to the API URL
    #[arg(long, value_name = "PATH", global = true)]
    pub endpoint: Option<String>,

    /// Give up on a responder call after this many seconds (no limit by default)
    #[arg(long, env = "INTRACHAT_TIMEOUT_SECS", value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Directory holding conversations and logs (default: ~/.intrachat)
    #[arg(long, env = "INTRACHAT_DATA_DIR", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Answer every message locally with TEXT instead of calling the responder
    #[arg(long, value_name = "TEXT", global = true)]
    pub offline: Option<String>,

    /// Don't write the JSONL conversation log
    #[arg(long, global = true)]
    pub no_log: bool,

    /// Print request/response details and enable info-level diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub generate: Option<Shell>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Run the API stub server
    Serve {
        /// Address to bind to
        #[arg(long, env = "INTRACHAT_BIND", default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },

    /// List conversations, newest first
    List {
        /// Only show conversations whose title or preview contains QUERY
        #[arg(long, value_name = "QUERY")]
        search: Option<String>,
    },

    /// Send one message and print the reply
    Send {
        /// Message text
        text: String,

        /// Continue this conversation instead of starting a new one
        #[arg(long, value_name = "ID")]
        chat: Option<String>,
    },

    /// Print a conversation's transcript
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a conversation with its transcript and history
    Delete {
        /// Conversation id
        id: String,
    },

    /// Change a conversation's title
    Rename {
        /// Conversation id
        id: String,
        /// New title
        title: String,
    },

    /// Write a transcript to a Markdown or HTML file (chosen by extension)
    Export {
        /// Conversation id
        id: String,
        /// Output file
        path: PathBuf,
    },
}

fn parse_contract(s: &str) -> Result<ResponderContract, String> {
    s.parse::<ResponderContract>().map_err(|e| e.to_string())
}
