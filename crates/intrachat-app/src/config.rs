use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use intrachat_responder::{Method, ResponderConfig};

use crate::cli::Cli;

/// Default location of persisted conversations and logs
pub const DEFAULT_DATA_DIR: &str = "~/.intrachat";

/// Client configuration derived from CLI arguments and environment
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub responder: ResponderConfig,
    /// May start with `~`; the file store expands it
    pub data_dir: PathBuf,
    pub ephemeral: bool,
    /// Answer locally with this text instead of calling the responder
    pub offline_reply: Option<String>,
    pub conversation_log: bool,
    pub verbose: bool,
}

impl ClientConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let method = match cli.method.as_deref() {
            Some(method) => Some(parse_method(method)?),
            None => None,
        };

        let responder = ResponderConfig {
            base_url: normalize_api_url(&cli.api_url),
            contract: cli.contract,
            method,
            path: cli.endpoint.clone(),
            timeout: cli.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs),
            verbose: cli.verbose,
        };

        Ok(Self {
            responder,
            data_dir: cli.data_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            ephemeral: cli.ephemeral,
            offline_reply: cli.offline.clone(),
            conversation_log: !cli.no_log,
            verbose: cli.verbose,
        })
    }
}

/// Trim whitespace and trailing slashes and default the scheme to `http://`.
pub fn normalize_api_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    }
}

fn parse_method(method: &str) -> Result<Method> {
    let upper = method.trim().to_uppercase();
    if upper.is_empty() {
        bail!("HTTP method must not be empty");
    }
    Ok(Method::from_bytes(upper.as_bytes())?)
}
