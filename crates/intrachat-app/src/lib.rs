// Library interface for intrachat - exposes the CLI, configuration and run modes

pub mod app;
pub mod cli;
pub mod config;
pub mod render;

pub use cli::{Cli, Commands};
pub use config::{normalize_api_url, ClientConfig};
