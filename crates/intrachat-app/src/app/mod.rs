pub mod commands;
pub mod repl;
pub mod serve;
pub mod setup;

pub use commands::run_command;
pub use repl::run_repl_mode;
pub use serve::run_stub_server;
pub use setup::{build_controller, AppController};
