use anyhow::Result;
use clap::{CommandFactory, Parser};

use intrachat::app::{run_command, run_repl_mode, run_stub_server};
use intrachat::{Cli, ClientConfig, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Some(shell) = cli.generate {
        let mut command = Cli::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        return Ok(());
    }

    intrachat_logging::init_tracing(cli.verbose);

    match cli.command.clone().unwrap_or(Commands::Chat) {
        Commands::Serve { bind, port } => run_stub_server(&bind, port).await,
        Commands::Chat => run_repl_mode(ClientConfig::from_cli(&cli)?).await,
        command => run_command(command, ClientConfig::from_cli(&cli)?).await,
    }
}
