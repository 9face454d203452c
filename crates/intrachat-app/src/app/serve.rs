use anyhow::{Context, Result};
use std::net::SocketAddr;

use intrachat_server::{StubServer, StubServerConfig};

/// Run the API stub server until Ctrl-C
pub async fn run_stub_server(bind: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind, port))?;

    let server = StubServer::new(StubServerConfig { bind_addr: addr });
    server.start(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        // Without a signal handler keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down stub server");
}
