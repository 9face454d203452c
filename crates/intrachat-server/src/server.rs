use anyhow::{Context, Result};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::{self, AppState};

/// Stub server configuration
#[derive(Debug, Clone)]
pub struct StubServerConfig {
    pub bind_addr: SocketAddr,
}

/// Stub server instance
pub struct StubServer {
    config: StubServerConfig,
}

impl StubServer {
    pub fn new(config: StubServerConfig) -> Self {
        Self { config }
    }

    /// Start the stub server and serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = routes::create_router(AppState::default())
            .layer(cors)
            .layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.config.bind_addr))?;
        let local_addr = listener.local_addr()?;

        tracing::info!(addr = %local_addr, "Stub server listening");
        println!("⚡️ Server is running on http://{}", local_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Stub server stopped");
        Ok(())
    }
}
