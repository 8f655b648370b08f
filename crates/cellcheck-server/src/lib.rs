//! cellcheck-server: HTTP API for interview sessions.
//!
//! Wraps an [`InterviewEngine`] in an axum router. The engine and its
//! sessions live in memory for the lifetime of the process.

mod error;
pub mod http;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use cellcheck_core::InterviewEngine;

pub use error::{ApiError, ErrorResponse, ServerError};
pub use http::create_router;
pub use state::AppState;

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, e.g. `0.0.0.0:8000`
    pub bind: String,
    /// Default age for evicting completed sessions via `/cleanup`
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            session_ttl: Duration::from_secs(3600),
        }
    }
}

/// The cellcheck HTTP server
pub struct CellcheckServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl CellcheckServer {
    pub fn new(config: ServerConfig, engine: InterviewEngine) -> Self {
        let state = Arc::new(AppState::new(engine, config.session_ttl));
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server until ctrl-c
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind.clone();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!(
            provider = %self.state.engine.provider_name(),
            "cellcheck server listening on {}",
            addr
        );

        let router = create_router(self.state);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("cellcheck server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
