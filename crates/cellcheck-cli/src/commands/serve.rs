//! The `cellcheck serve` command.

use std::path::PathBuf;

use anyhow::Result;

use cellcheck_server::{CellcheckServer, ServerConfig};

pub async fn execute(bind: Option<String>, config_path: Option<PathBuf>, mock: bool) -> Result<()> {
    let config = super::load_config(config_path.as_deref(), mock)?;
    let engine = config.build_engine()?;

    let server_config = ServerConfig {
        bind: bind.unwrap_or_else(|| config.bind.clone()),
        session_ttl: config.session_ttl(),
    };
    eprintln!(
        "cellcheck {} | provider: {} | model: {} | {} questions in bank",
        env!("CARGO_PKG_VERSION"),
        engine.provider_name(),
        config.default_model,
        engine.bank().len()
    );

    CellcheckServer::new(server_config, engine).run().await?;
    Ok(())
}
