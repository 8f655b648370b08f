pub mod init;
pub mod interview;
pub mod questions;
pub mod render;
pub mod serve;

use std::path::Path;

use anyhow::Result;
use cellcheck_providers::{load_config_from, CellcheckConfig, ProviderConfig};

/// Load configuration, switching to the mock provider when asked.
pub(crate) fn load_config(path: Option<&Path>, mock: bool) -> Result<CellcheckConfig> {
    let mut config = load_config_from(path)?;
    if mock {
        config
            .providers
            .insert("mock".to_string(), ProviderConfig::Mock { response: None });
        config.default_provider = "mock".to_string();
    }
    Ok(config)
}
