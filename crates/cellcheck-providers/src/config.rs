//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use cellcheck_core::bank::QuestionBank;
use cellcheck_core::engine::{EngineConfig, InterviewEngine};
use cellcheck_core::gateway::{GatewayConfig, LlmGateway};
use cellcheck_core::parser::load_bank;
use cellcheck_core::statistics::CategoryWeights;
use cellcheck_core::traits::LlmProvider;

use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Groq {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    /// Canned responses; no network access.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Groq {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Groq")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", response)
                .finish(),
        }
    }
}

/// Top-level cellcheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellcheckConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used by the gateway.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model passed to the provider.
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on a single LLM call.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Most questions a session may request.
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// Ask the model for a narrative summary in each report.
    #[serde(default = "default_narrative")]
    pub narrative: bool,
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Default age for evicting completed sessions.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Custom question bank; the built-in bank when unset.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
    /// Per-category weights for the overall score.
    #[serde(default)]
    pub weights: CategoryWeights,
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}
fn default_temperature() -> f64 {
    0.3
}
fn default_max_tokens() -> u32 {
    600
}
fn default_timeout() -> u64 {
    30
}
fn default_max_questions() -> usize {
    10
}
fn default_narrative() -> bool {
    true
}
fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_session_ttl() -> u64 {
    3600
}

impl Default for CellcheckConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_timeout(),
            max_questions: default_max_questions(),
            narrative: default_narrative(),
            bind: default_bind(),
            session_ttl_secs: default_session_ttl(),
            question_bank: None,
            weights: CategoryWeights::default(),
        }
    }
}

impl CellcheckConfig {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_questions: self.max_questions,
            weights: self.weights.clone(),
            narrative: self.narrative,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Instantiate the default provider.
    pub fn provider(&self) -> Result<Arc<dyn LlmProvider>> {
        let config = self.providers.get(&self.default_provider).with_context(|| {
            format!(
                "provider '{}' is not configured (set GROQ_API_KEY or add [providers.{}] to cellcheck.toml)",
                self.default_provider, self.default_provider
            )
        })?;
        Ok(Arc::from(create_provider(&self.default_provider, config)?))
    }

    /// The configured question bank, or the built-in one.
    pub fn question_bank(&self) -> Result<QuestionBank> {
        match &self.question_bank {
            Some(path) => load_bank(path),
            None => Ok(QuestionBank::builtin()),
        }
    }

    /// Wire provider, gateway, bank and engine together.
    pub fn build_engine(&self) -> Result<InterviewEngine> {
        let gateway = LlmGateway::new(self.provider()?, self.gateway_config());
        Ok(InterviewEngine::new(
            gateway,
            self.question_bank()?,
            self.engine_config(),
        ))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::Groq { api_key, base_url } => ProviderConfig::Groq {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `cellcheck.toml` in the current directory
/// 2. `~/.config/cellcheck/config.toml`
///
/// Environment variable overrides: `GROQ_API_KEY`, `CELLCHECK_OPENAI_KEY`, `PORT`.
pub fn load_config() -> Result<CellcheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CellcheckConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("cellcheck.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CellcheckConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CellcheckConfig::default(),
    };

    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Apply env var overrides and resolve `${VAR}` references.
fn apply_env_overrides(
    mut config: CellcheckConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<CellcheckConfig> {
    if let Some(key) = env("GROQ_API_KEY") {
        config
            .providers
            .entry("groq".into())
            .or_insert(ProviderConfig::Groq {
                api_key: String::new(),
                base_url: None,
            });
        if let Some(ProviderConfig::Groq { api_key, .. }) = config.providers.get_mut("groq") {
            *api_key = key;
        }
    }

    if let Some(key) = env("CELLCHECK_OPENAI_KEY") {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
            *api_key = key;
        }
    }

    if let Some(port) = env("PORT") {
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {port}"))?;
        let host = config
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.bind = format!("{host}:{port}");
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    if config.max_questions == 0 {
        anyhow::bail!("max_questions must be at least 1");
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("cellcheck"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::Groq { api_key, base_url } => {
            if api_key.is_empty() {
                anyhow::bail!("provider '{name}' has an empty api_key");
            }
            Ok(Box::new(OpenAiProvider::groq(api_key, base_url.clone())?))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            if api_key.is_empty() {
                anyhow::bail!("provider '{name}' has an empty api_key");
            }
            Ok(Box::new(OpenAiProvider::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )?))
        }
        ProviderConfig::Mock { response } => Ok(Box::new(match response {
            Some(r) => MockProvider::with_fixed_response(r),
            None => MockProvider::default(),
        })),
    }
}
