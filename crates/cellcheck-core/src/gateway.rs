//! Timeout-bounded gateway in front of an `LlmProvider`.
//!
//! Every failure mode of the upstream call (timeout, transport error, HTTP
//! error, empty body) collapses into `GatewayError::UpstreamUnavailable`.
//! Callers must have a fallback path.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::error::{GatewayError, ProviderError};
use crate::traits::{CompletionRequest, LlmProvider};

/// Settings applied to every gateway call.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Max tokens per completion.
    pub max_tokens: u32,
    /// Upper bound on a single upstream call.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            temperature: 0.3,
            max_tokens: 600,
            timeout: Duration::from_secs(30),
        }
    }
}

/// The gateway: one provider plus call settings.
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    config: GatewayConfig,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Complete `prompt` under the given system `context`, returning text.
    pub async fn complete(&self, prompt: &str, context: &str) -> Result<String, GatewayError> {
        self.call(prompt, context, false).await
    }

    /// Like [`complete`](Self::complete) but asks the provider for a JSON object.
    pub async fn complete_json(&self, prompt: &str, context: &str) -> Result<String, GatewayError> {
        self.call(prompt, context, true).await
    }

    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.config.model))]
    async fn call(&self, prompt: &str, context: &str, json: bool) -> Result<String, GatewayError> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            system_prompt: Some(context.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            json_response: json,
        };

        let response = tokio::time::timeout(self.config.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| {
                GatewayError::upstream(format!(
                    "timed out after {}ms",
                    self.config.timeout.as_millis()
                ))
            })?
            .map_err(|e| match e.downcast_ref::<ProviderError>() {
                Some(p) if p.is_permanent() => {
                    tracing::error!("permanent provider failure: {p}");
                    GatewayError::upstream(p.to_string())
                }
                _ => GatewayError::upstream(format!("{e:#}")),
            })?;

        if response.content.trim().is_empty() {
            return Err(GatewayError::upstream("empty completion"));
        }

        tracing::debug!(
            latency_ms = response.latency_ms,
            tokens = response.token_usage.total_tokens,
            "completion received"
        );
        Ok(response.content)
    }
}
