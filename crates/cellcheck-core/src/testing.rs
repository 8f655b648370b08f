//! Scripted provider for unit tests inside this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::{CompletionRequest, CompletionResponse, LlmProvider, ModelInfo, TokenUsage};

/// Replays queued responses in order, then repeats the fallback response.
pub(crate) struct ScriptedProvider {
    queue: Mutex<VecDeque<Option<String>>>,
    fallback: Option<String>,
    delay: Option<Duration>,
    calls: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub(crate) fn fixed(response: &str) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Some(response.to_string()),
            delay: None,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fallback: None,
            ..Self::fixed("")
        }
    }

    /// `None` entries fail that call.
    pub(crate) fn sequence(responses: Vec<Option<&str>>, fallback: Option<&str>) -> Self {
        Self {
            queue: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| r.map(str::to_string))
                    .collect(),
            ),
            fallback: fallback.map(str::to_string),
            ..Self::fixed("")
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            Some(content) => Ok(CompletionResponse {
                content,
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            }),
            None => Err(ProviderError::NetworkError("scripted failure".into()).into()),
        }
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }
}

/// Panics on the call numbered `panic_on` (1-based); answers with `response`
/// otherwise.
pub(crate) struct PanickingProvider {
    response: String,
    panic_on: u32,
    calls: AtomicU32,
}

impl PanickingProvider {
    pub(crate) fn new(response: &str, panic_on: u32) -> Self {
        Self {
            response: response.to_string(),
            panic_on,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for PanickingProvider {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.panic_on {
            panic!("provider crashed on call {call}");
        }
        Ok(CompletionResponse {
            content: self.response.clone(),
            model: request.model.clone(),
            token_usage: TokenUsage::default(),
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }
}
