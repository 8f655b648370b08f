//! Core trait definitions for LLM providers.
//!
//! The async `LlmProvider` trait is implemented by the `cellcheck-providers`
//! crate. Everything upstream of it treats provider output as untrusted text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that complete chat prompts.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "groq").
    fn name(&self) -> &str;

    /// Complete a prompt.
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse>;

    /// List known models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to complete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "llama-3.3-70b-versatile").
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Ask the provider for a JSON object response when it supports it.
    #[serde(default)]
    pub json_response: bool,
}

/// Response from a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually produced the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Default system prompt
// ---------------------------------------------------------------------------

/// Default system prompt for the interviewer persona.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert Excel interviewer conducting a professional skills assessment. Be precise, fair and concise.";

// ---------------------------------------------------------------------------
// JSON extraction
// ---------------------------------------------------------------------------

/// Locate a JSON object inside an LLM response.
///
/// Handles:
/// - A bare JSON object (the whole response parses)
/// - A fenced ```json``` or generic ``` block containing an object
/// - Prose around an object (outermost `{ ... }` span)
///
/// Returns `None` when no candidate parses as a JSON object.
pub fn extract_json_object(response: &str) -> Option<serde_json::Value> {
    let parse_object = |s: &str| {
        serde_json::from_str::<serde_json::Value>(s.trim())
            .ok()
            .filter(|v| v.is_object())
    };

    if let Some(v) = parse_object(response) {
        return Some(v);
    }

    let mut in_block = false;
    let mut current_block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && trimmed.starts_with("```") {
            in_block = true;
            current_block.clear();
            continue;
        }
        if in_block && trimmed == "```" {
            in_block = false;
            if let Some(v) = parse_object(&current_block) {
                return Some(v);
            }
            continue;
        }
        if in_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bare_object() {
        let v = extract_json_object(r#"{"score": 80, "feedback": "ok"}"#).unwrap();
        assert_eq!(v["score"], 80);
    }

    #[test]
    fn extract_fenced_block() {
        let input = r#"Here is my evaluation:

```json
{"score": 72, "feedback": "Solid"}
```

Hope that helps!"#;
        let v = extract_json_object(input).unwrap();
        assert_eq!(v["score"], 72);
    }

    #[test]
    fn extract_object_in_prose() {
        let input = "Sure. {\"score\": 55, \"feedback\": \"Partial\"} Let me know.";
        let v = extract_json_object(input).unwrap();
        assert_eq!(v["feedback"], "Partial");
    }

    #[test]
    fn extract_rejects_non_object() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        assert!(extract_json_object("85").is_none());
        assert!(extract_json_object("no json here").is_none());
    }

    #[test]
    fn extract_rejects_unbalanced() {
        assert!(extract_json_object("} score: 5 {").is_none());
        assert!(extract_json_object("{\"score\": 5").is_none());
    }
}
