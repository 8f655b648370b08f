//! cellcheck-providers: LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible chat APIs (Groq
//! and OpenAI) plus a mock, and loads the `cellcheck.toml` configuration
//! that wires a provider into the interview engine.

pub mod config;
pub mod error;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, CellcheckConfig, ProviderConfig};
pub use error::ProviderError;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
