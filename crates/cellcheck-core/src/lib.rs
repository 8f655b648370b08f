//! cellcheck-core: Interview engine, session state machine, and scoring.
//!
//! This crate defines the question bank, the LLM gateway seam, answer
//! evaluation, report aggregation, and the engine that drives interview
//! sessions. Provider implementations live in `cellcheck-providers`.

pub mod bank;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod gateway;
pub mod model;
pub mod parser;
pub mod report;
pub mod session;
pub mod statistics;
pub mod store;
pub mod traits;

#[cfg(test)]
mod testing;

pub use engine::{AnswerOutcome, EngineConfig, InterviewEngine, QuestionPrompt, SessionCreated};
pub use error::{AssessmentError, GatewayError, ProviderError};
pub use gateway::{GatewayConfig, LlmGateway};
pub use report::Report;
