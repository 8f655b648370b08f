//! Shared application state for the cellcheck server

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cellcheck_core::InterviewEngine;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The interview engine owning all sessions
    pub engine: Arc<InterviewEngine>,
    /// Default age for `/cleanup`
    pub session_ttl: Duration,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: InterviewEngine, session_ttl: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            session_ttl,
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
