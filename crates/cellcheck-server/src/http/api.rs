//! Service-level REST handlers

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use cellcheck_core::model::{Question, SkillCategory};

use crate::error::ApiError;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// LLM provider behind the gateway
    pub provider: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Number of sessions held in memory
    pub active_sessions: usize,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: state.engine.provider_name().to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_sessions: state.engine.store().len().await,
    })
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    pub category: Option<String>,
}

/// GET /questions
pub async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<Vec<Question>>, ApiError> {
    let category: Option<SkillCategory> = query
        .category
        .as_deref()
        .map(str::parse::<SkillCategory>)
        .transpose()
        .map_err(ApiError::bad_request)?;

    let questions = state
        .engine
        .bank()
        .questions()
        .iter()
        .filter(|q| category.map_or(true, |c| q.category == c))
        .cloned()
        .collect();
    Ok(Json(questions))
}

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    /// Evict completed sessions older than this; the configured TTL when absent
    #[serde(default)]
    pub older_than_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanupResponse {
    pub evicted: usize,
    pub remaining: usize,
}

/// POST /cleanup
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CleanupRequest>>,
) -> Json<CleanupResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let age = request
        .older_than_secs
        .map(Duration::from_secs)
        .unwrap_or(state.session_ttl);

    let evicted = state.engine.evict_completed(age).await;
    Json(CleanupResponse {
        evicted,
        remaining: state.engine.store().len().await,
    })
}
