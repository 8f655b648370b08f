//! Interview session endpoints

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use cellcheck_core::model::{Candidate, Phase, Question};
use cellcheck_core::session::SessionStatus;
use cellcheck_core::AnswerOutcome;
use cellcheck_report::Format;

use crate::error::ApiError;
use crate::state::AppState;

/// A candidate given either as a bare name or as a full record
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CandidateField {
    Name(String),
    Details(Candidate),
}

impl From<CandidateField> for Candidate {
    fn from(field: CandidateField) -> Self {
        match field {
            CandidateField::Name(name) => Candidate::named(name),
            CandidateField::Details(candidate) => candidate,
        }
    }
}

/// Body of POST /session
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub candidate: CandidateField,
    #[serde(default = "default_category")]
    pub skill_category: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_question_count")]
    pub question_count: i64,
}

fn default_category() -> String {
    "formulas".to_string()
}
fn default_difficulty() -> String {
    "medium".to_string()
}
fn default_question_count() -> i64 {
    5
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub phase: Phase,
    pub total_questions: usize,
}

/// POST /session
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let created = state
        .engine
        .create_session(
            request.candidate.into(),
            &request.skill_category,
            &request.difficulty,
            request.question_count,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: created.session_id,
            phase: created.phase,
            total_questions: created.total_questions,
        }),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub phase: Phase,
    pub question: Question,
    pub question_number: usize,
    pub total_questions: usize,
}

/// POST /session/:id/start
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let prompt = state.engine.start_session(&id).await?;
    Ok(Json(StartSessionResponse {
        session_id: prompt.session_id,
        phase: Phase::Questioning,
        question: prompt.question,
        question_number: prompt.number,
        total_questions: prompt.total,
    }))
}

/// Body of POST /session/:id/respond
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub answer: String,
    /// Zero-based index of the question being answered
    #[serde(default)]
    pub question_index: Option<usize>,
}

/// POST /session/:id/respond
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<AnswerOutcome>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .engine
        .submit_answer(&id, request.answer, request.question_index)
        .await?;
    Ok(Json(outcome))
}

/// Query params for the report endpoint
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

/// GET /session/:id/report
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let format: Format = query
        .format
        .as_deref()
        .unwrap_or("json")
        .parse()
        .map_err(ApiError::bad_request)?;

    let report = state.engine.get_report(&id).await?;

    Ok(match format {
        Format::Json => Json(report).into_response(),
        Format::Html => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            cellcheck_report::generate_html(&report),
        )
            .into_response(),
        Format::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            cellcheck_report::generate_markdown(&report),
        )
            .into_response(),
    })
}

/// GET /session/:id
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatus>, ApiError> {
    Ok(Json(state.engine.status(&id).await?))
}
