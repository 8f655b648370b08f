//! HTTP server module

mod api;
mod session;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use api::{CleanupRequest, CleanupResponse, HealthResponse, QuestionsQuery};
pub use session::{CandidateField, CreateSessionRequest, RespondRequest, ReportQuery};

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/questions", get(api::list_questions))
        .route("/cleanup", post(api::cleanup))
        .route("/session", post(session::create_session))
        .route("/session/:id", get(session::session_status))
        .route("/session/:id/start", post(session::start_session))
        .route("/session/:id/respond", post(session::respond))
        .route("/session/:id/report", get(session::get_report))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
