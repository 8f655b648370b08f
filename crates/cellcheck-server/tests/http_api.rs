//! End-to-end tests of the HTTP surface against a mock provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};

use cellcheck_core::bank::QuestionBank;
use cellcheck_core::gateway::{GatewayConfig, LlmGateway};
use cellcheck_core::{EngineConfig, InterviewEngine};
use cellcheck_providers::MockProvider;
use cellcheck_server::{create_router, AppState};

fn server_with(provider: MockProvider, config: EngineConfig) -> TestServer {
    let gateway = LlmGateway::new(Arc::new(provider), GatewayConfig::default());
    let engine = InterviewEngine::new(gateway, QuestionBank::builtin(), config);
    let state = Arc::new(AppState::new(engine, Duration::from_secs(3600)));
    TestServer::new(create_router(state)).unwrap()
}

fn server() -> TestServer {
    server_with(MockProvider::default(), EngineConfig::default())
}

async fn create(server: &TestServer, count: i64) -> String {
    let response = server
        .post("/session")
        .json(&json!({
            "candidate": "Ada",
            "skill_category": "formulas",
            "difficulty": "medium",
            "question_count": count
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["phase"], "init");
    body["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_provider() {
    let server = server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "mock");
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn full_interview_over_http() {
    let mut responses = HashMap::new();
    responses.insert("Candidate's response: first".to_string(), r#"{"score": 90, "feedback": "Great"}"#.to_string());
    responses.insert("Candidate's response: second".to_string(), r#"{"score": 60, "feedback": "Fine"}"#.to_string());
    responses.insert("Candidate's response: third".to_string(), r#"{"score": 45, "feedback": "Weak"}"#.to_string());
    let server = server_with(MockProvider::new(responses), EngineConfig::default());
    let id = create(&server, 3).await;

    let early = server.get(&format!("/session/{id}/report")).await;
    early.assert_status(StatusCode::CONFLICT);
    assert_eq!(early.json::<Value>()["code"], "not_ready");

    let started = server.post(&format!("/session/{id}/start")).await;
    started.assert_status_ok();
    let body: Value = started.json();
    assert_eq!(body["phase"], "questioning");
    assert_eq!(body["question_number"], 1);
    assert_eq!(body["total_questions"], 3);

    let r1 = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "first", "question_index": 0}))
        .await;
    r1.assert_status_ok();
    let body: Value = r1.json();
    assert_eq!(body["phase"], "questioning");
    assert_eq!(body["evaluation"]["score"], 90.0);
    assert_eq!(body["number"], 2);

    server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "second", "question_index": 1}))
        .await
        .assert_status_ok();

    let r3 = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "third", "question_index": 2}))
        .await;
    r3.assert_status_ok();
    let body: Value = r3.json();
    assert_eq!(body["phase"], "completed");
    assert_eq!(body["report"]["overall_score"], 65.0);
    assert_eq!(body["report"]["proficiency"], "Intermediate");

    let report = server.get(&format!("/session/{id}/report")).await;
    report.assert_status_ok();
    let again: Value = report.json();
    assert_eq!(again["id"], body["report"]["id"]);
    assert!(again["narrative"].is_string());

    let status: Value = server.get(&format!("/session/{id}")).await.json();
    assert_eq!(status["phase"], "completed");
    assert_eq!(status["answered"], 3);
}

#[tokio::test]
async fn report_formats() {
    let server = server_with(
        MockProvider::default(),
        EngineConfig {
            narrative: false,
            ..EngineConfig::default()
        },
    );
    let id = create(&server, 1).await;
    server.post(&format!("/session/{id}/start")).await.assert_status_ok();
    server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "Use absolute references like $A$1"}))
        .await
        .assert_status_ok();

    let html = server
        .get(&format!("/session/{id}/report"))
        .add_query_param("format", "html")
        .await;
    html.assert_status_ok();
    assert!(html.text().contains("<html"));

    let md = server
        .get(&format!("/session/{id}/report"))
        .add_query_param("format", "markdown")
        .await;
    md.assert_status_ok();
    assert!(md.text().starts_with("# Excel assessment: Ada"));

    let bad = server
        .get(&format!("/session/{id}/report"))
        .add_query_param("format", "pdf")
        .await;
    bad.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_creation_is_bad_request() {
    let server = server();
    for body in [
        json!({"candidate": "Ada", "question_count": 0}),
        json!({"candidate": "Ada", "question_count": -1}),
        json!({"candidate": "Ada", "skill_category": "knitting"}),
        json!({"candidate": {"name": "Ada", "email": "ada@example.com"}, "question_count": 50}),
    ] {
        let response = server.post("/session").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "invalid_configuration");
    }
}

#[tokio::test]
async fn malformed_bodies_use_error_shape() {
    let server = server();

    let syntax = server
        .post("/session")
        .bytes(Bytes::from_static(b"{\"candidate\": "))
        .content_type("application/json")
        .await;
    syntax.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = syntax.json();
    assert_eq!(body["code"], "invalid_request");
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));

    let untyped = server.post("/session").text("candidate=Ada").await;
    untyped.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(untyped.json::<Value>()["code"], "invalid_request");

    let id = create(&server, 1).await;
    server.post(&format!("/session/{id}/start")).await.assert_status_ok();
    let wrong_type = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": 42}))
        .await;
    wrong_type.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.json::<Value>()["code"], "invalid_request");

    let status: Value = server.get(&format!("/session/{id}")).await.json();
    assert_eq!(status["answered"], 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let server = server();
    let response = server.post("/session/does-not-exist/start").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "not_found");

    server
        .get("/session/does-not-exist/report")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_order_calls_conflict() {
    let server = server();
    let id = create(&server, 2).await;

    let early = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "too soon"}))
        .await;
    early.assert_status(StatusCode::CONFLICT);
    assert_eq!(early.json::<Value>()["code"], "invalid_state");

    server.post(&format!("/session/{id}/start")).await.assert_status_ok();
    server
        .post(&format!("/session/{id}/start"))
        .await
        .assert_status(StatusCode::CONFLICT);

    server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "an answer", "question_index": 0}))
        .await
        .assert_status_ok();
    let retry = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "an answer", "question_index": 0}))
        .await;
    retry.assert_status(StatusCode::CONFLICT);

    let status: Value = server.get(&format!("/session/{id}")).await.json();
    assert_eq!(status["answered"], 1);
}

#[tokio::test]
async fn failing_provider_still_completes() {
    let server = server_with(MockProvider::failing(), EngineConfig::default());
    let id = create(&server, 1).await;
    server.post(&format!("/session/{id}/start")).await.assert_status_ok();

    let response = server
        .post(&format!("/session/{id}/respond"))
        .json(&json!({"answer": "I would use absolute references"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["phase"], "completed");
    assert_eq!(body["evaluation"]["source"]["kind"], "fallback");
    assert!(body["evaluation"]["feedback"]
        .as_str()
        .unwrap()
        .starts_with("[degraded evaluation]"));
    assert_eq!(body["report"]["degraded_evaluations"], 1);
    assert!(body["report"]["narrative"].is_null());
}

#[tokio::test]
async fn questions_listing_and_filter() {
    let server = server();
    let all: Vec<Value> = server.get("/questions").await.json();
    assert_eq!(all.len(), QuestionBank::builtin().len());

    let lookups: Vec<Value> = server
        .get("/questions")
        .add_query_param("category", "vlookup")
        .await
        .json();
    assert!(!lookups.is_empty());
    assert!(lookups.iter().all(|q| q["category"] == "lookups"));

    server
        .get("/questions")
        .add_query_param("category", "knitting")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cleanup_evicts_completed_sessions() {
    let server = server();
    let done = create(&server, 1).await;
    server.post(&format!("/session/{done}/start")).await.assert_status_ok();
    server
        .post(&format!("/session/{done}/respond"))
        .json(&json!({"answer": "answer"}))
        .await
        .assert_status_ok();
    let active = create(&server, 1).await;

    let kept: Value = server.post("/cleanup").json(&json!({})).await.json();
    assert_eq!(kept["evicted"], 0);

    let cleaned: Value = server
        .post("/cleanup")
        .json(&json!({"older_than_secs": 0}))
        .await
        .json();
    assert_eq!(cleaned["evicted"], 1);
    assert_eq!(cleaned["remaining"], 1);

    server
        .get(&format!("/session/{done}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server.get(&format!("/session/{active}")).await.assert_status_ok();
}
