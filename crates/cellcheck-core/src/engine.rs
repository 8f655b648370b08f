//! Interview orchestration.
//!
//! The engine owns the question bank, the session store and the evaluator,
//! and drives sessions through their phases. Scoring runs on a spawned
//! task: once an answer is reserved, its evaluation is committed even if
//! the caller stops waiting.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::error::AssessmentError;
use crate::evaluator::{fallback_evaluation, Evaluation, Evaluator};
use crate::gateway::LlmGateway;
use crate::model::{Candidate, Difficulty, Phase, Question, SkillCategory};
use crate::report::{Report, ReportBuilder};
use crate::session::{PendingAnswer, Session, SessionStatus};
use crate::statistics::CategoryWeights;
use crate::store::{lock_session, SessionHandle, SessionStore};

/// Configuration for the interview engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on questions per session.
    pub max_questions: usize,
    /// Category weights for the overall score.
    pub weights: CategoryWeights,
    /// Request a model-written narrative for each report.
    pub narrative: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_questions: 10,
            weights: CategoryWeights::uniform(),
            narrative: true,
        }
    }
}

/// Returned by [`InterviewEngine::create_session`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub phase: Phase,
    pub total_questions: usize,
}

/// A question put to the candidate.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionPrompt {
    pub session_id: String,
    pub question: Question,
    /// One-based position.
    pub number: usize,
    pub total: usize,
}

/// Result of submitting an answer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum AnswerOutcome {
    /// More questions remain.
    Questioning {
        evaluation: Evaluation,
        /// Follow-up prompt attached to the question just answered.
        #[serde(skip_serializing_if = "Option::is_none")]
        follow_up: Option<String>,
        next_question: Question,
        number: usize,
        total: usize,
    },
    /// That was the last answer; the report is ready.
    Completed {
        evaluation: Evaluation,
        report: Box<Report>,
    },
}

impl AnswerOutcome {
    pub fn evaluation(&self) -> &Evaluation {
        match self {
            AnswerOutcome::Questioning { evaluation, .. }
            | AnswerOutcome::Completed { evaluation, .. } => evaluation,
        }
    }
}

/// The central interview engine.
pub struct InterviewEngine {
    bank: Arc<QuestionBank>,
    store: Arc<SessionStore>,
    evaluator: Evaluator,
    reports: ReportBuilder,
    config: EngineConfig,
    provider_name: String,
}

impl InterviewEngine {
    pub fn new(gateway: LlmGateway, bank: QuestionBank, config: EngineConfig) -> Self {
        let mut reports = ReportBuilder::new(config.weights.clone());
        if config.narrative {
            reports = reports.with_narrative(gateway.clone());
        }
        Self {
            bank: Arc::new(bank),
            store: Arc::new(SessionStore::new()),
            provider_name: gateway.provider_name().to_string(),
            evaluator: Evaluator::new(gateway),
            reports,
            config,
        }
    }

    /// Name of the provider behind the gateway.
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Validate the request, plan the questions and register a session in
    /// `init`.
    #[instrument(skip(self, candidate), fields(candidate = %candidate.name))]
    pub async fn create_session(
        &self,
        candidate: Candidate,
        skill_category: &str,
        difficulty: &str,
        question_count: i64,
    ) -> Result<SessionCreated, AssessmentError> {
        if candidate.name.trim().is_empty() {
            return Err(AssessmentError::InvalidConfiguration(
                "candidate name must not be empty".into(),
            ));
        }
        let category: SkillCategory = skill_category
            .parse()
            .map_err(AssessmentError::InvalidConfiguration)?;
        let difficulty: Difficulty = difficulty
            .parse()
            .map_err(AssessmentError::InvalidConfiguration)?;
        if question_count <= 0 {
            return Err(AssessmentError::InvalidConfiguration(format!(
                "question_count must be positive, got {question_count}"
            )));
        }
        let count = question_count as usize;
        if count > self.config.max_questions {
            return Err(AssessmentError::InvalidConfiguration(format!(
                "question_count {count} exceeds the maximum of {}",
                self.config.max_questions
            )));
        }

        let questions = self.bank.select(category, difficulty, count)?;
        let session_id = Uuid::new_v4().to_string();
        let session = Session::new(session_id.clone(), candidate, category, difficulty, questions)?;
        self.store.insert(session).await;

        info!(session = %session_id, %category, %difficulty, count, "session created");
        Ok(SessionCreated {
            session_id,
            phase: Phase::Init,
            total_questions: count,
        })
    }

    /// Move a session from `init` to `questioning` and return question 1.
    #[instrument(skip(self))]
    pub async fn start_session(&self, session_id: &str) -> Result<QuestionPrompt, AssessmentError> {
        let prompt = self
            .store
            .with_session(session_id, |s| {
                let question = s.start()?.clone();
                Ok(QuestionPrompt {
                    session_id: s.id().to_string(),
                    question,
                    number: 1,
                    total: s.question_count(),
                })
            })
            .await?;
        info!(session = %session_id, "interview started");
        Ok(prompt)
    }

    /// Score an answer to the pending question and advance the session.
    ///
    /// `question_index` (zero-based) guards against retried submissions: if
    /// given, it must match the pending question.
    #[instrument(skip(self, answer), fields(answer_len = answer.len()))]
    pub async fn submit_answer(
        &self,
        session_id: &str,
        answer: String,
        question_index: Option<usize>,
    ) -> Result<AnswerOutcome, AssessmentError> {
        if answer.trim().is_empty() {
            return Err(AssessmentError::invalid_state(
                "a non-empty answer",
                "blank answer",
            ));
        }

        let handle = self.store.get(session_id).await?;
        let pending = lock_session(&handle).reserve_answer(question_index)?;

        let task = tokio::spawn(score_and_commit(
            handle.clone(),
            self.evaluator.clone(),
            self.reports.clone(),
            Arc::clone(&self.bank),
            pending.clone(),
            answer.clone(),
        ));

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(session = %session_id, error = %e, "scoring task failed");
                self.recover(&handle, pending, answer, e.to_string())
            }
        }
    }

    /// The final report. Fails with `NotReady` until the session completes;
    /// repeated calls return the same report.
    pub async fn get_report(&self, session_id: &str) -> Result<Report, AssessmentError> {
        self.store
            .with_session(session_id, |s| match s.phase() {
                Phase::Completed => s.report().cloned().ok_or_else(|| {
                    AssessmentError::Internal(format!("session {} has no report", s.id()))
                }),
                phase => Err(AssessmentError::NotReady(format!(
                    "session {} is {phase} with {}/{} questions answered",
                    s.id(),
                    s.turns().len(),
                    s.question_count()
                ))),
            })
            .await
    }

    pub async fn status(&self, session_id: &str) -> Result<SessionStatus, AssessmentError> {
        self.store
            .with_session(session_id, |s| Ok(SessionStatus::from(&*s)))
            .await
    }

    /// Remove completed sessions that finished more than `older_than` ago.
    pub async fn evict_completed(&self, older_than: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(older_than)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return 0;
        };
        let removed = self.store.evict_completed_before(cutoff).await;
        if removed > 0 {
            info!(removed, "evicted completed sessions");
        }
        removed
    }

    /// Put a session back into a consistent state after its scoring task
    /// died.
    ///
    /// A non-final reservation is released so the question can be answered
    /// again. The final answer already moved the session to `evaluating`, so
    /// it is committed with a keyword-coverage score and the session
    /// completes with a scores-only report.
    fn recover(
        &self,
        handle: &SessionHandle,
        pending: PendingAnswer,
        answer: String,
        reason: String,
    ) -> Result<AnswerOutcome, AssessmentError> {
        let mut session = lock_session(handle);
        let failed = || AssessmentError::Internal(format!("scoring task failed: {reason}"));

        if session.pending_index() == Some(pending.index) {
            if session.phase() == Phase::Questioning {
                session.release_reservation(pending.index)?;
                return Err(failed());
            }
            let evaluation = fallback_evaluation(
                &pending.question,
                &answer,
                format!("scoring task failed: {reason}"),
            );
            session.record_evaluation(pending.index, answer, evaluation.clone())?;
        } else if !session.awaiting_report() {
            return Err(failed());
        }

        let evaluation = session
            .turns()
            .last()
            .map(|t| t.evaluation.clone())
            .ok_or_else(failed)?;
        let report = self.reports.build_scores(&session);
        session.complete(report.clone())?;
        info!(session = %session.id(), "interview completed after scoring failure");
        Ok(AnswerOutcome::Completed {
            evaluation,
            report: Box::new(report),
        })
    }
}

async fn score_and_commit(
    handle: SessionHandle,
    evaluator: Evaluator,
    reports: ReportBuilder,
    bank: Arc<QuestionBank>,
    pending: PendingAnswer,
    answer: String,
) -> Result<AnswerOutcome, AssessmentError> {
    let evaluation = evaluator.evaluate(&pending.question, &answer).await;

    let snapshot = {
        let mut session = lock_session(&handle);
        session.record_evaluation(pending.index, answer, evaluation.clone())?;
        info!(
            session = %session.id(),
            question = pending.index,
            score = evaluation.score,
            degraded = evaluation.is_degraded(),
            "answer scored"
        );
        if !session.awaiting_report() {
            if let Some(adjustment) = evaluation.difficulty_adjustment {
                if let Some((from, to)) = session.adapt_remaining(&bank, adjustment) {
                    info!(session = %session.id(), %from, %to, "difficulty adjusted");
                }
            }
            let next_question = session.current_question().cloned().ok_or_else(|| {
                AssessmentError::Internal("no pending question after scoring".into())
            })?;
            return Ok(AnswerOutcome::Questioning {
                evaluation,
                follow_up: pending.question.follow_up.clone(),
                next_question,
                number: session.current_index() + 1,
                total: session.question_count(),
            });
        }
        session.clone()
    };

    let report = reports.build(&snapshot).await;
    lock_session(&handle).complete(report.clone())?;
    info!(
        session = %snapshot.id(),
        overall = report.overall_score,
        proficiency = %report.proficiency,
        "interview completed"
    );
    Ok(AnswerOutcome::Completed {
        evaluation,
        report: Box::new(report),
    })
}
