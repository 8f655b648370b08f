//! The interview session state machine.
//!
//! A `Session` only changes through the transition methods below, each of
//! which either applies completely or returns an error and leaves the
//! session untouched:
//!
//! ```text
//! init --start--> questioning --reserve(last)--> evaluating --complete--> completed
//!                     ^  |
//!                     |  reserve / record_evaluation / adapt_remaining (not last)
//!                     +--+
//! ```
//!
//! Answering is split in two so scoring can run without holding the
//! session lock: `reserve_answer` claims the pending index, and
//! `record_evaluation` commits the result. While a reservation exists every
//! other submission is rejected.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bank::QuestionBank;
use crate::error::AssessmentError;
use crate::evaluator::{DifficultyAdjustment, Evaluation};
use crate::model::{Candidate, Difficulty, Phase, Question, SkillCategory};
use crate::report::Report;

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Zero-based position in the session plan.
    pub index: usize,
    pub question: Question,
    pub answer: String,
    pub evaluation: Evaluation,
    pub answered_at: DateTime<Utc>,
}

/// A timestamped lifecycle record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: SessionEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEventKind {
    Created { question_count: usize },
    Started,
    AnswerRecorded { index: usize, score: f64, degraded: bool },
    ReservationReleased { index: usize },
    DifficultyAdjusted { from: Difficulty, to: Difficulty },
    Completed { overall_score: f64 },
}

/// A question claimed for scoring by `reserve_answer`.
#[derive(Debug, Clone)]
pub struct PendingAnswer {
    pub index: usize,
    pub question: Question,
}

/// One candidate's assessment attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    id: String,
    candidate: Candidate,
    category: SkillCategory,
    difficulty: Difficulty,
    phase: Phase,
    questions: Vec<Question>,
    current_index: usize,
    turns: Vec<Turn>,
    running_score: f64,
    #[serde(skip)]
    pending: Option<usize>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    events: Vec<SessionEvent>,
    #[serde(skip)]
    report: Option<Report>,
}

impl Session {
    /// A fresh session in `init`. `questions` must not be empty.
    pub fn new(
        id: String,
        candidate: Candidate,
        category: SkillCategory,
        difficulty: Difficulty,
        questions: Vec<Question>,
    ) -> Result<Self, AssessmentError> {
        if questions.is_empty() {
            return Err(AssessmentError::InvalidConfiguration(
                "a session needs at least one question".into(),
            ));
        }
        let now = Utc::now();
        let question_count = questions.len();
        Ok(Self {
            id,
            candidate,
            category,
            difficulty,
            phase: Phase::Init,
            questions,
            current_index: 0,
            turns: Vec::new(),
            running_score: 0.0,
            pending: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            events: vec![SessionEvent {
                at: now,
                kind: SessionEventKind::Created { question_count },
            }],
            report: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn category(&self) -> SkillCategory {
        self.category
    }

    /// Current target difficulty; starts at the requested level.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn running_score(&self) -> f64 {
        self.running_score
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// The question awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Questioning => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// Index of the answer currently being scored.
    pub fn pending_index(&self) -> Option<usize> {
        self.pending
    }

    /// Mean of recorded scores, `None` before the first answer.
    pub fn average_score(&self) -> Option<f64> {
        if self.turns.is_empty() {
            None
        } else {
            Some(self.running_score / self.turns.len() as f64)
        }
    }

    /// All answers scored, report not yet attached.
    pub fn awaiting_report(&self) -> bool {
        self.phase == Phase::Evaluating
            && self.pending.is_none()
            && self.current_index == self.questions.len()
    }

    /// `init` → `questioning`; returns the first question.
    pub fn start(&mut self) -> Result<&Question, AssessmentError> {
        if self.phase != Phase::Init {
            return Err(AssessmentError::invalid_state(
                Phase::Init.to_string(),
                self.phase.to_string(),
            ));
        }
        let now = Utc::now();
        self.phase = Phase::Questioning;
        self.started_at = Some(now);
        self.push_event(now, SessionEventKind::Started);
        Ok(&self.questions[self.current_index])
    }

    /// Claim the pending question for scoring.
    ///
    /// `question_index`, when given, must name the pending question; a
    /// mismatch means the submission is a retry of an already-answered
    /// question (or is ahead of the session) and is rejected.
    pub fn reserve_answer(
        &mut self,
        question_index: Option<usize>,
    ) -> Result<PendingAnswer, AssessmentError> {
        if let Some(index) = self.pending {
            return Err(AssessmentError::invalid_state(
                "no answer in flight",
                format!("answer for question {index} is being scored"),
            ));
        }
        if self.phase != Phase::Questioning {
            return Err(AssessmentError::invalid_state(
                Phase::Questioning.to_string(),
                self.phase.to_string(),
            ));
        }
        if let Some(requested) = question_index {
            if requested != self.current_index {
                let actual = if requested < self.current_index {
                    format!("question {requested} was already answered")
                } else {
                    format!("question {requested} has not been asked")
                };
                return Err(AssessmentError::invalid_state(
                    format!("answer for question {}", self.current_index),
                    actual,
                ));
            }
        }

        let index = self.current_index;
        let question = self.questions[index].clone();
        self.pending = Some(index);
        if index + 1 == self.questions.len() {
            self.phase = Phase::Evaluating;
        }
        Ok(PendingAnswer { index, question })
    }

    /// Commit the evaluation for a reserved question and advance.
    pub fn record_evaluation(
        &mut self,
        index: usize,
        answer: String,
        evaluation: Evaluation,
    ) -> Result<(), AssessmentError> {
        if self.pending != Some(index) {
            return Err(AssessmentError::invalid_state(
                format!("reservation for question {index}"),
                match self.pending {
                    Some(p) => format!("reservation for question {p}"),
                    None => "no reservation".to_string(),
                },
            ));
        }

        let now = Utc::now();
        let score = evaluation.score;
        let degraded = evaluation.is_degraded();
        self.turns.push(Turn {
            index,
            question: self.questions[index].clone(),
            answer,
            evaluation,
            answered_at: now,
        });
        self.running_score += score;
        self.current_index += 1;
        self.pending = None;
        self.push_event(
            now,
            SessionEventKind::AnswerRecorded {
                index,
                score,
                degraded,
            },
        );
        Ok(())
    }

    /// Drop a reservation without recording anything.
    ///
    /// Only a non-final reservation can be dropped; the question stays
    /// pending. The final answer moved the session to `evaluating` and has
    /// to be recorded.
    pub fn release_reservation(&mut self, index: usize) -> Result<(), AssessmentError> {
        if self.pending != Some(index) {
            return Ok(());
        }
        if self.phase != Phase::Questioning {
            return Err(AssessmentError::invalid_state(
                "a non-final reservation",
                format!("final answer for question {index} is being scored"),
            ));
        }
        self.pending = None;
        self.push_event(Utc::now(), SessionEventKind::ReservationReleased { index });
        Ok(())
    }

    /// Re-rank the questions not yet issued after an evaluator hint.
    ///
    /// The target is one rank above or below the difficulty of the last
    /// answered question. Each remaining slot keeps its category when the
    /// bank has an unused question there; issued questions never change and
    /// no question appears twice. Returns the old and new target when the
    /// plan was touched.
    pub fn adapt_remaining(
        &mut self,
        bank: &QuestionBank,
        adjustment: DifficultyAdjustment,
    ) -> Option<(Difficulty, Difficulty)> {
        if self.phase != Phase::Questioning || self.pending.is_some() {
            return None;
        }
        let last = self.turns.last()?.question.difficulty;
        let target = match adjustment {
            DifficultyAdjustment::Increase => last.harder(),
            DifficultyAdjustment::Decrease => last.easier(),
            DifficultyAdjustment::Maintain => return None,
        };
        if target == last {
            return None;
        }

        let mut used: HashSet<String> = self.questions[..self.current_index]
            .iter()
            .map(|q| q.id.clone())
            .collect();
        let closest = |candidates: Vec<&Question>| -> Option<Question> {
            candidates
                .into_iter()
                .min_by_key(|q| (q.difficulty.distance(target), q.difficulty.rank()))
                .cloned()
        };

        let mut tail = Vec::with_capacity(self.questions.len() - self.current_index);
        for slot in &self.questions[self.current_index..] {
            let same_category = bank
                .questions()
                .iter()
                .filter(|q| q.category == slot.category && !used.contains(&q.id))
                .collect();
            let chosen = closest(same_category)
                .or_else(|| {
                    closest(
                        bank.questions()
                            .iter()
                            .filter(|q| !used.contains(&q.id))
                            .collect(),
                    )
                })
                .unwrap_or_else(|| slot.clone());
            used.insert(chosen.id.clone());
            tail.push(chosen);
        }

        self.questions.truncate(self.current_index);
        self.questions.extend(tail);
        self.difficulty = target;
        self.push_event(
            Utc::now(),
            SessionEventKind::DifficultyAdjusted {
                from: last,
                to: target,
            },
        );
        Some((last, target))
    }

    /// `evaluating` → `completed`, attaching the final report.
    pub fn complete(&mut self, report: Report) -> Result<(), AssessmentError> {
        if !self.awaiting_report() {
            return Err(AssessmentError::invalid_state(
                "all answers scored",
                format!(
                    "{} with {}/{} answered",
                    self.phase,
                    self.turns.len(),
                    self.questions.len()
                ),
            ));
        }
        let now = Utc::now();
        let overall_score = report.overall_score;
        self.phase = Phase::Completed;
        self.completed_at = Some(now);
        self.report = Some(report);
        self.push_event(now, SessionEventKind::Completed { overall_score });
        Ok(())
    }

    fn push_event(&mut self, at: DateTime<Utc>, kind: SessionEventKind) {
        self.events.push(SessionEvent { at, kind });
    }
}

/// Read-only view of a session's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub candidate: String,
    pub phase: Phase,
    pub answered: usize,
    pub total_questions: usize,
    /// Mean score so far.
    pub average_score: Option<f64>,
    /// The question awaiting an answer, when questioning.
    pub current_question: Option<Question>,
    pub answer_in_flight: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionStatus {
    fn from(s: &Session) -> Self {
        Self {
            session_id: s.id.clone(),
            candidate: s.candidate.name.clone(),
            phase: s.phase,
            answered: s.turns.len(),
            total_questions: s.questions.len(),
            average_score: s.average_score(),
            current_question: s.current_question().cloned(),
            answer_in_flight: s.pending.is_some(),
            created_at: s.created_at,
            completed_at: s.completed_at,
        }
    }
}
