//! Final assessment report with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::gateway::LlmGateway;
use crate::model::{Difficulty, SkillCategory};
use crate::session::{Session, Turn};
use crate::statistics::{
    category_breakdown, round2, weighted_overall, CategoryScore, CategoryWeights, Proficiency,
};

const STRENGTH_THRESHOLD: f64 = 75.0;
const WEAKNESS_THRESHOLD: f64 = 60.0;
const MAX_LIST_ITEMS: usize = 6;

const NARRATIVE_CONTEXT: &str =
    "You are an Excel interviewer writing the closing summary for a candidate.";

/// Score line for a single answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub index: usize,
    pub question_id: String,
    pub question: String,
    pub category: SkillCategory,
    pub score: f64,
    pub feedback: String,
    /// Scored by the keyword fallback.
    pub degraded: bool,
}

/// A complete assessment report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique report identifier.
    pub id: Uuid,
    pub session_id: String,
    pub candidate: String,
    pub skill_category: SkillCategory,
    pub difficulty: Difficulty,
    /// Weighted overall score, rounded to two decimals.
    pub overall_score: f64,
    pub proficiency: Proficiency,
    pub categories: Vec<CategoryScore>,
    pub questions: Vec<QuestionScore>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    /// Deterministic one-paragraph summary.
    pub summary: String,
    /// Optional model-written summary.
    #[serde(default)]
    pub narrative: Option<String>,
    /// Answers scored by the keyword fallback.
    pub degraded_evaluations: usize,
    pub duration_secs: i64,
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: Report =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Whole minutes from start to completion.
    pub fn duration_minutes(&self) -> i64 {
        self.duration_secs / 60
    }

    pub fn best_category(&self) -> Option<&CategoryScore> {
        self.categories
            .iter()
            .max_by(|a, b| a.mean.total_cmp(&b.mean))
    }

    pub fn weakest_category(&self) -> Option<&CategoryScore> {
        self.categories
            .iter()
            .min_by(|a, b| a.mean.total_cmp(&b.mean))
    }
}

/// Builds a [`Report`] from a session whose answers are all scored.
#[derive(Clone, Default)]
pub struct ReportBuilder {
    weights: CategoryWeights,
    gateway: Option<LlmGateway>,
}

impl ReportBuilder {
    pub fn new(weights: CategoryWeights) -> Self {
        Self {
            weights,
            gateway: None,
        }
    }

    /// Ask the gateway for a narrative summary on each report.
    pub fn with_narrative(mut self, gateway: LlmGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn weights(&self) -> &CategoryWeights {
        &self.weights
    }

    /// Full report, including the narrative when configured.
    ///
    /// The narrative is best-effort: a gateway failure leaves it `None`.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    pub async fn build(&self, session: &Session) -> Report {
        let mut report = self.build_scores(session);
        if let Some(gateway) = &self.gateway {
            match gateway
                .complete(&narrative_prompt(&report), NARRATIVE_CONTEXT)
                .await
            {
                Ok(text) => report.narrative = Some(text.trim().to_string()),
                Err(e) => tracing::warn!(error = %e, "narrative summary unavailable"),
            }
        }
        report
    }

    /// The deterministic part of the report.
    pub fn build_scores(&self, session: &Session) -> Report {
        let turns = session.turns();
        let pairs: Vec<(SkillCategory, f64)> = turns
            .iter()
            .map(|t| (t.question.category, t.evaluation.score))
            .collect();

        let mut categories = category_breakdown(&pairs, &self.weights);
        let overall_score = round2(weighted_overall(&categories));
        let proficiency = Proficiency::from_score(overall_score);

        let strengths = strengths(&categories, turns);
        let weaknesses = weaknesses(&categories, turns);
        for c in &mut categories {
            c.mean = round2(c.mean);
        }

        let questions: Vec<QuestionScore> = turns
            .iter()
            .map(|t| QuestionScore {
                index: t.index,
                question_id: t.question.id.clone(),
                question: t.question.text.clone(),
                category: t.question.category,
                score: round2(t.evaluation.score),
                feedback: t.evaluation.feedback.clone(),
                degraded: t.evaluation.is_degraded(),
            })
            .collect();
        let degraded_evaluations = questions.iter().filter(|q| q.degraded).count();

        let started = session.started_at().unwrap_or_else(|| session.created_at());
        let finished = session.completed_at().unwrap_or_else(Utc::now);
        let duration_secs = (finished - started).num_seconds().max(0);

        let mut report = Report {
            id: Uuid::new_v4(),
            session_id: session.id().to_string(),
            candidate: session.candidate().name.clone(),
            skill_category: session.category(),
            difficulty: session.difficulty(),
            overall_score,
            proficiency,
            categories,
            questions,
            strengths,
            weaknesses,
            recommendations: proficiency
                .recommendations()
                .iter()
                .map(|r| r.to_string())
                .collect(),
            summary: String::new(),
            narrative: None,
            degraded_evaluations,
            duration_secs,
            created_at: Utc::now(),
        };
        report.summary = summary(&report);
        report
    }
}

/// Turns ordered by score, highest first. Ties keep question order.
fn ranked(turns: &[Turn]) -> Vec<&Turn> {
    let mut ranked: Vec<&Turn> = turns.iter().collect();
    ranked.sort_by(|a, b| b.evaluation.score.total_cmp(&a.evaluation.score));
    ranked
}

fn strengths(categories: &[CategoryScore], turns: &[Turn]) -> Vec<String> {
    let mut out: Vec<String> = categories
        .iter()
        .filter(|c| c.mean >= STRENGTH_THRESHOLD)
        .map(|c| format!("Strong {} skills ({:.0}/100)", c.category, c.mean))
        .collect();
    for turn in ranked(turns).into_iter().take(2) {
        for s in &turn.evaluation.strengths {
            push_distinct(&mut out, s);
        }
    }
    out.truncate(MAX_LIST_ITEMS);
    if out.is_empty() {
        out.push("Completed every question in the assessment".to_string());
    }
    out
}

fn weaknesses(categories: &[CategoryScore], turns: &[Turn]) -> Vec<String> {
    let mut out: Vec<String> = categories
        .iter()
        .filter(|c| c.mean < WEAKNESS_THRESHOLD)
        .map(|c| format!("{} needs more practice ({:.0}/100)", c.category, c.mean))
        .collect();
    for turn in ranked(turns).into_iter().rev().take(2) {
        for s in &turn.evaluation.improvements {
            push_distinct(&mut out, s);
        }
    }
    out.truncate(MAX_LIST_ITEMS);
    if out.is_empty() {
        out.push("No significant gaps identified".to_string());
    }
    out
}

fn push_distinct(list: &mut Vec<String>, item: &str) {
    let item = item.trim();
    if !item.is_empty() && !list.iter().any(|s| s.eq_ignore_ascii_case(item)) {
        list.push(item.to_string());
    }
}

fn summary(report: &Report) -> String {
    let mut text = format!(
        "{} answered {} question{} and scored {:.1}/100 overall ({}).",
        report.candidate,
        report.questions.len(),
        if report.questions.len() == 1 { "" } else { "s" },
        report.overall_score,
        report.proficiency,
    );
    if report.categories.len() > 1 {
        if let (Some(best), Some(worst)) = (report.best_category(), report.weakest_category()) {
            text.push_str(&format!(
                " Best area: {} ({:.0}). Weakest area: {} ({:.0}).",
                best.category, best.mean, worst.category, worst.mean
            ));
        }
    }
    if report.degraded_evaluations > 0 {
        text.push_str(&format!(
            " {} answer{} scored by keyword coverage because automated review was unavailable.",
            report.degraded_evaluations,
            if report.degraded_evaluations == 1 { " was" } else { "s were" },
        ));
    }
    text
}

fn narrative_prompt(report: &Report) -> String {
    let breakdown: Vec<String> = report
        .categories
        .iter()
        .map(|c| format!("- {}: {:.0}/100 over {} question(s)", c.category, c.mean, c.count))
        .collect();
    format!(
        "Write a short, encouraging and professional summary (3-4 sentences) of this \
         Excel assessment for the candidate.\n\n\
         Candidate: {}\n\
         Overall score: {:.1}/100 ({})\n\
         Category scores:\n{}\n\
         Strengths: {}\n\
         Areas to improve: {}\n\n\
         Address the candidate directly. Do not invent scores.",
        report.candidate,
        report.overall_score,
        report.proficiency,
        breakdown.join("\n"),
        report.strengths.join("; "),
        report.weaknesses.join("; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::evaluator::{Evaluation, EvaluationSource};
    use crate::gateway::GatewayConfig;
    use crate::model::{Candidate, Question};
    use crate::testing::ScriptedProvider;

    fn question(id: &str, category: SkillCategory) -> Question {
        Question {
            id: id.into(),
            text: format!("Question {id}"),
            category,
            difficulty: Difficulty::Medium,
            keywords: vec![],
            follow_up: None,
        }
    }

    fn eval(score: f64, strengths: &[&str], improvements: &[&str], degraded: bool) -> Evaluation {
        Evaluation {
            score,
            feedback: "fb".into(),
            strengths: strengths.iter().map(|s| s.to_string()).collect(),
            improvements: improvements.iter().map(|s| s.to_string()).collect(),
            difficulty_adjustment: None,
            source: if degraded {
                EvaluationSource::Fallback {
                    reason: "timeout".into(),
                }
            } else {
                EvaluationSource::Model
            },
        }
    }

    fn finished_session(questions: Vec<Question>, evals: Vec<Evaluation>) -> Session {
        let mut s = Session::new(
            "sess".into(),
            Candidate::named("Grace"),
            questions[0].category,
            Difficulty::Medium,
            questions,
        )
        .unwrap();
        s.start().unwrap();
        for e in evals {
            let p = s.reserve_answer(None).unwrap();
            s.record_evaluation(p.index, "answer".into(), e).unwrap();
        }
        s
    }

    #[test]
    fn single_category_overall_is_mean() {
        let s = finished_session(
            vec![
                question("a", SkillCategory::Formulas),
                question("b", SkillCategory::Formulas),
                question("c", SkillCategory::Formulas),
            ],
            vec![
                eval(80.0, &[], &[], false),
                eval(70.0, &[], &[], false),
                eval(71.0, &[], &[], false),
            ],
        );
        let report = ReportBuilder::default().build_scores(&s);
        assert_eq!(report.overall_score, 73.67);
        assert_eq!(report.proficiency, Proficiency::Intermediate);
        assert_eq!(report.questions.len(), 3);
        assert_eq!(report.categories.len(), 1);
    }

    #[test]
    fn weights_apply_across_categories() {
        let s = finished_session(
            vec![
                question("a", SkillCategory::Formulas),
                question("b", SkillCategory::Macros),
            ],
            vec![eval(90.0, &[], &[], false), eval(30.0, &[], &[], false)],
        );
        let weights = CategoryWeights::uniform().with(SkillCategory::Formulas, 2.0);
        let report = ReportBuilder::new(weights).build_scores(&s);
        assert_eq!(report.overall_score, 70.0);
        assert!(report.summary.contains("Best area: Formulas & Functions (90)"));
        assert!(report.summary.contains("Weakest area: Macros & VBA (30)"));
    }

    #[test]
    fn strengths_and_weaknesses_from_categories_and_answers() {
        let s = finished_session(
            vec![
                question("a", SkillCategory::Formulas),
                question("b", SkillCategory::Lookups),
                question("c", SkillCategory::Lookups),
            ],
            vec![
                eval(95.0, &["Precise syntax"], &[], false),
                eval(40.0, &[], &["Explain exact match"], false),
                eval(45.0, &["precise syntax"], &["Mention XLOOKUP"], false),
            ],
        );
        let report = ReportBuilder::default().build_scores(&s);
        assert_eq!(report.strengths[0], "Strong Formulas & Functions skills (95/100)");
        assert_eq!(
            report
                .strengths
                .iter()
                .filter(|s| s.eq_ignore_ascii_case("precise syntax"))
                .count(),
            1
        );
        assert!(report.weaknesses[0].starts_with("VLOOKUP & Lookups needs more practice"));
        assert!(report.weaknesses.iter().any(|w| w == "Explain exact match"));
        assert!(report.weaknesses.iter().any(|w| w == "Mention XLOOKUP"));
    }

    #[test]
    fn empty_lists_get_neutral_lines() {
        let s = finished_session(
            vec![question("a", SkillCategory::Charts)],
            vec![eval(65.0, &[], &[], false)],
        );
        let report = ReportBuilder::default().build_scores(&s);
        assert_eq!(report.strengths.len(), 1);
        assert_eq!(report.weaknesses, vec!["No significant gaps identified"]);
        assert_eq!(report.recommendations.len(), 3);
    }

    #[test]
    fn degraded_answers_are_counted() {
        let s = finished_session(
            vec![
                question("a", SkillCategory::Charts),
                question("b", SkillCategory::Charts),
            ],
            vec![eval(50.0, &[], &[], true), eval(60.0, &[], &[], false)],
        );
        let report = ReportBuilder::default().build_scores(&s);
        assert_eq!(report.degraded_evaluations, 1);
        assert!(report.questions[0].degraded);
        assert!(report.summary.contains("1 answer was scored by keyword coverage"));
    }

    #[tokio::test]
    async fn narrative_is_attached_when_available() {
        let s = finished_session(
            vec![question("a", SkillCategory::Charts)],
            vec![eval(92.0, &[], &[], false)],
        );
        let provider = Arc::new(ScriptedProvider::fixed("  Great work, Grace.  "));
        let gateway = LlmGateway::new(provider.clone(), GatewayConfig::default());
        let report = ReportBuilder::default().with_narrative(gateway).build(&s).await;
        assert_eq!(report.narrative.as_deref(), Some("Great work, Grace."));
        assert!(provider
            .last_request()
            .unwrap()
            .prompt
            .contains("Overall score: 92.0/100 (Expert)"));
    }

    #[tokio::test]
    async fn narrative_failure_keeps_report() {
        let s = finished_session(
            vec![question("a", SkillCategory::Charts)],
            vec![eval(92.0, &[], &[], false)],
        );
        let gateway = LlmGateway::new(
            Arc::new(ScriptedProvider::failing()),
            GatewayConfig::default(),
        );
        let report = ReportBuilder::default().with_narrative(gateway).build(&s).await;
        assert!(report.narrative.is_none());
        assert_eq!(report.overall_score, 92.0);
    }

    #[test]
    fn json_roundtrip() {
        let s = finished_session(
            vec![question("a", SkillCategory::PowerQuery)],
            vec![eval(77.5, &["Clear"], &[], false)],
        );
        let report = ReportBuilder::default().build_scores(&s);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = Report::load_json(&path).unwrap();

        assert_eq!(loaded.session_id, "sess");
        assert_eq!(loaded.overall_score, 77.5);
        assert_eq!(loaded.proficiency, Proficiency::Advanced);
    }
}
