//! Answer scoring.
//!
//! The evaluator asks the gateway for a JSON verdict and treats the reply as
//! untrusted input: it goes through [`parse_verdict`], and anything that does
//! not yield a finite score in `0..=100` is replaced by a deterministic
//! keyword-coverage score flagged as degraded.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::gateway::LlmGateway;
use crate::model::Question;
use crate::traits::extract_json_object;

/// Lowest and highest score an evaluation can carry.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

const EVALUATOR_CONTEXT: &str =
    "You are an expert Excel skills evaluator. Respond only with a single valid JSON object.";

const MAX_LIST_ITEMS: usize = 5;

/// Scored and annotated result for one question/answer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Score in `0..=100`.
    pub score: f64,
    pub feedback: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub difficulty_adjustment: Option<DifficultyAdjustment>,
    pub source: EvaluationSource,
}

impl Evaluation {
    /// `true` when the score came from the keyword fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, EvaluationSource::Fallback { .. })
    }
}

/// Where an evaluation's score came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationSource {
    Model,
    Fallback { reason: String },
}

/// Evaluator hint for the next question's difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyAdjustment {
    Increase,
    Maintain,
    Decrease,
}

/// Outcome of parsing an upstream evaluation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Parsed(VerdictPayload),
    Malformed(String),
}

/// A verdict that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictPayload {
    pub score: f64,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub difficulty_adjustment: Option<DifficultyAdjustment>,
}

/// Validate raw LLM output as an evaluation verdict.
pub fn parse_verdict(raw: &str) -> Verdict {
    let Some(obj) = extract_json_object(raw) else {
        return Verdict::Malformed("response contained no JSON object".into());
    };

    let Some(score_value) = obj.get("score").or_else(|| obj.get("overall_score")) else {
        return Verdict::Malformed("verdict has no score".into());
    };
    let score = match score_value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(score) = score else {
        return Verdict::Malformed(format!("non-numeric score: {score_value}"));
    };
    if !score.is_finite() || !SCORE_RANGE.contains(&score) {
        return Verdict::Malformed(format!("score {score} outside 0..=100"));
    }

    let feedback = obj
        .get("feedback")
        .or_else(|| obj.get("personalized_feedback"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("No feedback provided.")
        .to_string();

    let strings = |keys: &[&str]| -> Vec<String> {
        keys.iter()
            .find_map(|k| obj.get(*k).and_then(|v| v.as_array()))
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .take(MAX_LIST_ITEMS)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    let difficulty_adjustment = obj
        .get("difficulty_adjustment")
        .and_then(|v| v.as_str())
        .and_then(|s| match s.trim().to_lowercase().as_str() {
            "increase" => Some(DifficultyAdjustment::Increase),
            "maintain" => Some(DifficultyAdjustment::Maintain),
            "decrease" => Some(DifficultyAdjustment::Decrease),
            _ => None,
        });

    Verdict::Parsed(VerdictPayload {
        score,
        feedback,
        strengths: strings(&["strengths", "key_strengths"]),
        improvements: strings(&["improvements", "areas_for_improvement"]),
        difficulty_adjustment,
    })
}

/// Share of the question's keywords that appear in the answer, as `0..=100`.
///
/// Matching is case-insensitive substring matching. Blank keywords are
/// ignored; a question with no usable keywords scores 0.
pub fn keyword_score(question: &Question, answer: &str) -> (f64, usize) {
    let keywords: Vec<&String> = usable_keywords(question).collect();
    if keywords.is_empty() {
        return (0.0, 0);
    }
    let answer = answer.to_lowercase();
    let matched = keywords
        .iter()
        .filter(|k| answer.contains(&k.to_lowercase()))
        .count();
    let score = matched as f64 / keywords.len() as f64 * 100.0;
    (score, matched)
}

fn usable_keywords(question: &Question) -> impl Iterator<Item = &String> {
    question.keywords.iter().filter(|k| !k.trim().is_empty())
}

/// Scores answers through the LLM gateway.
#[derive(Clone)]
pub struct Evaluator {
    gateway: LlmGateway,
}

impl Evaluator {
    pub fn new(gateway: LlmGateway) -> Self {
        Self { gateway }
    }

    /// Score `answer` against `question`. Never fails.
    #[instrument(skip(self, question, answer), fields(question = %question.id))]
    pub async fn evaluate(&self, question: &Question, answer: &str) -> Evaluation {
        let prompt = evaluation_prompt(question, answer);

        let reason = match self.gateway.complete_json(&prompt, EVALUATOR_CONTEXT).await {
            Ok(raw) => match parse_verdict(&raw) {
                Verdict::Parsed(v) => {
                    return Evaluation {
                        score: v.score,
                        feedback: v.feedback,
                        strengths: v.strengths,
                        improvements: v.improvements,
                        difficulty_adjustment: v.difficulty_adjustment,
                        source: EvaluationSource::Model,
                    };
                }
                Verdict::Malformed(why) => format!("malformed verdict: {why}"),
            },
            Err(e) => e.to_string(),
        };

        tracing::warn!(question = %question.id, %reason, "falling back to keyword scoring");
        fallback_evaluation(question, answer, reason)
    }
}

/// Deterministic evaluation used when the model verdict is unusable.
pub fn fallback_evaluation(question: &Question, answer: &str, reason: String) -> Evaluation {
    let (score, matched) = keyword_score(question, answer);
    let total = usable_keywords(question).count();

    let mut strengths = Vec::new();
    if matched > 0 {
        strengths.push(format!("Covered {matched} of {total} expected concepts"));
    }
    let missing: Vec<&str> = usable_keywords(question)
        .filter(|k| !answer.to_lowercase().contains(&k.to_lowercase()))
        .map(String::as_str)
        .take(MAX_LIST_ITEMS)
        .collect();
    let improvements = if missing.is_empty() {
        Vec::new()
    } else {
        vec![format!("Consider discussing: {}", missing.join(", "))]
    };

    Evaluation {
        score,
        feedback: format!(
            "[degraded evaluation] Automated review was unavailable ({reason}); \
             scored by keyword coverage ({matched}/{total})."
        ),
        strengths,
        improvements,
        difficulty_adjustment: Some(DifficultyAdjustment::Maintain),
        source: EvaluationSource::Fallback { reason },
    }
}

fn evaluation_prompt(question: &Question, answer: &str) -> String {
    format!(
        "Evaluate this Excel interview response.\n\n\
         Category: {category}\n\
         Difficulty: {difficulty}\n\
         Question: {text}\n\
         Expected concepts: {keywords}\n\
         Candidate's response: {answer}\n\n\
         Return ONLY a JSON object with:\n\
         - score: 0-100 based on accuracy, completeness and understanding\n\
         - feedback: brief constructive feedback (2-3 sentences)\n\
         - strengths: list of 1-3 things done well\n\
         - improvements: list of 1-3 areas to improve\n\
         - difficulty_adjustment: \"increase\", \"maintain\" or \"decrease\"\n\n\
         Example: {{\"score\": 85, \"feedback\": \"Good understanding shown\", \
         \"strengths\": [\"Clear explanation\"], \"improvements\": [\"More detail needed\"], \
         \"difficulty_adjustment\": \"maintain\"}}",
        category = question.category,
        difficulty = question.difficulty,
        text = question.text,
        keywords = question.keywords.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::gateway::GatewayConfig;
    use crate::model::{Difficulty, SkillCategory};
    use crate::testing::ScriptedProvider;

    fn question() -> Question {
        Question {
            id: "vlookup".into(),
            text: "How does VLOOKUP work?".into(),
            category: SkillCategory::Lookups,
            difficulty: Difficulty::Easy,
            keywords: vec![
                "lookup value".into(),
                "table array".into(),
                "column index".into(),
                "exact match".into(),
            ],
            follow_up: None,
        }
    }

    fn evaluator(provider: ScriptedProvider) -> Evaluator {
        Evaluator::new(LlmGateway::new(
            Arc::new(provider),
            GatewayConfig {
                timeout: Duration::from_secs(5),
                ..GatewayConfig::default()
            },
        ))
    }

    const ANSWER: &str = "You give it a lookup value and a table array, and FALSE forces an exact match.";

    #[test]
    fn parse_clean_verdict() {
        let v = parse_verdict(
            r#"{"score": 82.5, "feedback": "Nice", "strengths": ["clear"], "improvements": [], "difficulty_adjustment": "increase"}"#,
        );
        let Verdict::Parsed(p) = v else {
            panic!("expected parsed verdict")
        };
        assert_eq!(p.score, 82.5);
        assert_eq!(p.strengths, vec!["clear"]);
        assert_eq!(p.difficulty_adjustment, Some(DifficultyAdjustment::Increase));
    }

    #[test]
    fn parse_string_and_alias_scores() {
        assert!(matches!(
            parse_verdict(r#"{"score": "70"}"#),
            Verdict::Parsed(VerdictPayload { score, .. }) if score == 70.0
        ));
        assert!(matches!(
            parse_verdict(r#"{"overall_score": 64, "key_strengths": ["a"]}"#),
            Verdict::Parsed(VerdictPayload { score, .. }) if score == 64.0
        ));
        assert!(matches!(
            parse_verdict(r#"{"score": "90%"}"#),
            Verdict::Parsed(VerdictPayload { score, .. }) if score == 90.0
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse_verdict("I think it was fine"), Verdict::Malformed(_)));
        assert!(matches!(parse_verdict(r#"{"feedback": "no score"}"#), Verdict::Malformed(_)));
        assert!(matches!(parse_verdict(r#"{"score": "great"}"#), Verdict::Malformed(_)));
        assert!(matches!(parse_verdict(r#"{"score": null}"#), Verdict::Malformed(_)));
        assert!(matches!(parse_verdict(r#"{"score": 150}"#), Verdict::Malformed(_)));
        assert!(matches!(parse_verdict(r#"{"score": -3}"#), Verdict::Malformed(_)));
    }

    #[test]
    fn parse_defaults_missing_feedback() {
        let Verdict::Parsed(p) = parse_verdict(r#"{"score": 40, "feedback": "  "}"#) else {
            panic!("expected parsed verdict")
        };
        assert_eq!(p.feedback, "No feedback provided.");
        assert!(p.strengths.is_empty());
        assert_eq!(p.difficulty_adjustment, None);
    }

    #[test]
    fn keyword_score_is_case_insensitive() {
        let (score, matched) = keyword_score(&question(), "LOOKUP VALUE and Table Array");
        assert_eq!(matched, 2);
        assert_eq!(score, 50.0);
    }

    #[test]
    fn keyword_score_ignores_blank_keywords() {
        let mut q = question();
        q.keywords = vec![String::new(), "criteria".into()];
        assert_eq!(keyword_score(&q, "I have no idea"), (0.0, 0));
        assert_eq!(keyword_score(&q, "match the criteria"), (100.0, 1));

        let eval = fallback_evaluation(&q, "I have no idea", "offline".into());
        assert_eq!(eval.score, 0.0);
        assert!(eval.feedback.contains("(0/1)"));
    }

    #[test]
    fn keyword_score_without_keywords() {
        let mut q = question();
        q.keywords.clear();
        assert_eq!(keyword_score(&q, "anything").0, 0.0);
    }

    #[tokio::test]
    async fn model_verdict_is_used() {
        let ev = evaluator(ScriptedProvider::fixed(
            r#"{"score": 88, "feedback": "Strong answer", "strengths": ["precise"]}"#,
        ));
        let e = ev.evaluate(&question(), ANSWER).await;
        assert_eq!(e.score, 88.0);
        assert_eq!(e.source, EvaluationSource::Model);
        assert!(!e.is_degraded());
    }

    #[tokio::test]
    async fn out_of_range_score_falls_back() {
        let ev = evaluator(ScriptedProvider::fixed(r#"{"score": 250, "feedback": "!!!"}"#));
        let e = ev.evaluate(&question(), ANSWER).await;
        assert!(e.is_degraded());
        assert!(SCORE_RANGE.contains(&e.score));
        assert_eq!(e.score, 75.0);
        assert!(e.feedback.contains("degraded"));
    }

    #[tokio::test]
    async fn non_numeric_score_falls_back() {
        let ev = evaluator(ScriptedProvider::fixed(r#"{"score": "excellent"}"#));
        let e = ev.evaluate(&question(), ANSWER).await;
        assert!(e.is_degraded());
        assert!(SCORE_RANGE.contains(&e.score));
    }

    #[tokio::test]
    async fn upstream_failure_falls_back() {
        let ev = evaluator(ScriptedProvider::failing());
        let e = ev.evaluate(&question(), "no idea").await;
        assert!(e.is_degraded());
        assert_eq!(e.score, 0.0);
        assert!(e.improvements[0].contains("lookup value"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_falls_back() {
        let ev = Evaluator::new(LlmGateway::new(
            Arc::new(
                ScriptedProvider::fixed(r#"{"score": 99}"#).with_delay(Duration::from_secs(120)),
            ),
            GatewayConfig {
                timeout: Duration::from_secs(1),
                ..GatewayConfig::default()
            },
        ));
        let e = ev.evaluate(&question(), ANSWER).await;
        let EvaluationSource::Fallback { reason } = &e.source else {
            panic!("expected fallback")
        };
        assert!(reason.contains("timed out"));
    }

    #[tokio::test]
    async fn prompt_contains_question_and_answer() {
        let provider = Arc::new(ScriptedProvider::fixed(r#"{"score": 50}"#));
        let ev = Evaluator::new(LlmGateway::new(provider.clone(), GatewayConfig::default()));
        ev.evaluate(&question(), ANSWER).await;
        let req = provider.last_request().unwrap();
        assert!(req.prompt.contains("How does VLOOKUP work?"));
        assert!(req.prompt.contains(ANSWER));
        assert!(req.json_response);
    }
}
