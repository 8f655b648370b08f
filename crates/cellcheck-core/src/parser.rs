//! TOML question bank parser.
//!
//! Loads custom question banks from TOML files and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::bank::QuestionBank;
use crate::model::{Difficulty, Question, SkillCategory};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    category: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    follow_up: Option<String>,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// Parse a single TOML file into a list of questions.
pub fn parse_questions(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    parse_questions_str(&content, path)
}

/// Parse a TOML string into questions (useful for testing).
pub fn parse_questions_str(content: &str, source_path: &Path) -> Result<Vec<Question>> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    parsed
        .questions
        .into_iter()
        .map(|q| {
            let category: SkillCategory = q
                .category
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            let difficulty: Difficulty = q
                .difficulty
                .parse()
                .map_err(|e: String| anyhow::anyhow!("question {}: {}", q.id, e))?;
            Ok(Question {
                id: q.id,
                text: q.text,
                category,
                difficulty,
                keywords: q.keywords,
                follow_up: q.follow_up,
            })
        })
        .collect()
}

/// Load a bank file and build a [`QuestionBank`] from it.
pub fn load_bank(path: &Path) -> Result<QuestionBank> {
    let questions = parse_questions(path)?;
    QuestionBank::new(questions)
        .with_context(|| format!("invalid question bank: {}", path.display()))
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a list of questions for issues that do not prevent loading but
/// weaken an interview.
pub fn validate_questions(questions: &[Question]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = std::collections::HashSet::new();
    for q in questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in questions {
        if q.text.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "question text is empty".into(),
            });
        }
        // fallback scoring has nothing to match against
        if q.keywords.is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "no keywords; fallback evaluations will score 0".into(),
            });
        }
        if q.keywords.iter().any(|k| k.trim().is_empty()) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "blank keyword; the bank will not load".into(),
            });
        }
    }

    for category in SkillCategory::ALL {
        if !questions.iter().any(|q| q.category == category) {
            warnings.push(ValidationWarning {
                question_id: None,
                message: format!("no questions for category {}", category.slug()),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[[questions]]
id = "sumif"
text = "Explain the difference between SUM and SUMIF."
category = "formulas"
difficulty = "easy"
keywords = ["SUM", "SUMIF", "criteria"]
follow_up = "What about SUMIFS?"

[[questions]]
id = "pivot"
text = "When would you use a pivot table?"
category = "Pivot Tables"
"#;

    #[test]
    fn parse_valid_toml() {
        let qs = parse_questions_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].category, SkillCategory::Formulas);
        assert_eq!(qs[0].follow_up.as_deref(), Some("What about SUMIFS?"));
        assert_eq!(qs[1].category, SkillCategory::PivotTables);
        assert_eq!(qs[1].difficulty, Difficulty::Medium);
    }

    #[test]
    fn parse_unknown_category() {
        let toml = r#"
[[questions]]
id = "x"
text = "Something"
category = "knitting"
"#;
        let err = parse_questions_str(toml, &PathBuf::from("bank.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown skill category"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_questions_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_reports_missing_keywords_and_categories() {
        let qs = parse_questions_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        let warnings = validate_questions(&qs);
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("pivot") && w.message.contains("keywords")));
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("no questions for category macros")));
    }

    #[test]
    fn validate_duplicate_ids() {
        let mut qs = parse_questions_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        qs[1].id = "sumif".into();
        let warnings = validate_questions(&qs);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
    }

    #[test]
    fn validate_flags_blank_keywords() {
        let mut qs = parse_questions_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        qs[0].keywords.push(String::new());
        let warnings = validate_questions(&qs);
        assert!(warnings
            .iter()
            .any(|w| w.question_id.as_deref() == Some("sumif") && w.message.contains("blank")));
    }

    #[test]
    fn load_bank_rejects_blank_keywords() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(
            &path,
            r#"
[[questions]]
id = "sumif"
text = "Explain SUMIF."
category = "formulas"
keywords = ["", "criteria"]
"#,
        )
        .unwrap();

        let err = load_bank(&path).unwrap_err();
        assert!(format!("{err:#}").contains("blank keyword"));
    }

    #[test]
    fn load_bank_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.toml");
        std::fs::write(&path, VALID_TOML).unwrap();

        let bank = load_bank(&path).unwrap();
        assert_eq!(bank.len(), 2);
        assert!(bank.get("sumif").is_some());
    }
}
