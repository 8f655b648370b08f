//! The `cellcheck questions` command.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use comfy_table::{Cell, Table};

use cellcheck_core::model::{Difficulty, Question, SkillCategory};
use cellcheck_core::parser::{parse_questions, validate_questions};

pub fn execute(
    bank_path: Option<PathBuf>,
    category: Option<String>,
    difficulty: Option<String>,
    validate: bool,
) -> Result<()> {
    let questions: Vec<Question> = match &bank_path {
        Some(path) => parse_questions(path)?,
        None => cellcheck_core::bank::QuestionBank::builtin()
            .questions()
            .to_vec(),
    };

    if validate {
        return report_warnings(&questions, bank_path.is_some());
    }

    let category: Option<SkillCategory> = category
        .as_deref()
        .map(|c| c.parse().map_err(|e: String| anyhow!(e)))
        .transpose()?;
    let difficulty: Option<Difficulty> = difficulty
        .as_deref()
        .map(|d| d.parse().map_err(|e: String| anyhow!(e)))
        .transpose()?;

    let selected: Vec<&Question> = questions
        .iter()
        .filter(|q| category.map_or(true, |c| q.category == c))
        .filter(|q| difficulty.map_or(true, |d| q.difficulty == d))
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Category", "Difficulty", "Question"]);
    for q in &selected {
        table.add_row(vec![
            Cell::new(&q.id),
            Cell::new(q.category.display_name()),
            Cell::new(q.difficulty),
            Cell::new(&q.text),
        ]);
    }
    println!("{table}");
    println!("{} question(s)", selected.len());
    Ok(())
}

fn report_warnings(questions: &[Question], custom: bool) -> Result<()> {
    println!(
        "Question bank: {} ({} questions)",
        if custom { "custom" } else { "built-in" },
        questions.len()
    );

    let warnings = validate_questions(questions);
    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    // duplicate ids and blank keywords are fatal, the rest only weaken a bank
    cellcheck_core::bank::QuestionBank::new(questions.to_vec())?;

    if warnings.is_empty() {
        println!("Question bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }
    Ok(())
}
