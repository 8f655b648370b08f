//! The `cellcheck interview` command.
//!
//! Drives one session through the engine. Questions and per-answer feedback
//! go to stderr; the final result goes to stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use cellcheck_core::model::{Candidate, Question};
use cellcheck_core::{AnswerOutcome, Report};
use cellcheck_report::Format;

pub struct InterviewArgs {
    pub candidate: String,
    pub category: String,
    pub difficulty: String,
    pub count: i64,
    pub output: String,
    pub report: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub mock: bool,
}

pub async fn execute(args: InterviewArgs) -> Result<()> {
    let json_output = match args.output.as_str() {
        "text" => false,
        "json" => true,
        other => anyhow::bail!("unknown output format: {other} (expected text or json)"),
    };
    let report_format = match &args.report {
        Some(path) => Some(Format::from_path(path).with_context(|| {
            format!(
                "cannot infer report format from {} (use .json, .html or .md)",
                path.display()
            )
        })?),
        None => None,
    };

    let config = super::load_config(args.config.as_deref(), args.mock)?;
    let engine = config.build_engine()?;

    let created = engine
        .create_session(
            Candidate::named(args.candidate),
            &args.category,
            &args.difficulty,
            args.count,
        )
        .await?;
    let id = created.session_id;
    let prompt = engine.start_session(&id).await?;

    eprintln!(
        "Excel assessment: {} questions (provider: {})",
        prompt.total,
        engine.provider_name()
    );
    print_question(&prompt.question, prompt.number, prompt.total);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut answered = 0;
    let report = loop {
        let answer = match lines.next_line().await? {
            Some(line) if line.trim().is_empty() => continue,
            Some(line) => line,
            None => anyhow::bail!(
                "input ended after {answered} of {} answers",
                prompt.total
            ),
        };

        let outcome = engine.submit_answer(&id, answer, Some(answered)).await?;
        answered += 1;

        let evaluation = outcome.evaluation();
        eprintln!(
            "  Score: {:.1}/100{}",
            evaluation.score,
            if evaluation.is_degraded() { " (keyword fallback)" } else { "" }
        );
        eprintln!("  {}\n", evaluation.feedback);

        match outcome {
            AnswerOutcome::Questioning {
                next_question,
                number,
                total,
                follow_up,
                ..
            } => {
                if let Some(follow_up) = follow_up {
                    eprintln!("  Follow-up to consider: {follow_up}\n");
                }
                print_question(&next_question, number, total)
            }
            AnswerOutcome::Completed { report, .. } => break *report,
        }
    };

    if let (Some(path), Some(format)) = (&args.report, report_format) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, cellcheck_report::render(&report, format)?)
            .with_context(|| format!("failed to write report: {}", path.display()))?;
        eprintln!("Report saved to: {}", path.display());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_question(question: &Question, number: usize, total: usize) {
    eprintln!(
        "Question {number}/{total} [{}, {}]",
        question.category, question.difficulty
    );
    eprintln!("{}", question.text);
    eprint!("> ");
}

fn print_summary(report: &Report) {
    use comfy_table::{Cell, Table};

    println!(
        "{}: {:.1}/100 ({})",
        report.candidate, report.overall_score, report.proficiency
    );
    println!("{}", report.summary);
    if let Some(narrative) = &report.narrative {
        println!("\n{narrative}");
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Mean", "Questions", "Weight"]);
    for c in &report.categories {
        table.add_row(vec![
            Cell::new(c.category.display_name()),
            Cell::new(format!("{:.1}", c.mean)),
            Cell::new(c.count),
            Cell::new(format!("{:.2}", c.weight)),
        ]);
    }
    println!("\n{table}");

    for (title, items) in [
        ("Strengths", &report.strengths),
        ("Areas to improve", &report.weaknesses),
        ("Recommendations", &report.recommendations),
    ] {
        println!("\n{title}:");
        for item in items {
            println!("  - {item}");
        }
    }
}
