//! Markdown report generator.

use anyhow::Result;
use std::path::Path;

use cellcheck_core::report::Report;

/// Table cells cannot contain raw pipes or newlines.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Generate a markdown summary of an assessment report.
pub fn generate_markdown(report: &Report) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Excel assessment: {}\n\n", report.candidate));
    md.push_str(&format!(
        "**Overall:** {:.1}/100 ({})  \n**Focus:** {} ({})  \n**Duration:** {} min  \n**Date:** {}\n\n",
        report.overall_score,
        report.proficiency,
        report.skill_category.display_name(),
        report.difficulty,
        report.duration_minutes(),
        report.created_at.format("%Y-%m-%d %H:%M UTC"),
    ));

    md.push_str(&report.summary);
    md.push_str("\n\n");
    if let Some(narrative) = &report.narrative {
        for line in narrative.lines() {
            md.push_str(&format!("> {line}\n"));
        }
        md.push('\n');
    }

    if !report.categories.is_empty() {
        md.push_str("## Categories\n\n");
        md.push_str("| Category | Mean | Questions | Weight |\n");
        md.push_str("|----------|------|-----------|--------|\n");
        for c in &report.categories {
            md.push_str(&format!(
                "| {} | {:.1} | {} | {:.2} |\n",
                c.category.display_name(),
                c.mean,
                c.count,
                c.weight
            ));
        }
        md.push('\n');
    }

    md.push_str("## Questions\n\n");
    md.push_str("| # | Category | Score | Feedback |\n");
    md.push_str("|---|----------|-------|----------|\n");
    for q in &report.questions {
        md.push_str(&format!(
            "| {} | {} | {:.1}{} | {} |\n",
            q.index + 1,
            q.category.display_name(),
            q.score,
            if q.degraded { "*" } else { "" },
            cell(&q.feedback)
        ));
    }
    if report.degraded_evaluations > 0 {
        md.push_str("\n\\* scored by keyword coverage\n");
    }
    md.push('\n');

    for (title, items) in [
        ("Strengths", &report.strengths),
        ("Areas to improve", &report.weaknesses),
        ("Recommendations", &report.recommendations),
    ] {
        md.push_str(&format!("## {title}\n\n"));
        for item in items {
            md.push_str(&format!("- {item}\n"));
        }
        md.push('\n');
    }

    md
}

/// Write a markdown report to a file.
pub fn write_markdown_report(report: &Report, path: &Path) -> Result<()> {
    let md = generate_markdown(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, md)?;
    Ok(())
}
