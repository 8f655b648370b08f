//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use cellcheck_core::report::Report;
use cellcheck_core::statistics::CategoryScore;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn score_class(score: f64) -> &'static str {
    if score >= 75.0 {
        "good"
    } else if score >= 60.0 {
        "fair"
    } else {
        "poor"
    }
}

/// Generate an HTML page from an assessment report.
pub fn generate_html(report: &Report) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>cellcheck report: {}</title>\n",
        html_escape(&report.candidate)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Excel skills assessment</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Candidate: <strong>{}</strong> | {} ({}) | {} questions | {} min | {}</p>\n",
        html_escape(&report.candidate),
        html_escape(report.skill_category.display_name()),
        report.difficulty,
        report.questions.len(),
        report.duration_minutes(),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p class=\"score {}\"><span class=\"value\">{:.1}</span>/100 <span class=\"level\">{}</span></p>\n",
        score_class(report.overall_score),
        report.overall_score,
        report.proficiency
    ));
    html.push_str(&format!("<p>{}</p>\n", html_escape(&report.summary)));
    if let Some(narrative) = &report.narrative {
        html.push_str(&format!(
            "<blockquote class=\"narrative\">{}</blockquote>\n",
            html_escape(narrative)
        ));
    }
    if report.degraded_evaluations > 0 {
        html.push_str(&format!(
            "<p class=\"warning\">{} of {} answers were scored by keyword coverage because automated review was unavailable.</p>\n",
            report.degraded_evaluations,
            report.questions.len()
        ));
    }

    if !report.categories.is_empty() {
        html.push_str("<h3>By category</h3>\n");
        html.push_str(&generate_bar_chart(&report.categories));
    }
    html.push_str("</section>\n");

    // Strengths, weaknesses, recommendations
    html.push_str("<section class=\"feedback\">\n");
    for (title, items) in [
        ("Strengths", &report.strengths),
        ("Areas to improve", &report.weaknesses),
        ("Recommendations", &report.recommendations),
    ] {
        html.push_str(&format!("<div>\n<h3>{title}</h3>\n<ul>\n"));
        for item in items {
            html.push_str(&format!("<li>{}</li>\n", html_escape(item)));
        }
        html.push_str("</ul>\n</div>\n");
    }
    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Category</th><th onclick=\"sortTable(2)\">Question</th><th onclick=\"sortTable(3)\">Score</th><th>Feedback</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for q in &report.questions {
        let marker = if q.degraded { " *" } else { "" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{:.1}{}</td><td>{}</td></tr>\n",
            score_class(q.score),
            q.index + 1,
            html_escape(q.category.display_name()),
            html_escape(&q.question),
            q.score,
            marker,
            html_escape(&q.feedback)
        ));
    }

    html.push_str("</tbody></table>\n");
    if report.degraded_evaluations > 0 {
        html.push_str("<p class=\"meta\">* scored by keyword coverage</p>\n");
    }
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &Report, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart(categories: &[CategoryScore]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 240;

    let total_height = categories.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, c) in categories.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let fraction = (c.mean / 100.0).clamp(0.0, 1.0);
        let width = (fraction * max_width as f64) as usize;

        let color = if c.mean >= 75.0 {
            "#22c55e"
        } else if c.mean >= 60.0 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(c.category.display_name())
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1} ({} q)</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            c.mean,
            c.count
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --good: #dcfce7; --fair: #fef9c3; --poor: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --good: #064e3b; --fair: #713f12; --poor: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 1.5rem; }
.score .value { font-size: 3rem; font-weight: bold; }
.score .level { margin-left: 1rem; padding: 0.25rem 0.75rem; border-radius: 999px; background: var(--border); }
.narrative { border-left: 4px solid var(--border); margin: 1rem 0; padding: 0.5rem 1rem; font-style: italic; }
.warning { color: #b45309; }
.feedback { display: flex; flex-wrap: wrap; gap: 2rem; }
.feedback > div { flex: 1 1 16rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.good { background: var(--good); }
.fair { background: var(--fair); }
.poor { background: var(--poor); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = parseFloat(va), nb = parseFloat(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;
