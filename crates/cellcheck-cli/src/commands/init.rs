//! The `cellcheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("cellcheck.toml").exists() {
        println!("cellcheck.toml already exists, skipping.");
    } else {
        std::fs::write("cellcheck.toml", SAMPLE_CONFIG)?;
        println!("Created cellcheck.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = std::path::Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export GROQ_API_KEY (or edit cellcheck.toml)");
    println!("  2. Run: cellcheck questions --bank question-banks/example.toml --validate");
    println!("  3. Run: cellcheck serve");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# cellcheck configuration

default_provider = "groq"
default_model = "meta-llama/llama-4-scout-17b-16e-instruct"
temperature = 0.3
max_tokens = 600
request_timeout_secs = 30
max_questions = 10
narrative = true
bind = "0.0.0.0:8000"
session_ttl_secs = 3600
# question_bank = "question-banks/example.toml"

[providers.groq]
type = "groq"
api_key = "${GROQ_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.mock]
type = "mock"

# Relative importance of each category in the overall score (default 1.0).
[weights]
formulas = 1.0
lookups = 1.0
"#;

const EXAMPLE_BANK: &str = r##"[[questions]]
id = "sumifs_multi"
text = "How would you total sales for one region and one quarter when the data has Region, Quarter and Amount columns?"
category = "formulas"
difficulty = "easy"
keywords = ["SUMIFS", "criteria", "range"]
follow_up = "How would the formula change if the quarter came from a cell?"

[[questions]]
id = "xlookup_missing"
text = "A lookup returns #N/A for some rows. How do you find out why and handle it?"
category = "lookups"
difficulty = "medium"
keywords = ["#N/A", "IFERROR", "XLOOKUP", "exact match", "TRIM"]

[[questions]]
id = "pivot_refresh"
text = "New rows were added below a pivot table's source data but the totals did not change. What happened?"
category = "pivot_tables"
difficulty = "medium"
keywords = ["refresh", "source range", "table", "dynamic"]
"##;
