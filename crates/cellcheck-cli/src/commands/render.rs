//! The `cellcheck render` command.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use cellcheck_core::Report;
use cellcheck_report::Format;

pub fn execute(report_path: PathBuf, format: String, output: Option<PathBuf>) -> Result<()> {
    let format: Format = format.parse().map_err(|e: String| anyhow!(e))?;
    let report = Report::load_json(&report_path)
        .with_context(|| format!("failed to load report: {}", report_path.display()))?;
    let rendered = cellcheck_report::render(&report, format)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, rendered)?;
            eprintln!("Report written to: {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
