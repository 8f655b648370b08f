//! cellcheck CLI: run the assessment server or an interview in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cellcheck", version, about = "LLM-backed Excel interview assessment")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides config and PORT)
        #[arg(long)]
        bind: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Answer with the mock provider instead of a real LLM
        #[arg(long)]
        mock: bool,
    },

    /// Run an interview in the terminal, one answer per line on stdin
    Interview {
        /// Candidate name
        #[arg(long)]
        candidate: String,

        /// Focus skill category (e.g. formulas, lookups, pivot_tables)
        #[arg(long, default_value = "formulas")]
        category: String,

        /// Starting difficulty: easy, medium, hard
        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Number of questions
        #[arg(long, default_value = "5")]
        count: i64,

        /// Final output: text or json
        #[arg(long, default_value = "text")]
        output: String,

        /// Also write the report to this file (format from extension)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Answer with the mock provider instead of a real LLM
        #[arg(long)]
        mock: bool,
    },

    /// List or validate interview questions
    Questions {
        /// Question bank TOML (defaults to the built-in bank)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Only show this category
        #[arg(long)]
        category: Option<String>,

        /// Only show this difficulty
        #[arg(long)]
        difficulty: Option<String>,

        /// Report bank problems instead of listing questions
        #[arg(long)]
        validate: bool,
    },

    /// Render a saved JSON report as html or markdown
    Render {
        /// Report JSON file
        #[arg(long)]
        report: PathBuf,

        /// Output format: json, html, markdown
        #[arg(long, default_value = "html")]
        format: String,

        /// Output file (stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cellcheck=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { bind, config, mock } => commands::serve::execute(bind, config, mock).await,
        Commands::Interview {
            candidate,
            category,
            difficulty,
            count,
            output,
            report,
            config,
            mock,
        } => {
            commands::interview::execute(commands::interview::InterviewArgs {
                candidate,
                category,
                difficulty,
                count,
                output,
                report,
                config,
                mock,
            })
            .await
        }
        Commands::Questions {
            bank,
            category,
            difficulty,
            validate,
        } => commands::questions::execute(bank, category, difficulty, validate),
        Commands::Render {
            report,
            format,
            output,
        } => commands::render::execute(report, format, output),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
