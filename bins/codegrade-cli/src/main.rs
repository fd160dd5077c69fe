mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codegrade")]
#[command(about = "codegrade CLI - Grade submissions against test suites", long_about = None)]
struct Cli {
    /// Grader config file (defaults to config/grader.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission against a test suite
    Grade {
        /// Submission source file
        #[arg(short, long)]
        source: PathBuf,

        /// Test suite file (JSON array of test cases, or {"test_cases": [...]})
        #[arg(short, long)]
        tests: PathBuf,

        /// Submission language
        #[arg(short, long, default_value = "javascript")]
        language: String,

        /// Per-test timeout in milliseconds (defaults to the configured budget)
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show which function would be graded
    Resolve {
        /// Submission source file
        #[arg(short, long)]
        source: PathBuf,
    },

    /// Write a default grader config
    Init {
        /// Project path
        #[arg(short, long, default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing config
        #[arg(long, default_value = "false")]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--json` output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            source,
            tests,
            language,
            timeout_ms,
            json,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let all_passed = commands::grade(&config, &source, &tests, &language, timeout_ms, json).await?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Resolve { source } => {
            commands::resolve(&source)?;
        }
        Commands::Init { path, force } => {
            commands::init_project(&path, force)?;
        }
    }

    Ok(())
}
