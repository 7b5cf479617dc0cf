//! # quest-cli
//!
//! Command-line interface for Quest goal specifications.
//!
//! - `quest validate <file> [--repair]` — field-scoped validation, optionally
//!   after the repair pass
//! - `quest expand <file> [--edits <file>]` — preview occurrences, applying
//!   stored and proposed overrides
//! - `quest frequency <file> ...` — CountRule / rolling-window checks
//! - `quest verify <goal-type> <evidence-file>` — evaluate proof evidence
//! - `quest policy check/list/alignment` — verification policy registry
//!
//! Results are printed to stdout as pretty JSON; logs go to stderr.

mod commands;
mod config;
mod document;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::QuestConfig;

/// Quest CLI — validate goals, preview schedules and check evidence.
#[derive(Parser)]
#[command(name = "quest", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a goal specification (JSON or YAML).
    Validate {
        file: PathBuf,
        /// Run the repair heuristics before validating.
        #[arg(long)]
        repair: bool,
    },
    /// Preview the occurrences of a schedule goal.
    Expand {
        file: PathBuf,
        /// Override edits to apply on top of the stored ones.
        #[arg(long)]
        edits: Option<PathBuf>,
    },
    /// Check a goal against a frequency rule.
    Frequency(commands::frequency::FrequencyArgs),
    /// Evaluate verification evidence for a goal type.
    Verify {
        /// schedule, frequency or partner (anything else uses the frequency rule).
        goal_type: String,
        evidence: PathBuf,
        /// Evaluation instant (RFC 3339). Defaults to now.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Query the verification policy registry.
    Policy {
        #[command(subcommand)]
        command: commands::policy::PolicyCommands,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interfere with JSON on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("quest_cli=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = QuestConfig::for_project(&project_root);

    match &cli.command {
        Commands::Validate { file, repair } => commands::validate::execute(file, *repair),
        Commands::Expand { file, edits } => {
            commands::expand::execute(file, edits.as_deref(), &config)
        }
        Commands::Frequency(args) => commands::frequency::execute(args, &config),
        Commands::Verify {
            goal_type,
            evidence,
            at,
        } => commands::verify::execute(goal_type, evidence, *at, &config),
        Commands::Policy { command } => commands::policy::execute(command, &config),
    }
}
