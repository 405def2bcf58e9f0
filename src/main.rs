#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, warn};
use tracing_subscriber::FmtSubscriber;

use toolward::cli::{Cli, Commands};
use toolward::config::GuardConfig;
use toolward::error::RuleError;
use toolward::guard::rules::PatternRule;
use toolward::guard::{Guard, ToolAction};
use toolward::hook;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs on stderr; stdout is the decision channel.
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: logging already initialized");
    }

    let workspace = cli
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Config trouble must not block the host: fall back to defaults.
    let mut config = GuardConfig::load(&workspace).unwrap_or_else(|e| {
        warn!(error = %e, "config load failed, using defaults");
        GuardConfig {
            workspace_dir: workspace.clone(),
            ..GuardConfig::default()
        }
    });
    if let Some(rules_file) = &cli.rules_file {
        config.rules_file.clone_from(rules_file);
    }
    if cli.no_broad_check {
        config.check_broad_patterns = false;
    }
    config.validate();

    match cli.command {
        None => {
            hook::run_hook(&config, &mut std::io::stdin().lock(), &mut std::io::stdout());
            ExitCode::SUCCESS
        }
        Some(Commands::Check {
            tool,
            path,
            pattern,
            command,
        }) => run_check(&config, &tool, path, pattern, command),
        Some(Commands::Rules { file }) => run_rules(&config, file),
    }
}

/// Evaluate one action described by flags and print the decision.
/// Exits non-zero on a block so shell scripts can branch on it.
fn run_check(
    config: &GuardConfig,
    tool: &str,
    path: Option<String>,
    pattern: Option<String>,
    command: Option<String>,
) -> ExitCode {
    let action = if let Some(command) = command {
        ToolAction::Command { command }
    } else if let Some(pattern) = pattern {
        ToolAction::Enumerate { pattern, path }
    } else if let Some(path) = path {
        ToolAction::Read { path }
    } else {
        eprintln!("nothing to check: pass --path, --pattern, or --command");
        return ExitCode::FAILURE;
    };

    let decision = Guard::new(config.clone()).decide(tool, &action);
    let blocked = decision.blocked;
    match serde_json::to_string_pretty(&decision) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to serialize decision: {e}");
            return ExitCode::FAILURE;
        }
    }
    if blocked { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Report how many lines of a rule file compiled into rules, and which
/// lines the guard would silently skip. The guard itself stays fail-open;
/// this is where a hard report is wanted.
fn run_rules(config: &GuardConfig, file: Option<PathBuf>) -> ExitCode {
    let path = file.unwrap_or_else(|| config.resolved_rules_file());
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            let err = RuleError::Unreadable(format!("{}: {e}", path.display()));
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let total = text.lines().count();
    let mut compiled = 0usize;
    let mut problems = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match PatternRule::try_parse(line) {
            Ok(Some(_)) => compiled += 1,
            Ok(None) => {}
            Err(e) => problems.push(RuleError::InvalidPattern {
                line: idx + 1,
                pattern: line.trim().to_string(),
                message: e.to_string(),
            }),
        }
    }

    println!(
        "{}: {compiled} rules compiled from {total} lines",
        path.display()
    );
    for problem in &problems {
        eprintln!("{problem}");
    }
    if problems.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
