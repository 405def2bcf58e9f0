use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// toolward — allow/block guard for autonomous-agent tool calls.
///
/// Without a subcommand it runs in hook mode: one JSON invocation on stdin,
/// one JSON decision on stdout.
#[derive(Debug, Parser)]
#[command(name = "toolward", version, about)]
pub struct Cli {
    /// Location of the gitignore-style rule resource.
    #[arg(long, global = true)]
    pub rules_file: Option<PathBuf>,

    /// Workspace directory relative paths resolve against.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Disable the enumeration-breadth heuristic.
    #[arg(long, global = true)]
    pub no_broad_check: bool,

    /// Increase log verbosity (-v: debug, -vv: trace). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate one action from flags instead of stdin.
    Check {
        /// Tool name the action belongs to (Read, Glob, Grep, Bash, …).
        #[arg(long, default_value = "Bash")]
        tool: String,

        /// Target path of a direct read.
        #[arg(long, conflicts_with_all = ["pattern", "exec"])]
        path: Option<String>,

        /// Enumeration pattern.
        #[arg(long, conflicts_with = "exec")]
        pattern: Option<String>,

        /// Command text.
        #[arg(long = "command", id = "exec")]
        command: Option<String>,
    },

    /// Parse a rule file and report compiled and skipped line counts.
    Rules {
        /// Rule file to inspect; defaults to the configured rule resource.
        file: Option<PathBuf>,
    },
}
