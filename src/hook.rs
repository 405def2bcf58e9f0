//! Host-facing wire format and the fail-open hook entry point.
//!
//! The host process sends one JSON invocation per proposed action on stdin
//! and reads one JSON [`GuardDecision`] from stdout. The guard is a safety
//! net, not a primary correctness mechanism: malformed input, config
//! trouble, or any internal fault must produce an "allowed" decision rather
//! than an error. Stderr carries the logs; stdout stays a clean JSON
//! channel.

use std::io::{Read, Write};
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use crate::guard::{Guard, GuardDecision, ToolAction};

/// One invocation payload from the host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
    #[serde(default)]
    pub options: Option<HookOptions>,
}

/// The heterogeneous action description. The same payload slot carries
/// every tool's arguments; only the fields relevant here are modeled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    /// Target path of a direct read.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Non-target path (search root, working directory).
    #[serde(default)]
    pub path: Option<String>,
    /// Enumeration pattern.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Free-form command text.
    #[serde(default)]
    pub command: Option<String>,
}

/// Per-invocation option overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookOptions {
    #[serde(default)]
    pub rules_file: Option<String>,
    #[serde(default)]
    pub check_broad_patterns: Option<bool>,
}

/// Map an invocation onto the action tagged union. Precedence when several
/// fields are present: command text, then pattern, then target path, then
/// other path — the most specific description of what the tool will do.
#[must_use]
pub fn action_from_input(input: &ToolInput) -> Option<ToolAction> {
    if let Some(command) = &input.command {
        return Some(ToolAction::Command {
            command: command.clone(),
        });
    }
    if let Some(pattern) = &input.pattern {
        return Some(ToolAction::Enumerate {
            pattern: pattern.clone(),
            path: input.path.clone(),
        });
    }
    if let Some(path) = &input.file_path {
        return Some(ToolAction::Read { path: path.clone() });
    }
    if let Some(path) = &input.path {
        return Some(ToolAction::Inspect { path: path.clone() });
    }
    None
}

/// Decide one parsed invocation. An action-less payload is allowed: there is
/// nothing to judge.
#[must_use]
pub fn decide_input(config: &GuardConfig, input: &HookInput) -> GuardDecision {
    let options = input.options.clone().unwrap_or_default();
    let effective = config.with_overrides(
        options.rules_file.as_deref(),
        options.check_broad_patterns,
    );

    let Some(action) = input.tool_input.as_ref().and_then(action_from_input) else {
        debug!("no action in payload, allowing");
        return GuardDecision::allowed();
    };

    let tool_name = input.tool_name.as_deref().unwrap_or("unknown");
    Guard::new(effective).decide(tool_name, &action)
}

/// Read one invocation from `reader`, write one decision to `writer`.
///
/// Every failure mode — unreadable stdin, malformed JSON, a panic inside the
/// decision computation — collapses to an "allowed" decision.
pub fn run_hook(config: &GuardConfig, reader: &mut impl Read, writer: &mut impl Write) {
    let decision = read_and_decide(config, reader);
    let json = serde_json::to_string(&decision)
        .unwrap_or_else(|_| r#"{"blocked":false}"#.to_string());
    if let Err(e) = writeln!(writer, "{json}") {
        warn!(error = %e, "failed to write decision");
    }
}

fn read_and_decide(config: &GuardConfig, reader: &mut impl Read) -> GuardDecision {
    let mut raw = String::new();
    if let Err(e) = reader.read_to_string(&mut raw) {
        warn!(error = %e, "unreadable invocation payload, allowing");
        return GuardDecision::allowed();
    }

    let input: HookInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(e) => {
            warn!(error = %e, "malformed invocation payload, allowing");
            return GuardDecision::allowed();
        }
    };

    // Outermost fail-open boundary: a fault in the guard's own machinery
    // must never block a legitimate action.
    catch_unwind(AssertUnwindSafe(|| decide_input(config, &input))).unwrap_or_else(|_| {
        warn!("decision computation panicked, allowing");
        GuardDecision::allowed()
    })
}
