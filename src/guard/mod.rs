//! The tool-call guard: one allow/block verdict per proposed agent action.
//!
//! Each [`Guard::decide`] call is a synchronous, side-effect-free
//! computation over its inputs (aside from reading the rule resource, which
//! is re-read per call and never cached across calls). Invocations share no
//! state and may run concurrently without coordination.

pub mod breadth;
pub mod command;
pub mod extract;
pub mod rules;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GuardConfig;
use rules::RuleSet;

/// One proposed agent action, as a tagged union over the shapes the host
/// sends: a target-path read, a non-target path (e.g. a search root), a
/// pattern-based enumeration, or free-form command text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction {
    /// Direct read of one target path.
    Read { path: String },
    /// A path the action touches without reading it as its target
    /// (search roots, working directories).
    Inspect { path: String },
    /// Pattern-based file enumeration, optionally scoped to a root.
    Enumerate {
        pattern: String,
        path: Option<String>,
    },
    /// Free-form shell command text.
    Command { command: String },
}

/// The externally visible verdict. Serialized flat, absent fields omitted,
/// so the host can branch on `blocked` and log the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardDecision {
    pub blocked: bool,
    /// The offending path, for a path-exclusion block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// The rule line that decided a path-exclusion block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    /// The flagged pattern, for a breadth block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Why the pattern was flagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Narrower replacement patterns the caller can retry with.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Set when the allow verdict came from every sub-command matching the
    /// tooling allow-grammar.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recognized_tooling: bool,
}

impl GuardDecision {
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            blocked: false,
            path: None,
            rule: None,
            pattern: None,
            reason: None,
            suggestions: Vec::new(),
            recognized_tooling: false,
        }
    }

    #[must_use]
    pub fn allowed_as_tooling() -> Self {
        Self {
            recognized_tooling: true,
            ..Self::allowed()
        }
    }

    #[must_use]
    pub fn blocked_path(path: String, rule: String) -> Self {
        Self {
            blocked: true,
            path: Some(path),
            rule: Some(rule),
            ..Self::allowed()
        }
    }

    #[must_use]
    pub fn blocked_pattern(pattern: String, reason: String, suggestions: Vec<String>) -> Self {
        Self {
            blocked: true,
            pattern: Some(pattern),
            reason: Some(reason),
            suggestions,
            ..Self::allowed()
        }
    }
}

/// The decision engine. Holds only configuration; all per-call state is
/// local to [`Guard::decide`].
#[derive(Debug, Clone)]
pub struct Guard {
    config: GuardConfig,
}

impl Guard {
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Decide whether one proposed action may proceed.
    ///
    /// Steps, each short-circuiting where it can: unwrap a shell executor;
    /// split command text and classify each sub-command (an all-allowed
    /// command returns before any path inspection — the allow-grammar is
    /// unanchored at the line end, so it must only ever see single
    /// sub-commands); run the breadth heuristic for enumerations; then
    /// extract candidate paths and match them against the rule set.
    #[must_use]
    pub fn decide(&self, tool_name: &str, action: &ToolAction) -> GuardDecision {
        // Steps 1-2: command normalization and classification. The action
        // itself is never mutated; a narrowed copy carries the non-allowed
        // remainder into path inspection.
        let narrowed: Option<ToolAction> = match action {
            ToolAction::Command { command } => {
                let unwrapped = command::unwrap_executor(command);
                let sub_commands = command::split(&unwrapped);
                let (recognized, rest): (Vec<_>, Vec<_>) = sub_commands
                    .into_iter()
                    .partition(|sub| command::is_recognized_tooling(sub));

                if rest.is_empty() && !recognized.is_empty() {
                    debug!(tool = tool_name, "allowed: all sub-commands recognized as tooling");
                    return GuardDecision::allowed_as_tooling();
                }
                if rest.is_empty() {
                    // Empty command text: nothing to classify, nothing to
                    // extract paths from either.
                    None
                } else {
                    Some(ToolAction::Command {
                        command: rest.join(" && "),
                    })
                }
            }
            _ => None,
        };
        let action = narrowed.as_ref().unwrap_or(action);

        // Step 3: breadth heuristic, before rule loading (cheaper and
        // independent of the rule set).
        if self.config.check_broad_patterns {
            if let ToolAction::Enumerate { pattern, .. } = action {
                let verdict = breadth::assess(pattern, Some(&self.config.workspace_dir));
                if verdict.blocked {
                    warn!(tool = tool_name, pattern = %pattern, "blocked: enumeration too broad");
                    return GuardDecision::blocked_pattern(
                        pattern.clone(),
                        verdict.reason.unwrap_or_default(),
                        verdict.suggestions,
                    );
                }
            }
        }

        // Step 4: rule set (fail-open on load failure) and path extraction.
        let rule_set = RuleSet::load(&self.config.resolved_rules_file());
        let candidates = extract::extract(action);
        if candidates.is_empty() {
            return GuardDecision::allowed();
        }

        // Step 5: first blocking match wins, in extraction order.
        for candidate in candidates {
            let matched = rule_set.match_path(&candidate);
            if matched.blocked {
                let rule = matched.rule.unwrap_or_default();
                warn!(
                    tool = tool_name,
                    path = %candidate,
                    rule = %rule,
                    "blocked: path matches exclusion rule"
                );
                return GuardDecision::blocked_path(candidate, rule);
            }
        }

        GuardDecision::allowed()
    }
}
