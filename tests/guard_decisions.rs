//! End-to-end decision scenarios through the public `Guard` API.

use std::path::PathBuf;

use tempfile::TempDir;
use toolward::config::GuardConfig;
use toolward::guard::{Guard, ToolAction};

fn guard_with_rules(rules: &str) -> (Guard, TempDir) {
    let workspace = TempDir::new().expect("tempdir");
    std::fs::write(workspace.path().join(".toolwardignore"), rules).expect("write rules");
    let config = GuardConfig {
        workspace_dir: workspace.path().to_path_buf(),
        ..GuardConfig::default()
    };
    (Guard::new(config), workspace)
}

fn read(path: &str) -> ToolAction {
    ToolAction::Read { path: path.into() }
}

fn bash(command: &str) -> ToolAction {
    ToolAction::Command {
        command: command.into(),
    }
}

fn glob(pattern: &str) -> ToolAction {
    ToolAction::Enumerate {
        pattern: pattern.into(),
        path: None,
    }
}

#[test]
fn last_matching_rule_decides() {
    let (guard, _ws) = guard_with_rules("secrets/**\n!secrets/README.md\n");

    let decision = guard.decide("Read", &read("secrets/api.key"));
    assert!(decision.blocked);
    assert_eq!(decision.rule.as_deref(), Some("secrets/**"));

    let decision = guard.decide("Read", &read("secrets/README.md"));
    assert!(!decision.blocked);

    let decision = guard.decide("Read", &read("src/main.rs"));
    assert!(!decision.blocked);
}

#[test]
fn recognized_tooling_allows_compound_commands() {
    let (guard, _ws) = guard_with_rules("**/etc/**\n");
    let decision = guard.decide("Bash", &bash("npm run build && npm test"));
    assert!(!decision.blocked);
    assert!(decision.recognized_tooling);
}

#[test]
fn disallowed_tail_after_tooling_is_still_inspected() {
    let (guard, _ws) = guard_with_rules("**/etc/**\n");
    let decision = guard.decide("Bash", &bash("npm run build && cat ../../etc/secrets"));
    assert!(decision.blocked);
    assert_eq!(decision.path.as_deref(), Some("../../etc/secrets"));
    assert_eq!(decision.rule.as_deref(), Some("**/etc/**"));
}

#[test]
fn tooling_allow_is_not_fooled_by_separators_inside_one_segment() {
    // Without splitting first, the unanchored allow-grammar would match the
    // `npm run build` prefix of the whole string and mask the tail.
    let (guard, _ws) = guard_with_rules("**/etc/**\n");
    let decision = guard.decide("Bash", &bash("npm run build; cat /etc/passwd"));
    assert!(decision.blocked);
}

#[test]
fn executor_wrapped_command_is_unwrapped_before_judgement() {
    let (guard, _ws) = guard_with_rules("**/secrets/**\n");
    let decision = guard.decide("Bash", &bash("bash -c 'cat secrets/token.txt'"));
    assert!(decision.blocked);
    assert_eq!(decision.path.as_deref(), Some("secrets/token.txt"));
}

#[test]
fn broad_enumeration_is_bounced_with_suggestions() {
    let (guard, _ws) = guard_with_rules("");
    let decision = guard.decide("Glob", &glob("**/*"));
    assert!(decision.blocked);
    assert_eq!(decision.pattern.as_deref(), Some("**/*"));
    assert!(decision.reason.is_some());
    assert!(!decision.suggestions.is_empty());
}

#[test]
fn root_anchored_wide_open_enumeration_is_bounced() {
    let (guard, ws) = guard_with_rules("");

    // Anchored at the workspace root itself.
    let pattern = format!("{}/**/*", ws.path().display());
    let decision = guard.decide("Glob", &glob(&pattern));
    assert!(decision.blocked);
    assert!(!decision.suggestions.is_empty());

    // Anchored at some other absolute root.
    let decision = guard.decide("Glob", &glob("/home/user/repo/**/*"));
    assert!(decision.blocked);

    // A qualified tail under the workspace root stays allowed.
    let pattern = format!("{}/src/**/*.rs", ws.path().display());
    assert!(!guard.decide("Glob", &glob(&pattern)).blocked);
}

#[test]
fn scoped_enumeration_passes_breadth_and_rules() {
    let (guard, _ws) = guard_with_rules("secrets/**\n");
    let decision = guard.decide("Glob", &glob("src/**/*.rs"));
    assert!(!decision.blocked);
}

#[test]
fn enumeration_into_excluded_subtree_is_blocked_by_pattern_text() {
    let (guard, _ws) = guard_with_rules("secrets/**\n");
    let decision = guard.decide("Glob", &glob("secrets/**/*.key"));
    assert!(decision.blocked);
    assert_eq!(decision.rule.as_deref(), Some("secrets/**"));
}

#[test]
fn unreadable_rule_resource_fails_open() {
    let config = GuardConfig {
        workspace_dir: PathBuf::from("/nonexistent"),
        rules_file: PathBuf::from("/nonexistent/.toolwardignore"),
        ..GuardConfig::default()
    };
    let guard = Guard::new(config);
    assert!(!guard.decide("Read", &read("/etc/shadow")).blocked);
    assert!(!guard.decide("Bash", &bash("cat /etc/shadow")).blocked);
}

#[test]
fn directory_only_rule_blocks_reads_inside_it() {
    let (guard, _ws) = guard_with_rules("node_modules/\n.git/\n");
    assert!(
        guard
            .decide("Read", &read("node_modules/lodash/package.json"))
            .blocked
    );
    assert!(guard.decide("Read", &read(".git/config")).blocked);
    assert!(!guard.decide("Read", &read("src/git_helpers.rs")).blocked);
}

#[test]
fn command_referencing_multiple_paths_reports_the_first_block() {
    let (guard, _ws) = guard_with_rules("*.key\n");
    let decision = guard.decide("Bash", &bash("diff notes/a.txt certs/x.key certs/y.key"));
    assert!(decision.blocked);
    assert_eq!(decision.path.as_deref(), Some("certs/x.key"));
}

#[test]
fn wrapper_prefixed_tooling_is_recognized() {
    let (guard, _ws) = guard_with_rules("**\n");
    let decision = guard.decide("Bash", &bash("sudo CI=1 timeout 300 cargo test --all"));
    assert!(!decision.blocked);
    assert!(decision.recognized_tooling);
}

#[test]
fn unknown_command_without_paths_is_allowed_but_not_flagged_as_tooling() {
    let (guard, _ws) = guard_with_rules("secrets/**\n");
    let decision = guard.decide("Bash", &bash("uname -a"));
    assert!(!decision.blocked);
    assert!(!decision.recognized_tooling);
}
