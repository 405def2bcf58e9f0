//! Candidate-path extraction from action descriptions.
//!
//! For path and pattern fields the value is yielded directly (patterns are
//! not glob-expanded; the matcher itself understands globs). For command
//! text a best-effort token scan collects path-shaped arguments. The scan
//! deliberately under-extracts: a missed path is a potential false allow a
//! log reviewer can still catch, while a misidentified non-path blocks a
//! legitimate workflow outright.

use super::ToolAction;
use super::command::{strip_quotes, tokenize};

/// Shell operator tokens that can never be paths.
const OPERATOR_TOKENS: &[&str] = &["&&", "||", ";", "|", "&", ">", ">>", "<", "<<", "2>", "2>>"];

/// Produce the candidate filesystem paths an action references, in order.
#[must_use]
pub fn extract(action: &ToolAction) -> Vec<String> {
    match action {
        ToolAction::Read { path } | ToolAction::Inspect { path } => vec![path.clone()],
        ToolAction::Enumerate { pattern, path } => {
            let mut candidates = vec![pattern.clone()];
            if let Some(root) = path {
                candidates.push(root.clone());
            }
            candidates
        }
        ToolAction::Command { command } => extract_from_command(command),
    }
}

/// Scan command text for path-shaped arguments.
fn extract_from_command(command: &str) -> Vec<String> {
    tokenize(command)
        .iter()
        .map(|t| strip_quotes(t))
        .filter(|t| is_path_shaped(t))
        .map(ToString::to_string)
        .collect()
}

/// Conservative judgement of whether a token names a filesystem path.
fn is_path_shaped(token: &str) -> bool {
    if token.is_empty()
        || token.starts_with('-')
        || OPERATOR_TOKENS.contains(&token)
        || token.contains("://")
        || token.contains('=')
        || token.contains('$')
    {
        return false;
    }
    if token.starts_with('/')
        || token.starts_with("./")
        || token.starts_with("../")
        || token.starts_with("~/")
    {
        return true;
    }
    // Bare relative paths: require a separator plus a dotted final segment,
    // so `origin/main` or `feature/login` branch names are not mistaken for
    // files.
    if let Some((_, last)) = token.rsplit_once('/') {
        return last.contains('.');
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str) -> ToolAction {
        ToolAction::Command {
            command: text.to_string(),
        }
    }

    #[test]
    fn read_action_yields_its_path() {
        let action = ToolAction::Read {
            path: "/etc/passwd".into(),
        };
        assert_eq!(extract(&action), vec!["/etc/passwd"]);
    }

    #[test]
    fn enumerate_action_yields_pattern_and_root() {
        let action = ToolAction::Enumerate {
            pattern: "**/*.pem".into(),
            path: Some("certs".into()),
        };
        assert_eq!(extract(&action), vec!["**/*.pem", "certs"]);
    }

    #[test]
    fn command_absolute_and_relative_paths_are_extracted() {
        assert_eq!(
            extract(&command("cat /etc/shadow ../secrets/key.pem")),
            vec!["/etc/shadow", "../secrets/key.pem"]
        );
        assert_eq!(extract(&command("head ./notes.txt")), vec!["./notes.txt"]);
        assert_eq!(extract(&command("cat ~/.ssh/id_rsa")), vec!["~/.ssh/id_rsa"]);
    }

    #[test]
    fn flags_and_operators_are_not_paths() {
        assert!(extract(&command("ls -la --color=auto")).is_empty());
        assert_eq!(
            extract(&command("grep -r TODO src/lib.rs")),
            vec!["src/lib.rs"]
        );
    }

    #[test]
    fn urls_and_assignments_are_not_paths() {
        assert!(extract(&command("curl https://example.com/a/b.txt")).is_empty());
        assert!(extract(&command("make TARGET=dist/out.bin")).is_empty());
    }

    #[test]
    fn git_refs_are_not_mistaken_for_paths() {
        assert!(extract(&command("git log origin/main")).is_empty());
        assert!(extract(&command("git checkout feature/login")).is_empty());
    }

    #[test]
    fn dotted_relative_paths_are_extracted() {
        assert_eq!(
            extract(&command("wc -l src/guard/rules.rs")),
            vec!["src/guard/rules.rs"]
        );
    }

    #[test]
    fn quoted_paths_are_extracted_without_quotes() {
        assert_eq!(
            extract(&command("cat '/tmp/a file.txt'")),
            vec!["/tmp/a file.txt"]
        );
    }

    #[test]
    fn bare_words_are_not_paths() {
        assert!(extract(&command("echo hello world")).is_empty());
    }

    #[test]
    fn variable_expansions_are_left_alone() {
        assert!(extract(&command("cat $HOME/secret")).is_empty());
    }
}
