//! Enumeration-breadth heuristics.
//!
//! A speed-of-context safeguard, not a security boundary: the goal is to
//! bounce "list every file everywhere" patterns back to the caller with
//! narrower alternatives before they flood the context window.

use std::path::Path;

/// Verdict of the breadth heuristic for one enumeration pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreadthVerdict {
    pub blocked: bool,
    pub reason: Option<String>,
    pub suggestions: Vec<String>,
}

impl BreadthVerdict {
    const OK: Self = Self {
        blocked: false,
        reason: None,
        suggestions: Vec::new(),
    };
}

/// Judge whether an enumeration pattern is likely to return an excessive
/// result set. Two shapes are flagged: unqualified recursive wildcards
/// (`**/*`) and root-anchored patterns with a wide-open recursive tail
/// (`/work/repo/**/*`). Patterns under `workspace_root` are judged by their
/// relative part, so `/work/repo/src/**/*` is as scoped as `src/**/*`.
/// Flagged patterns come with narrower equivalents so the caller can retry
/// without blind trial and error.
#[must_use]
pub fn assess(pattern: &str, workspace_root: Option<&Path>) -> BreadthVerdict {
    let trimmed = pattern.trim();

    if trimmed.starts_with('/') {
        if let Some(rest) = workspace_root
            .and_then(|root| Path::new(trimmed).strip_prefix(root).ok())
            .and_then(Path::to_str)
        {
            return assess_relative(pattern, rest);
        }
        // Absolute and not under the workspace: a recursive wildcard tail
        // enumerates an entire directory tree no matter what names the
        // leading segments carry.
        let body = trimmed.trim_start_matches('/');
        if !body.is_empty() && body.split('/').all(is_wildcard_segment) {
            return flagged(pattern);
        }
        if wide_open_tail(body) {
            return flagged(pattern);
        }
        return BreadthVerdict::OK;
    }

    let mut rest = trimmed;
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    assess_relative(pattern, rest)
}

fn assess_relative(pattern: &str, relative: &str) -> BreadthVerdict {
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        return BreadthVerdict::OK;
    }
    // Broad = every segment is pure wildcard: nothing qualifies the name,
    // the extension, or the subtree.
    if relative.split('/').all(is_wildcard_segment) {
        return flagged(pattern);
    }
    BreadthVerdict::OK
}

fn flagged(pattern: &str) -> BreadthVerdict {
    BreadthVerdict {
        blocked: true,
        reason: Some(format!(
            "pattern `{pattern}` would enumerate every file in an entire directory tree"
        )),
        suggestions: vec![
            "<subtree>/**/*".to_string(),
            "**/*.<extension>".to_string(),
        ],
    }
}

/// A segment with no constraining literal characters (`*`, `**`, `?`, `*?*`).
fn is_wildcard_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c == '*' || c == '?')
}

/// Whether the pattern ends in a run of pure-wildcard segments that includes
/// a recursive `**`.
fn wide_open_tail(body: &str) -> bool {
    let segments: Vec<&str> = body.split('/').collect();
    let tail_start = segments
        .iter()
        .rposition(|s| !is_wildcard_segment(s))
        .map_or(0, |i| i + 1);
    segments[tail_start..].iter().any(|s| *s == "**")
}
