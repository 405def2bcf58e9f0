use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, warn};

/// One compiled ignore-style rule.
///
/// Rules keep their source text so a block verdict can report exactly which
/// line decided it.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Original line, as written in the rule resource.
    pub source: String,
    /// `!`-prefixed rules re-allow paths blocked by earlier rules.
    pub negated: bool,
    /// Trailing-`/` rules match a directory and everything beneath it.
    pub dir_only: bool,
    /// Matches the path itself.
    matcher: GlobMatcher,
    /// Matches anything beneath a matched directory.
    descendant_matcher: GlobMatcher,
}

impl PatternRule {
    /// Parse one line of the rule resource.
    ///
    /// Returns `None` for blank lines, comments, and lines whose glob does
    /// not compile. Malformed lines are skipped with a warning rather than
    /// failing the whole rule set.
    pub fn parse(line: &str) -> Option<Self> {
        match Self::try_parse(line) {
            Ok(rule) => rule,
            Err(e) => {
                warn!(pattern = %line.trim_end(), error = %e, "skipping malformed rule line");
                None
            }
        }
    }

    /// Parse one line, distinguishing non-rules (`Ok(None)`) from lines
    /// whose glob does not compile. The `rules` CLI uses the error branch to
    /// report exactly which lines the guard would silently skip.
    pub fn try_parse(line: &str) -> Result<Option<Self>, globset::Error> {
        let source = line.trim_end();
        let mut pattern = source.trim();
        if pattern.is_empty() || pattern.starts_with('#') {
            return Ok(None);
        }

        let negated = if let Some(rest) = pattern.strip_prefix('!') {
            pattern = rest;
            true
        } else {
            false
        };

        let dir_only = if let Some(rest) = pattern.strip_suffix('/') {
            pattern = rest;
            true
        } else {
            false
        };

        if pattern.is_empty() {
            return Ok(None);
        }

        // A slash anywhere but the end anchors the pattern at the rule-file
        // root; otherwise it matches at any depth (gitignore semantics).
        let anchored = pattern.starts_with('/') || pattern.contains('/');
        let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
        let glob_text = if anchored {
            pattern.to_string()
        } else {
            format!("**/{pattern}")
        };

        let compile = |text: &str| {
            GlobBuilder::new(text)
                .literal_separator(true)
                .build()
                .map(|g| g.compile_matcher())
        };

        let matcher = compile(&glob_text)?;
        let descendant_matcher = compile(&format!("{glob_text}/**"))?;

        Ok(Some(Self {
            source: source.to_string(),
            negated,
            dir_only,
            matcher,
            descendant_matcher,
        }))
    }

    /// Whether this rule matches the (already normalized) path.
    ///
    /// A rule that names a directory also matches everything beneath it. A
    /// directory-only rule additionally matches the bare directory path
    /// itself: without filesystem access the matcher cannot tell a file from
    /// a directory, and matching the name is the conservative choice for a
    /// block list.
    fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path) || self.descendant_matcher.is_match(path)
    }
}

/// Outcome of matching one path against a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub blocked: bool,
    /// Source text of the rule that decided the outcome, when one matched.
    pub rule: Option<String>,
}

impl RuleMatch {
    const ALLOWED: Self = Self {
        blocked: false,
        rule: None,
    };
}

/// An ordered, compiled ignore-style rule set.
///
/// Order is significant: the last rule that matches a path decides its
/// verdict, so a later `!`-rule can re-allow what an earlier rule blocked.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<PatternRule>,
}

impl RuleSet {
    /// Compile rule lines in file order, skipping non-rules.
    #[must_use]
    pub fn compile<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let rules = lines.into_iter().filter_map(PatternRule::parse).collect();
        Self { rules }
    }

    /// Load and compile the rule resource.
    ///
    /// Fail-open: a missing or unreadable file yields the empty rule set, so
    /// the pattern layer blocks nothing while the other checks still run.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let set = Self::compile(text.lines());
                debug!(path = %path.display(), rules = set.len(), "compiled rule set");
                set
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "rule resource unreadable, using empty set");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a path against the rule set; the last matching rule wins.
    #[must_use]
    pub fn match_path(&self, path: &str) -> RuleMatch {
        let normalized = normalize_for_match(path);
        let mut last: Option<&PatternRule> = None;
        for rule in &self.rules {
            if rule.matches(&normalized) {
                last = Some(rule);
            }
        }
        match last {
            Some(rule) => RuleMatch {
                blocked: !rule.negated,
                rule: Some(rule.source.clone()),
            },
            None => RuleMatch::ALLOWED,
        }
    }
}

/// Normalize a candidate path for rule matching: forward slashes, no `./`
/// prefixes, no leading slash. Absolute paths are matched as if rooted at the
/// rule-file root; for a block list that conflation only ever blocks more.
/// `..` components are kept as literal segments (`**` crosses them anyway).
fn normalize_for_match(path: &str) -> String {
    let mut p = path.replace('\\', "/");
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest.to_string();
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest.to_string();
        } else {
            break;
        }
    }
    p
}
