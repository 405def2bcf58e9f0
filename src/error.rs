use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `toolward`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains. The hook boundary never
/// surfaces any of these to the host: every error there collapses into a
/// fail-open "allowed" decision.
#[derive(Debug, Error)]
pub enum GuardError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Rule resource ───────────────────────────────────────────────────
    #[error("rules: {0}")]
    Rules(#[from] RuleError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),
}

// ─── Rule resource errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule file unreadable: {0}")]
    Unreadable(String),

    #[error("line {line}: invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        message: String,
    },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, GuardError>;
