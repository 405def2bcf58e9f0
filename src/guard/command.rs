//! Command normalization, decomposition, and safety classification.
//!
//! Best-effort lexical handling only. Known limitations, accepted by
//! contract rather than silently: operators inside quoted spans are not
//! split on, nested shell executors are unwrapped a single level, and
//! newlines are never treated as operator boundaries (they may be
//! here-document bodies or multi-line literals).

use tracing::debug;

/// Upper bound on sub-commands produced by [`split`]. Past the cap the
/// remainder is kept as one opaque segment so adversarial input cannot force
/// unbounded work.
const MAX_SUBCOMMANDS: usize = 64;

/// Upper bound on wrapper layers stripped by [`normalize`].
const MAX_WRAPPER_LAYERS: usize = 8;

/// Process wrappers that merely run another command. Stripping them exposes
/// the command that actually matters for classification.
const WRAPPERS: &[&str] = &["sudo", "env", "nice", "nohup", "time", "timeout", "stdbuf"];

/// Per-wrapper flags that consume the following token as their value.
/// (`sudo -n` takes no value; `nice -n 10` does.)
fn wrapper_flag_takes_value(wrapper: &str, flag: &str) -> bool {
    if flag.contains('=') {
        return false;
    }
    match wrapper {
        "sudo" => matches!(flag, "-u" | "-g" | "-h" | "-p"),
        "nice" => flag == "-n",
        "timeout" => matches!(flag, "-k" | "-s" | "--kill-after" | "--signal"),
        "stdbuf" => matches!(flag, "-i" | "-o" | "-e"),
        _ => false,
    }
}

/// Package managers whose invocations are allowed only with a safe verb.
const PACKAGE_MANAGERS: &[&str] = &["npm", "pnpm", "yarn", "bun"];

/// Safe package-manager verbs (plus `run`, which dispatches to a project
/// script the operator already wrote down).
const PACKAGE_MANAGER_VERBS: &[&str] = &[
    "run", "build", "test", "lint", "dev", "start", "install", "ci", "add", "remove", "update",
    "publish", "pack", "init", "create", "exec",
];

/// Package-manager flags that may precede the verb and consume a value.
const PACKAGE_MANAGER_SCOPE_FLAGS: &[&str] = &["--filter", "-F", "--workspace", "-w", "-C"];

/// Ecosystem toolchain binaries allowed regardless of trailing arguments:
/// compilers, linters, formatters, build systems, container/orchestration/
/// IaC tools, interpreters.
const TOOLCHAIN_BINARIES: &[&str] = &[
    // Rust
    "cargo", "rustc", "rustup", "rustfmt",
    // Go
    "go", "gofmt", "golangci-lint",
    // JS/TS
    "node", "tsc", "eslint", "prettier", "vitest", "jest",
    // Python
    "python", "python3", "pytest", "ruff", "black", "mypy", "tox", "uv", "pip", "pip3",
    // Build systems
    "make", "cmake", "ninja", "gradle", "mvn", "bazel",
    // Containers / orchestration / IaC
    "docker", "docker-compose", "podman", "kubectl", "helm", "terraform", "pulumi", "ansible",
];

/// Directories whose executables belong to an isolated, project-local
/// environment and are trusted without further path inspection.
const ISOLATED_BIN_DIRS: &[&str] = &[".venv/bin/", "venv/bin/", "node_modules/.bin/"];

/// Shell binaries recognized as string executors for [`unwrap_executor`].
const SHELL_EXECUTORS: &[&str] = &["sh", "bash", "zsh", "dash"];

// ─── Tokenization ───────────────────────────────────────────────────────────

/// Split a command into whitespace-separated tokens, keeping quoted spans
/// (with their quotes) intact.
pub fn tokenize(command: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut buf = String::new();
    let (mut sq, mut dq, mut esc) = (false, false, false);

    for c in command.chars() {
        if esc {
            buf.push(c);
            esc = false;
            continue;
        }
        match c {
            '\\' if !sq => {
                esc = true;
                buf.push(c);
            }
            '\'' if !dq => {
                sq = !sq;
                buf.push(c);
            }
            '"' if !sq => {
                dq = !dq;
                buf.push(c);
            }
            c if c.is_whitespace() && !sq && !dq => {
                if !buf.is_empty() {
                    tokens.push(std::mem::take(&mut buf));
                }
            }
            c => buf.push(c),
        }
    }
    if !buf.is_empty() {
        tokens.push(buf);
    }
    tokens
}

/// Strip a single layer of surrounding quotes, if present.
pub fn strip_quotes(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

// ─── Normalization ──────────────────────────────────────────────────────────

/// Skip leading environment variable assignments (e.g. `FOO=bar cmd args`).
/// Returns the remainder starting at the first non-assignment word.
fn skip_env_assignments(s: &str) -> &str {
    let mut rest = s.trim_start();
    loop {
        let Some(word) = rest.split_whitespace().next() else {
            return rest;
        };
        if word.contains('=')
            && word
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        {
            rest = rest[word.len()..].trim_start();
        } else {
            return rest;
        }
    }
}

/// Strip one leading wrapper invocation (`sudo`, `env`, `timeout 30`, …).
/// Returns the remainder, or the input unchanged if no wrapper leads it.
fn strip_one_wrapper(s: &str) -> &str {
    let mut words = s.split_whitespace();
    let Some(first) = words.next() else {
        return s;
    };
    if !WRAPPERS.contains(&first) {
        return s;
    }

    let mut rest = s[first.len()..].trim_start();

    // `timeout` takes a duration before the wrapped command.
    let mut pending_positional = first == "timeout";

    loop {
        let Some(word) = rest.split_whitespace().next() else {
            return rest;
        };
        if word.starts_with('-') {
            let consumed = word.len();
            let takes_value = wrapper_flag_takes_value(first, word);
            rest = rest[consumed..].trim_start();
            if takes_value {
                if let Some(value) = rest.split_whitespace().next() {
                    rest = rest[value.len()..].trim_start();
                }
            }
        } else if pending_positional {
            pending_positional = false;
            rest = rest[word.len()..].trim_start();
        } else {
            return rest;
        }
    }
}

/// Normalize a sub-command for classification: drop leading env assignments,
/// then wrapper layers (capped), stripping assignments again between layers
/// to catch the `sudo FOO=bar cmd` shape. Idempotent: a stack deeper than
/// the cap is returned unchanged rather than half-stripped.
#[must_use]
pub fn normalize(command: &str) -> String {
    let trimmed = command.trim();
    let mut current = skip_env_assignments(trimmed);
    for _ in 0..MAX_WRAPPER_LAYERS {
        let stripped = skip_env_assignments(strip_one_wrapper(current));
        if stripped == current {
            return current.to_string();
        }
        current = stripped;
    }
    // Cap reached. If a wrapper still leads, give up on the whole stack so
    // repeated normalization is stable.
    if strip_one_wrapper(current) == current {
        current.to_string()
    } else {
        trimmed.to_string()
    }
}

// ─── Executor unwrapping ────────────────────────────────────────────────────

/// If the command is exactly a shell-executor invocation wrapping a single
/// quoted command string (`sh -c '…'`, `bash -lc "…"`, `eval '…'`), return
/// the inner string; otherwise return the input unchanged.
///
/// Only one level is unwrapped per call. A nested executor inside the inner
/// string is treated as opaque text by the rest of the pipeline.
#[must_use]
pub fn unwrap_executor(command: &str) -> String {
    let trimmed = command.trim();
    let tokens = tokenize(trimmed);

    let inner = match tokens.as_slice() {
        [exe, flags, payload]
            if SHELL_EXECUTORS.contains(&exe.as_str())
                && flags.starts_with('-')
                && flags.contains('c') =>
        {
            payload
        }
        [exe, payload] if exe == "eval" => payload,
        _ => return command.to_string(),
    };

    let stripped = strip_quotes(inner);
    if stripped == inner {
        // Payload was not a single quoted string; leave the command alone.
        return command.to_string();
    }
    debug!(executor = %tokens[0], "unwrapped shell executor");
    stripped.to_string()
}

// ─── Splitting ──────────────────────────────────────────────────────────────

/// Split on top-level sequencing and boolean operators (`&&`, `||`, `;`),
/// outside quoted spans. Newlines are not operator boundaries. Pipes keep a
/// pipeline inside one sub-command.
#[must_use]
pub fn split(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);

    while i < len {
        let c = chars[i];

        if esc {
            buf.push(c);
            esc = false;
            i += 1;
            continue;
        }
        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            i += 1;
            continue;
        }
        if sq || dq {
            buf.push(c);
            i += 1;
            continue;
        }

        if parts.len() < MAX_SUBCOMMANDS {
            if i + 1 < len {
                let two = [chars[i], chars[i + 1]];
                if two == ['&', '&'] || two == ['|', '|'] {
                    push_segment(&mut parts, &mut buf);
                    i += 2;
                    continue;
                }
            }
            if c == ';' {
                push_segment(&mut parts, &mut buf);
                i += 1;
                continue;
            }
        }

        buf.push(c);
        i += 1;
    }

    push_segment(&mut parts, &mut buf);
    parts
}

fn push_segment(parts: &mut Vec<String>, buf: &mut String) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
    buf.clear();
}

// ─── Classification ─────────────────────────────────────────────────────────

/// True if the sub-command's leading token sequence matches the fixed
/// allow-grammar of recognized tooling invocations.
///
/// The grammar is unanchored at the line end: callers must pass a single
/// already-split sub-command, never a compound command string.
#[must_use]
pub fn is_recognized_tooling(sub_command: &str) -> bool {
    let normalized = normalize(sub_command);
    let tokens = tokenize(&normalized);
    let Some(first) = tokens.first() else {
        return false;
    };
    let first = strip_quotes(first);

    if is_isolated_env_binary(first) {
        return true;
    }
    if is_isolated_env_creation(&tokens) {
        return true;
    }
    // Binaries addressed by path are only trusted via the isolated-env rule.
    if first.contains('/') {
        return false;
    }
    if TOOLCHAIN_BINARIES.contains(&first) {
        return true;
    }
    if PACKAGE_MANAGERS.contains(&first) {
        return has_safe_package_manager_verb(&tokens[1..]);
    }
    false
}

/// Execution of a binary from a project-local isolated environment.
fn is_isolated_env_binary(token: &str) -> bool {
    let path = token.trim_start_matches("./");
    ISOLATED_BIN_DIRS
        .iter()
        .any(|dir| path.starts_with(dir) || path.contains(&format!("/{dir}")))
}

/// Creation of an isolated environment (`python -m venv …`, `virtualenv`,
/// `uv venv`).
fn is_isolated_env_creation(tokens: &[String]) -> bool {
    match tokens {
        [first, ..] if first == "virtualenv" => true,
        [first, second, ..] if first == "uv" && second == "venv" => true,
        [first, flag, module, ..]
            if (first == "python" || first == "python3") && flag == "-m" && module == "venv" =>
        {
            true
        }
        _ => false,
    }
}

/// Verb check for package managers, skipping leading filter/workspace flags.
fn has_safe_package_manager_verb(args: &[String]) -> bool {
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg.starts_with('-') {
            let takes_value =
                PACKAGE_MANAGER_SCOPE_FLAGS.contains(&arg) && !arg.contains('=');
            i += if takes_value { 2 } else { 1 };
            continue;
        }
        return PACKAGE_MANAGER_VERBS.contains(&arg);
    }
    false
}
