use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// Default name of the rule resource, resolved against the workspace.
pub const DEFAULT_RULES_FILE: &str = ".toolwardignore";

/// Default name of the optional config file, resolved against the workspace
/// first and the platform config directory second.
pub const CONFIG_FILE_NAME: &str = "toolward.toml";

fn default_check_broad_patterns() -> bool {
    true
}

/// Guard configuration.
///
/// Precedence, highest first: CLI flags, per-invocation hook options, config
/// file, built-in defaults. All layers are folded into one `GuardConfig`
/// before a decision runs; the guard itself never consults the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Location of the gitignore-style rule resource. Tilde-expanded.
    /// Relative paths resolve against `workspace_dir`.
    pub rules_file: PathBuf,
    /// Whether enumeration patterns are screened for excessive breadth.
    pub check_broad_patterns: bool,
    /// Directory relative paths are resolved against.
    pub workspace_dir: PathBuf,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            rules_file: PathBuf::from(DEFAULT_RULES_FILE),
            check_broad_patterns: default_check_broad_patterns(),
            workspace_dir: PathBuf::from("."),
        }
    }
}

impl GuardConfig {
    /// Load configuration, searching the workspace then the platform config
    /// directory. A missing file yields the defaults; an unparseable file is
    /// an error (a config the operator wrote should not be silently ignored).
    pub fn load(workspace_dir: &Path) -> Result<Self> {
        let mut candidates = vec![workspace_dir.join(format!(".{CONFIG_FILE_NAME}"))];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "toolward") {
            candidates.push(dirs.config_dir().join(CONFIG_FILE_NAME));
        }

        for path in candidates {
            if !path.is_file() {
                continue;
            }
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
            let mut config: Self = toml::from_str(&raw)
                .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
            config.workspace_dir = workspace_dir.to_path_buf();
            debug!(path = %path.display(), "loaded config");
            return Ok(config);
        }

        Ok(Self {
            workspace_dir: workspace_dir.to_path_buf(),
            ..Self::default()
        })
    }

    /// Absolute location of the rule resource, after tilde expansion and
    /// workspace resolution.
    #[must_use]
    pub fn resolved_rules_file(&self) -> PathBuf {
        let raw = self.rules_file.to_string_lossy();
        let expanded: PathBuf = match shellexpand::tilde(raw.as_ref()) {
            std::borrow::Cow::Borrowed(_) => self.rules_file.clone(),
            std::borrow::Cow::Owned(s) => PathBuf::from(s),
        };
        if expanded.is_absolute() {
            expanded
        } else {
            self.workspace_dir.join(expanded)
        }
    }

    /// Fold per-invocation overrides (hook payload `options`) on top of this
    /// config, returning the effective config for one decision.
    #[must_use]
    pub fn with_overrides(
        &self,
        rules_file: Option<&str>,
        check_broad_patterns: Option<bool>,
    ) -> Self {
        let mut effective = self.clone();
        if let Some(path) = rules_file {
            effective.rules_file = PathBuf::from(path);
        }
        if let Some(flag) = check_broad_patterns {
            effective.check_broad_patterns = flag;
        }
        effective
    }

    /// Sanity-check the config. Only warns; a guard must keep working with a
    /// questionable config rather than block legitimate actions.
    pub fn validate(&self) {
        if !self.workspace_dir.is_dir() {
            warn!(dir = %self.workspace_dir.display(), "workspace directory does not exist");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_fail_open_friendly() {
        let config = GuardConfig::default();
        assert_eq!(config.rules_file, PathBuf::from(DEFAULT_RULES_FILE));
        assert!(config.check_broad_patterns);
    }

    #[test]
    fn load_without_config_file_yields_defaults() {
        let workspace = TempDir::new().expect("tempdir");
        let config = GuardConfig::load(workspace.path()).expect("load");
        assert_eq!(config.workspace_dir, workspace.path());
        assert!(config.check_broad_patterns);
    }

    #[test]
    fn load_reads_workspace_config_file() {
        let workspace = TempDir::new().expect("tempdir");
        std::fs::write(
            workspace.path().join(".toolward.toml"),
            "rules_file = \"custom.rules\"\ncheck_broad_patterns = false\n",
        )
        .expect("write config");

        let config = GuardConfig::load(workspace.path()).expect("load");
        assert_eq!(config.rules_file, PathBuf::from("custom.rules"));
        assert!(!config.check_broad_patterns);
    }

    #[test]
    fn load_rejects_unparseable_config_file() {
        let workspace = TempDir::new().expect("tempdir");
        std::fs::write(workspace.path().join(".toolward.toml"), "rules_file = [")
            .expect("write config");

        assert!(GuardConfig::load(workspace.path()).is_err());
    }

    #[test]
    fn resolved_rules_file_joins_workspace_for_relative_paths() {
        let config = GuardConfig {
            rules_file: PathBuf::from("rules.txt"),
            workspace_dir: PathBuf::from("/work"),
            ..GuardConfig::default()
        };
        assert_eq!(config.resolved_rules_file(), PathBuf::from("/work/rules.txt"));
    }

    #[test]
    fn resolved_rules_file_keeps_absolute_paths() {
        let config = GuardConfig {
            rules_file: PathBuf::from("/etc/toolward/rules"),
            workspace_dir: PathBuf::from("/work"),
            ..GuardConfig::default()
        };
        assert_eq!(
            config.resolved_rules_file(),
            PathBuf::from("/etc/toolward/rules")
        );
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let base = GuardConfig::default();
        let effective = base.with_overrides(Some("other.rules"), None);
        assert_eq!(effective.rules_file, PathBuf::from("other.rules"));
        assert!(effective.check_broad_patterns);

        let effective = base.with_overrides(None, Some(false));
        assert_eq!(effective.rules_file, base.rules_file);
        assert!(!effective.check_broad_patterns);
    }
}
