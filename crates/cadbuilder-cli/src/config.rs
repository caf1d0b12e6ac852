//! `cadbuilder.toml` settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// File looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "cadbuilder.toml";

/// CLI settings. Command-line flags override these.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Workspace document path.
    pub workspace: PathBuf,
    /// Suggestions printed by `suggest` when `--limit` is not given.
    pub suggestion_limit: usize,
    /// Log level: error, warn, info, debug or trace.
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("cadbuilder.json"),
            suggestion_limit: 20,
            log_level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `explicit` if given (it must exist), else `cadbuilder.toml` if
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    return Ok(Self::default());
                }
                p
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parsed log level.
    pub fn level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid log level '{}'", self.log_level))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let c = CliConfig::from_toml("suggestion_limit = 5").unwrap();
        assert_eq!(c.suggestion_limit, 5);
        assert_eq!(c.workspace, PathBuf::from("cadbuilder.json"));
        assert_eq!(c.level().unwrap(), tracing::Level::INFO);
    }

    #[test]
    fn full_file() {
        let c = CliConfig::from_toml(
            r#"
workspace = "shop/line.json"
suggestion_limit = 3
log_level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(c.workspace, PathBuf::from("shop/line.json"));
        assert_eq!(c.level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(CliConfig::from_toml("workspce = \"typo.json\"").is_err());
    }

    #[test]
    fn bad_level_rejected() {
        let c = CliConfig {
            log_level: "loud".into(),
            ..Default::default()
        };
        assert!(c.level().is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("none.toml"))).is_err());

        let path = dir.path().join("c.toml");
        std::fs::write(&path, "suggestion_limit = 7").unwrap();
        assert_eq!(CliConfig::load(Some(&path)).unwrap().suggestion_limit, 7);
    }
}
