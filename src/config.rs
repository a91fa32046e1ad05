//! Database configuration.
//!
//! Options are layered: built-in defaults, then an optional TOML file, then
//! `AGGRELITE_*` environment variables.

use crate::errors::DbError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options for [`crate::Database::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Database name; also scopes the log folder (`{name}_logs`).
    pub name: String,
    /// Base directory for log files. Defaults to the current directory.
    pub log_dir: Option<PathBuf>,
    /// error|warn|info|debug|trace
    pub log_level: String,
    /// Number of rolled log files to keep.
    pub log_retention: u32,
    /// Whether opening the database installs the file logger.
    pub enable_logging: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            name: "aggrelite".to_string(),
            log_dir: None,
            log_level: "info".to_string(),
            log_retention: 7,
            enable_logging: false,
        }
    }
}

impl DatabaseOptions {
    /// # Errors
    /// Returns `DbError::Config` if the text is not valid TOML for these options.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        Ok(toml::from_str::<Self>(s)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults, overlaid with `path` when given and present, then with the
    /// environment.
    ///
    /// # Errors
    /// Returns an error if an existing config file cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, DbError> {
        let mut opts = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        opts.apply_env_overrides();
        Ok(opts)
    }

    /// Applies `AGGRELITE_DB_NAME`, `AGGRELITE_LOG_DIR`, `AGGRELITE_LOG_LEVEL`,
    /// `AGGRELITE_LOG_RETENTION` and `AGGRELITE_LOGGING` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("AGGRELITE_DB_NAME").filter(|s| !s.is_empty()) {
            self.name = name;
        }
        if let Some(dir) = lookup("AGGRELITE_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = lookup("AGGRELITE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(n) = lookup("AGGRELITE_LOG_RETENTION").and_then(|s| s.parse::<u32>().ok()) {
            self.log_retention = n;
        }
        if let Some(flag) = lookup("AGGRELITE_LOGGING") {
            self.enable_logging = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }
}
