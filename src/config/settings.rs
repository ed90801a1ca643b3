//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// Environment variable Claude uses to relocate its data directory
pub const CLAUDE_CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

/// Prefix for environment overrides of [`Config`] fields
pub const ENV_PREFIX: &str = "RESUME_GUARD_";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Claude data directory holding `projects/`.
    /// If unset, falls back to `$CLAUDE_CONFIG_DIR`, then `~/.claude`.
    pub claude_config_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        Self::file_figment(&config_path)
            // Layer environment variables (RESUME_GUARD_CLAUDE_CONFIG_DIR)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| Error::Config(ConfigError::LoadFailed(e.to_string())))
    }

    /// Load configuration from a specific file, ignoring the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::file_figment(path)
            .extract()
            .map_err(|e| Error::Config(ConfigError::LoadFailed(e.to_string())))
    }

    fn file_figment(path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Save current configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Resolve Claude's data directory: config → $CLAUDE_CONFIG_DIR → ~/.claude
    pub fn claude_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.claude_config_dir {
            return Ok(dir.clone());
        }

        if let Some(dir) = std::env::var_os(CLAUDE_CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }

        let base = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(base.home_dir().join(".claude"))
    }

    /// Directory containing one session folder per project
    pub fn projects_dir(&self) -> Result<PathBuf> {
        Ok(self.claude_dir()?.join("projects"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "resume-guard", "resume-guard")
            .ok_or_else(|| Error::Config(ConfigError::NoHomeDirectory))
    }
}
