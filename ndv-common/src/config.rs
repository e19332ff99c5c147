//! Bootstrap configuration loading and config file resolution
//!
//! Config file location follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `NDV_CONFIG` environment variable
//! 3. `<user config dir>/ndv/ndv-linker.toml`, when it exists
//! 4. Built-in defaults (no file)
//!
//! A file named explicitly (CLI or environment) must exist. A missing file at the
//! discovered default location is not an error: built-in defaults apply.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "NDV_CONFIG";

/// Config file name looked up in the user config directory
pub const CONFIG_FILE_NAME: &str = "ndv-linker.toml";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// SQLite database holding videos, milestones and associations
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Provenance tag used to filter the video source (e.g. "CDC")
    #[serde(default)]
    pub video_source_tag: Option<String>,

    /// External lexicon file; the built-in lexicon is used when absent
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,

    /// Manual override table consulted before automatic ranking
    #[serde(default)]
    pub overrides_path: Option<PathBuf>,

    /// Scoring and ranking thresholds
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            video_source_tag: None,
            lexicon_path: None,
            overrides_path: None,
            matching: MatchingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Scoring and ranking thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MatchingConfig {
    /// Candidates scoring below this are dropped
    #[serde(default = "default_min_score")]
    pub min_score: u32,

    /// Maximum candidates kept per video
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Age proximity window in months (inclusive)
    #[serde(default = "default_age_tolerance")]
    pub age_tolerance_months: u32,

    /// Label tokens shorter than this never count as direct overlap
    #[serde(default = "default_min_token_chars")]
    pub min_token_chars: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            top_k: default_top_k(),
            age_tolerance_months: default_age_tolerance(),
            min_token_chars: default_min_token_chars(),
        }
    }
}

impl MatchingConfig {
    /// Reject thresholds that would make every score meaningless
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Config("matching.top_k must be at least 1".to_string()));
        }
        if self.min_token_chars == 0 {
            return Err(Error::Config(
                "matching.min_token_chars must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("neurodesarrollo.db")
}

fn default_min_score() -> u32 {
    3
}

fn default_top_k() -> usize {
    3
}

fn default_age_tolerance() -> u32 {
    2
}

fn default_min_token_chars() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where a resolved config path came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` argument
    CommandLine(PathBuf),
    /// `NDV_CONFIG` environment variable
    Environment(PathBuf),
    /// File found in the user config directory
    UserConfigDir(PathBuf),
    /// No file: built-in defaults
    Defaults,
}

/// Config file resolver
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Resolve the config source by priority
    pub fn resolve(&self) -> ConfigSource {
        if let Some(path) = &self.cli_path {
            return ConfigSource::CommandLine(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return ConfigSource::Environment(PathBuf::from(path));
            }
        }

        if let Some(path) = user_config_path() {
            if path.exists() {
                return ConfigSource::UserConfigDir(path);
            }
        }

        ConfigSource::Defaults
    }

    /// Resolve and load the configuration
    pub fn load(&self) -> Result<TomlConfig> {
        match self.resolve() {
            ConfigSource::CommandLine(path)
            | ConfigSource::Environment(path)
            | ConfigSource::UserConfigDir(path) => TomlConfig::from_file(&path),
            ConfigSource::Defaults => {
                info!("No config file found, using built-in defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// `<user config dir>/ndv/ndv-linker.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ndv").join(CONFIG_FILE_NAME))
}

impl TomlConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("Config file {}", path.display())));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.matching.validate()?;

        debug!(
            database = %config.database_path.display(),
            min_score = config.matching.min_score,
            top_k = config.matching.top_k,
            "Parsed configuration"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.database_path, PathBuf::from("neurodesarrollo.db"));
        assert_eq!(config.matching.min_score, 3);
        assert_eq!(config.matching.top_k, 3);
        assert_eq!(config.matching.age_tolerance_months, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_matching_section_keeps_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
            video_source_tag = "CDC"

            [matching]
            top_k = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.video_source_tag.as_deref(), Some("CDC"));
        assert_eq!(config.matching.top_k, 1);
        assert_eq!(config.matching.min_score, 3);
        assert_eq!(config.matching.min_token_chars, 3);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let err = TomlConfig::from_toml_str("[matching]\ntop_k = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = TomlConfig::from_toml_str("matching = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
