//! Configuration management for curricula
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CURRICULA_*)
//! 3. Config file (~/.config/curricula/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Plan validation limits
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Programs a plan may be created for
    pub valid_programs: Vec<String>,

    /// Ceiling on credits within a single semester
    pub max_semester_credits: u32,

    /// Floor on credits across the whole plan
    pub min_total_credits: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            valid_programs: vec![
                "Computer Science".to_string(),
                "Engineering".to_string(),
                "Mathematics".to_string(),
            ],
            max_semester_credits: 18,
            // Programs set their real floor in config.toml
            min_total_credits: 0,
        }
    }
}

impl ValidationConfig {
    pub fn is_valid_program(&self, program: &str) -> bool {
        self.valid_programs.iter().any(|p| p == program)
    }
}

/// Database settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite database file
    pub path: PathBuf,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            max_connections: 5,
        }
    }
}

impl DatabaseSettings {
    /// Returns `~/.local/share/curricula/curricula.db` on Unix
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("curricula")
            .join("curricula.db")
    }
}

/// Plan sharing settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Lifetime applied to new share links when none is given
    #[serde(with = "humantime_serde")]
    pub default_expiration: Option<Duration>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub validation: ValidationConfig,
    pub database: DatabaseSettings,
    pub sharing: SharingConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Returns `~/.config/curricula/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("curricula").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CURRICULA_DB_PATH: SQLite database file
    /// - CURRICULA_MAX_SEMESTER_CREDITS: per-semester credit ceiling
    /// - CURRICULA_MIN_TOTAL_CREDITS: plan-wide credit floor
    /// - CURRICULA_VALID_PROGRAMS: comma separated program names
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = var("CURRICULA_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("CURRICULA_MAX_SEMESTER_CREDITS") {
            self.validation.max_semester_credits = parse_credits("CURRICULA_MAX_SEMESTER_CREDITS", &max)?;
        }

        if let Some(min) = var("CURRICULA_MIN_TOTAL_CREDITS") {
            self.validation.min_total_credits = parse_credits("CURRICULA_MIN_TOTAL_CREDITS", &min)?;
        }

        if let Some(programs) = var("CURRICULA_VALID_PROGRAMS") {
            self.validation.valid_programs = programs
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, db_path: Option<PathBuf>) -> Self {
        if let Some(path) = db_path {
            self.database.path = path;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_path: Option<&Path>,
        db_path: Option<PathBuf>,
    ) -> Result<Self> {
        let base = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(base.with_env_overrides()?.with_cli_overrides(db_path))
    }
}

fn parse_credits(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
