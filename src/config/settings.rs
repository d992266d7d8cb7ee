//! TOML-based configuration for Analytica.
//!
//! Supports a config file (analytica.toml) with environment variable
//! expansion in paths.
//!
//! Example configuration:
//! ```toml
//! [store]
//! backend = "sqlite"
//! path = "${HOME}/.analytica/models.db"
//!
//! [inference]
//! min_confidence = 0.9
//! deduplicate = true
//! rules = ["identical_name", "foreign_key_pattern"]
//!
//! [formula]
//! max_depth = 64
//!
//! [validation]
//! strict_syntax = true
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::formula::{ParseOptions, Validator, DEFAULT_MAX_DEPTH};
use crate::semantic::inference::{default_rules, InferenceConfig};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "ANALYTICA_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub inference: InferenceSettings,
    pub formula: FormulaSettings,
    pub validation: ValidationSettings,
}

/// Which document store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per model in a directory.
    #[default]
    File,
    /// A single SQLite database.
    Sqlite,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::File => write!(f, "file"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    /// Directory (file backend) or database file (sqlite backend).
    /// Supports `${ENV_VAR}` expansion. Defaults under the user data dir.
    pub path: Option<String>,
}

impl StoreSettings {
    /// The configured path with environment variables expanded, or the
    /// per-backend default.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }

        let base = dirs::data_dir().ok_or_else(|| {
            SettingsError::InvalidConfig("no data directory; set store.path".to_string())
        })?;
        let base = base.join("analytica");
        Ok(match self.backend {
            StoreBackend::File => base.join("models"),
            StoreBackend::Sqlite => base.join("models.db"),
        })
    }
}

/// Inference settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Minimum confidence threshold (0.0 to 1.0).
    pub min_confidence: f64,

    /// Keep only the best suggestion per endpoint pair.
    pub deduplicate: bool,

    /// Enabled inference rules.
    pub rules: Vec<String>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            deduplicate: false,
            rules: default_rules().iter().map(|r| r.name.to_string()).collect(),
        }
    }
}

impl InferenceSettings {
    pub fn to_config(&self) -> InferenceConfig {
        InferenceConfig::default()
            .with_min_confidence(self.min_confidence)
            .with_deduplicate(self.deduplicate)
            .with_rules(self.rules.iter().cloned())
    }
}

/// Formula parser settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FormulaSettings {
    /// Maximum parenthesis / unary nesting depth.
    pub max_depth: usize,
}

impl Default for FormulaSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FormulaSettings {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_depth: self.max_depth,
        }
    }
}

/// Measure validation settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Also run the parser when validating.
    pub strict_syntax: bool,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.check()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `ANALYTICA_CONFIG`
    /// 2. `./analytica.toml`
    /// 3. `<config dir>/analytica/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("analytica.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("analytica").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Validator configured by `[validation]` and `[formula]`.
    pub fn validator(&self) -> Validator {
        Validator::default()
            .with_strict_syntax(self.validation.strict_syntax)
            .with_parse_options(self.formula.parse_options())
    }

    fn check(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.inference.min_confidence) {
            return Err(SettingsError::InvalidConfig(format!(
                "inference.min_confidence must be within 0.0..=1.0, got {}",
                self.inference.min_confidence
            )));
        }
        if self.formula.max_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "formula.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name: String = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            if chars.next_if_eq(&'}').is_none() {
                return Err(SettingsError::InvalidConfig(format!(
                    "unterminated ${{ in '{}'",
                    s
                )));
            }
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_')).collect()
        };

        if var_name.is_empty() {
            // A lone `$` is kept literally.
            result.push('$');
            continue;
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
