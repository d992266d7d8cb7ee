//! Configuration module for Analytica.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, FormulaSettings, InferenceSettings, Settings, SettingsError, StoreBackend,
    StoreSettings, ValidationSettings, CONFIG_ENV_VAR,
};
