// Author: Dustin Pilgrim
// License: MIT

use std::fmt;
use std::path::{Path, PathBuf};

use rune_cfg::RuneConfig;

use crate::core::error::ConfigError;

pub mod duration;
pub mod info;
pub mod parser;
pub mod pattern;

pub use parser::{parse_settings, Settings};

#[derive(Debug)]
pub enum ConfigLoadError {
    NotFound(PathBuf),
    Parse(String),
    Invalid { key: &'static str, reason: String },
    Validation(ConfigError),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLoadError::NotFound(p) => write!(f, "config file not found: {}", p.display()),
            ConfigLoadError::Parse(msg) => write!(f, "configuration error: {}", msg),
            ConfigLoadError::Invalid { key, reason } => write!(f, "invalid vigil.{}: {}", key, reason),
            ConfigLoadError::Validation(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl From<ConfigError> for ConfigLoadError {
    fn from(err: ConfigError) -> Self {
        ConfigLoadError::Validation(err)
    }
}

/// First existing config file: user config, then system config.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(mut path) = dirs::home_dir() {
        path.push(".config/vigil/vigil.rune");
        if path.exists() {
            return Some(path);
        }
    }

    let system_path = PathBuf::from("/etc/vigil/vigil.rune");
    if system_path.exists() {
        return Some(system_path);
    }

    None
}

/// Load settings from `explicit`, else the default locations, else the
/// built-in defaults.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigLoadError> {
    let path = match explicit {
        Some(p) if !p.exists() => return Err(ConfigLoadError::NotFound(p.to_path_buf())),
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    let Some(path) = path else {
        tracing::debug!("no config file found; using built-in defaults");
        return Ok(Settings::default());
    };

    let config = RuneConfig::from_file(&path).map_err(|e| {
        ConfigLoadError::Parse(format!("failed to load config from {}: {}", path.display(), e))
    })?;

    let mut settings = parse_settings(&config)?;
    settings.source = Some(path);

    if let Some(source) = &settings.source {
        tracing::info!("loaded config from {}", source.display());
    }

    Ok(settings)
}
