//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/prompt-refiner/config.toml)
//! 3. Local config (./prompt-refiner.toml)
//! 4. Environment variables (PROMPT_REFINER_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::constants::env;
use crate::types::{RefinerError, Result};

const APP_DIR: &str = "prompt-refiner";
const CONFIG_FILE: &str = "config.toml";
const LOCAL_CONFIG_FILE: &str = "prompt-refiner.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → local (or explicit file) → env vars
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(RefinerError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                debug!("Loading config from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let local_path = Self::local_config_path();
                if local_path.exists() {
                    debug!("Loading local config from: {}", local_path.display());
                    figment = figment.merge(Toml::file(&local_path));
                }
            }
        }

        // e.g. PROMPT_REFINER_SERVER__PORT -> server.port
        figment = figment.merge(Env::prefixed(env::CONFIG_PREFIX).split("__"));

        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let config: Config = figment
            .extract()
            .map_err(|e| RefinerError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/prompt-refiner/)
    pub fn global_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Get path to the working-directory config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Render the effective configuration
    pub fn render(config: &Config, as_json: bool) -> Result<String> {
        if as_json {
            Ok(serde_json::to_string_pretty(config)?)
        } else {
            toml::to_string_pretty(config).map_err(|e| RefinerError::Config(e.to_string()))
        }
    }
}
