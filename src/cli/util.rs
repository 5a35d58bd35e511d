//! CLI Common Utilities
//!
//! Shared initialization for CLI commands.

use std::path::{Path, PathBuf};

use crate::config::{Config, ConfigLoader, Credentials};
use crate::extract::Upload;
use crate::types::Result;

/// Command execution context
///
/// Created via `CommandContext::load()` for commands that call the hosted
/// services; config-only commands use [`ConfigLoader`] directly.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Effective configuration
    pub config: Config,
    /// API keys for both services
    pub credentials: Credentials,
}

impl CommandContext {
    /// Load configuration and credentials.
    ///
    /// Fails when either API key is missing.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = ConfigLoader::load(config_path)?;
        let credentials = Credentials::from_env()?;
        Ok(Self {
            config,
            credentials,
        })
    }
}

/// Read a local file as an upload, guessing its content type from the name
pub fn upload_from_path(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(Upload::new(filename, content_type, bytes))
}

/// Read every path as an upload, in the given order
pub fn uploads_from_paths(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths.iter().map(|path| upload_from_path(path)).collect()
}
