//! Config Command
//!
//! Inspect the effective configuration.
//!
//! Usage:
//!   prompt-refiner config show [-f toml|json]
//!   prompt-refiner config path

use std::path::Path;

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::constants::env;
use crate::types::{RefinerError, Result};

/// Print the merged configuration (credentials are never included)
pub fn show(config_path: Option<&Path>, format: &str, output: &Output) -> Result<()> {
    let as_json = match format {
        "json" => true,
        "toml" => false,
        other => {
            return Err(RefinerError::InvalidRequest(format!(
                "Unknown format '{}'. Valid values: toml, json",
                other
            )));
        }
    };

    let config = ConfigLoader::load(config_path)?;
    output.result(&ConfigLoader::render(&config, as_json)?);
    Ok(())
}

/// Show where configuration is read from
pub fn path(config_path: Option<&Path>, output: &Output) -> Result<()> {
    let describe = |path: &Path| {
        let state = if path.exists() { "found" } else { "not found" };
        format!("{} ({})", path.display(), state)
    };

    output.section("Configuration sources (lowest to highest priority)");

    match ConfigLoader::global_config_path() {
        Some(global) => output.field("Global", &describe(&global)),
        None => output.field("Global", "unavailable (no home directory)"),
    }

    match config_path {
        Some(explicit) => output.field("Explicit", &describe(explicit)),
        None => output.field("Local", &describe(&ConfigLoader::local_config_path())),
    }

    output.field(
        "Environment",
        &format!("{}<SECTION>__<KEY>", env::CONFIG_PREFIX),
    );
    output.field(
        "Credentials",
        &format!("{}, {} (env or .env)", env::GOOGLE_API_KEY, env::GROQ_API_KEY),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_rejects_unknown_format() {
        let err = show(None, "yaml", &Output::new(true)).unwrap_err();
        assert!(err.to_string().contains("yaml"));
    }
}
