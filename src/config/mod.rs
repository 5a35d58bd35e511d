//! Configuration Management
//!
//! Hierarchical resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/prompt-refiner/config.toml)
//! 3. Local config (./prompt-refiner.toml) or `--config <file>`
//! 4. Environment variables (PROMPT_REFINER_*)
//! 5. CLI arguments (highest priority)
//!
//! API keys are never part of the file-based config; see [`Credentials`].

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
