//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Credentials are deliberately absent here: they are read from the
//! environment into [`Credentials`] and never serialized.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::constants::{drafting, env, limits, refining, server};
use crate::types::{RefinerError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Drafting stage (generation API) settings
    pub drafting: DraftingConfig,

    /// Refining stage (chat-completion API) settings
    pub refining: RefiningConfig,

    /// Context size limits
    pub limits: LimitsConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RefinerError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RefinerError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.drafting.max_attempts == 0 {
            return Err(RefinerError::Config(
                "drafting.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.drafting.timeout_secs == 0 || self.refining.timeout_secs == 0 {
            return Err(RefinerError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.refining.temperature) {
            return Err(RefinerError::Config(format!(
                "refining.temperature must be between 0.0 and 2.0, got {}",
                self.refining.temperature
            )));
        }

        if self.refining.model.trim().is_empty() {
            return Err(RefinerError::Config(
                "refining.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Maximum multipart body size in bytes
    pub max_upload_bytes: usize,

    /// Allow any origin, method and header (browser front-ends on other ports)
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: server::DEFAULT_HOST.to_string(),
            port: server::DEFAULT_PORT,
            max_upload_bytes: server::MAX_UPLOAD_BYTES,
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                RefinerError::Config(format!(
                    "Invalid listen address {}:{}: {}",
                    self.host, self.port, e
                ))
            })
    }
}

// =============================================================================
// Drafting Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftingConfig {
    /// Generative Language API base URL
    pub api_base: String,

    /// Model used when the registry query fails
    pub fallback_model: String,

    /// Preferred fast-tier model marker
    pub preferred_marker: String,

    /// Marker that disqualifies a model from the preferred tier
    pub excluded_marker: String,

    /// Total attempts per draft call
    pub max_attempts: u32,

    /// Pause between rate-limited attempts
    pub rate_limit_delay_secs: u64,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DraftingConfig {
    fn default() -> Self {
        Self {
            api_base: drafting::DEFAULT_API_BASE.to_string(),
            fallback_model: drafting::FALLBACK_MODEL.to_string(),
            preferred_marker: drafting::PREFERRED_MARKER.to_string(),
            excluded_marker: drafting::EXCLUDED_MARKER.to_string(),
            max_attempts: drafting::MAX_ATTEMPTS,
            rate_limit_delay_secs: drafting::RATE_LIMIT_DELAY_SECS,
            timeout_secs: drafting::TIMEOUT_SECS,
        }
    }
}

impl DraftingConfig {
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }
}

// =============================================================================
// Refining Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefiningConfig {
    /// OpenAI-compatible API base URL
    pub api_base: String,

    /// Chat model name
    pub model: String,

    /// Temperature for the refinement call
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RefiningConfig {
    fn default() -> Self {
        Self {
            api_base: refining::DEFAULT_API_BASE.to_string(),
            model: refining::MODEL.to_string(),
            temperature: refining::TEMPERATURE,
            timeout_secs: refining::TIMEOUT_SECS,
        }
    }
}

// =============================================================================
// Limits Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Characters each file contributes to the draft call
    pub file_excerpt_chars: usize,

    /// Characters of accumulated context sent to the refiner
    pub refine_context_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            file_excerpt_chars: limits::FILE_EXCERPT_CHARS,
            refine_context_chars: limits::REFINE_CONTEXT_CHARS,
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// API keys for both hosted services, held as secrets
#[derive(Clone)]
pub struct Credentials {
    pub google_api_key: SecretString,
    pub groq_api_key: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &"[REDACTED]")
            .field("groq_api_key", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Read both keys from the process environment.
    ///
    /// Fails when either key is missing or blank; the service must not start
    /// without them.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve keys through an arbitrary lookup (environment, tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        match (read(env::GOOGLE_API_KEY), read(env::GROQ_API_KEY)) {
            (Some(google), Some(groq)) => Ok(Self {
                google_api_key: SecretString::from(google),
                groq_api_key: SecretString::from(groq),
            }),
            (google, groq) => {
                let missing: Vec<&str> = [
                    (google.is_none(), env::GOOGLE_API_KEY),
                    (groq.is_none(), env::GROQ_API_KEY),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();

                Err(RefinerError::Config(format!(
                    "API keys missing: {}. Set them in the environment or a .env file.",
                    missing.join(", ")
                )))
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.drafting.max_attempts, 3);
        assert_eq!(config.drafting.rate_limit_delay(), Duration::from_secs(30));
        assert_eq!(config.refining.model, "llama3-8b-8192");
        assert_eq!(config.limits.file_excerpt_chars, 8000);
        assert_eq!(config.limits.refine_context_chars, 2000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.drafting.max_attempts = 0;
        assert!(matches!(config.validate(), Err(RefinerError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        config.refining.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 8000);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        assert!(bad.socket_addr().is_err());
    }

    #[test]
    fn test_credentials_require_both_keys() {
        let err = Credentials::from_lookup(|name| {
            (name == env::GOOGLE_API_KEY).then(|| "g-key".to_string())
        })
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains(env::GROQ_API_KEY));
        assert!(!message.contains(env::GOOGLE_API_KEY));

        let blank = Credentials::from_lookup(|_| Some("   ".to_string()));
        assert!(blank.is_err());
    }

    #[test]
    fn test_credentials_loaded_and_redacted() {
        let creds = Credentials::from_lookup(|name| Some(format!("{}-value", name))).unwrap();
        assert_eq!(creds.google_api_key.expose_secret(), "GOOGLE_API_KEY-value");
        assert_eq!(creds.groq_api_key.expose_secret(), "GROQ_API_KEY-value");

        let debug = format!("{:?}", creds);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("value"));
    }
}
