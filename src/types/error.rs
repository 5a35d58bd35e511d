//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provider failures carry a category so the drafting stage can decide
//! whether to wait and retry without inspecting message text.
//!
//! ## Error Categories
//!
//! - **RateLimit**: quota exhausted (wait and retry)
//! - **Auth**: credentials rejected (fail fast)
//! - **Network**: connectivity issues
//! - **Unavailable**: model or endpoint missing
//! - **BadRequest**: request rejected as malformed
//! - **ParseError**: provider response could not be decoded
//! - **Transient**: temporary server-side failure

use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Provider error categories used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rate limited or quota exhausted - wait then retry same provider
    RateLimit,
    /// Authentication failed - fail fast, don't retry
    Auth,
    /// Network/connectivity issues
    Network,
    /// Model or endpoint unavailable
    Unavailable,
    /// Invalid request - don't retry, fix request
    BadRequest,
    /// Response body could not be decoded
    ParseError,
    /// Temporary server issues
    Transient,
    /// Unknown error
    Unknown,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl ErrorCategory {
    /// Only quota exhaustion is worth waiting out; everything else fails the call.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit)
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// Provider error with category and provider context
#[derive(Debug, Clone)]
pub struct LlmError {
    /// Error category for routing decisions
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{}:{}] {}", provider, self.category, self.message)
        } else {
            write!(f, "[{}] {}", self.category, self.message)
        }
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    /// Create a new LLM error
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            provider: None,
        }
    }

    /// Create error with provider context
    pub fn with_provider(
        category: ErrorCategory,
        message: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            provider: Some(provider.into()),
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        self.category.is_rate_limit()
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps structured provider signals onto error categories
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an HTTP status code
    pub fn classify_http_status(status: u16, message: &str, provider: &str) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            404 => ErrorCategory::Unavailable,
            500 | 502 | 503 | 504 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::with_provider(category, message, provider)
    }

    /// Classify a canonical service status (`error.status` in Google API bodies)
    pub fn classify_service_status(status: &str) -> Option<ErrorCategory> {
        match status {
            "RESOURCE_EXHAUSTED" => Some(ErrorCategory::RateLimit),
            "UNAUTHENTICATED" | "PERMISSION_DENIED" => Some(ErrorCategory::Auth),
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" => {
                Some(ErrorCategory::BadRequest)
            }
            "NOT_FOUND" => Some(ErrorCategory::Unavailable),
            "UNAVAILABLE" | "INTERNAL" | "DEADLINE_EXCEEDED" | "ABORTED" => {
                Some(ErrorCategory::Transient)
            }
            _ => None,
        }
    }

    /// Classify an error response, preferring the service status when present
    pub fn classify_response(
        status: u16,
        service_status: Option<&str>,
        message: &str,
        provider: &str,
    ) -> LlmError {
        match service_status.and_then(Self::classify_service_status) {
            Some(category) => LlmError::with_provider(category, message, provider),
            None => Self::classify_http_status(status, message, provider),
        }
    }

    /// Classify a transport-level failure from the HTTP client
    pub fn classify_transport(err: &reqwest::Error, provider: &str) -> LlmError {
        let category = if err.is_timeout() || err.is_connect() || err.is_request() {
            ErrorCategory::Network
        } else if err.is_decode() || err.is_body() {
            ErrorCategory::ParseError
        } else if let Some(status) = err.status() {
            return Self::classify_http_status(status.as_u16(), &err.to_string(), provider);
        } else {
            ErrorCategory::Unknown
        };
        LlmError::with_provider(category, err.to_string(), provider)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RefinerError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // LLM Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Llm(LlmError),

    /// Every drafting attempt was rate limited
    #[error("Max retries exceeded after {attempts} attempts.")]
    RetriesExhausted { attempts: u32 },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<LlmError> for RefinerError {
    fn from(err: LlmError) -> Self {
        RefinerError::Llm(err)
    }
}

pub type Result<T> = std::result::Result<T, RefinerError>;

impl RefinerError {
    /// Create an LLM error with category
    pub fn llm(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Llm(LlmError::new(category, message))
    }

    /// Check if this error is a rate-limit signal from a provider
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_rate_limit())
    }
}

// =============================================================================
// Tests
// =============================================================================
