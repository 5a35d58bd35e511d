//! Global Constants
//!
//! Centralized defaults for the refinement pipeline.
//! All magic numbers should be defined here with documentation.

/// Drafting stage (generation API) constants
pub mod drafting {
    /// Generative Language REST endpoint
    pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Model used when the registry cannot be queried
    pub const FALLBACK_MODEL: &str = "models/gemini-1.5-flash";

    /// Preferred fast-tier model marker
    pub const PREFERRED_MARKER: &str = "gemini-1.5-flash";

    /// Lightweight variant excluded from the preferred tier
    pub const EXCLUDED_MARKER: &str = "8b";

    /// Generic fast-tier marker (matched case-insensitively)
    pub const FAST_MARKER: &str = "flash";

    /// Generation method a model must support to be selectable
    pub const GENERATE_CONTENT_METHOD: &str = "generateContent";

    /// Total attempts for a draft call, including the first
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Pause between rate-limited attempts (seconds)
    pub const RATE_LIMIT_DELAY_SECS: u64 = 30;

    /// Request timeout (seconds)
    pub const TIMEOUT_SECS: u64 = 300;

    /// Upper bound on registry pages fetched during model selection
    pub const MAX_REGISTRY_PAGES: usize = 20;
}

/// Refining stage (chat-completion API) constants
pub mod refining {
    /// OpenAI-compatible Groq endpoint
    pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

    pub const MODEL: &str = "llama3-8b-8192";

    /// Low temperature keeps the output on the five-section format
    pub const TEMPERATURE: f32 = 0.1;

    /// Request timeout (seconds)
    pub const TIMEOUT_SECS: u64 = 120;
}

/// Context size limits
pub mod limits {
    /// Characters of extracted text each file contributes to the draft call
    pub const FILE_EXCERPT_CHARS: usize = 8000;

    /// Characters of accumulated context forwarded to the refiner
    pub const REFINE_CONTEXT_CHARS: usize = 2000;
}

/// HTTP server constants
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    pub const DEFAULT_PORT: u16 = 8000;

    /// Maximum accepted multipart body (25 MiB)
    pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
}

/// Environment variables carrying credentials
pub mod env {
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

    pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

    /// Prefix for configuration overrides (e.g. PROMPT_REFINER_SERVER__PORT)
    pub const CONFIG_PREFIX: &str = "PROMPT_REFINER_";
}
