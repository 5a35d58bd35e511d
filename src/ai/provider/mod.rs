//! LLM Provider Abstraction
//!
//! Defines the `LlmProvider` trait for text generation and the
//! `ModelRegistry` trait for model discovery.
//! All providers return `LlmResponse` with token usage metrics.
//!
//! ## Modules
//!
//! - `gemini`: Generative Language API (multimodal drafting, model listing)
//! - `groq`: OpenAI-compatible chat completions (refinement)

mod gemini;
mod groq;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{RefinerError, Result};

// =============================================================================
// Model Inputs
// =============================================================================

/// Decoded image ready to be sent as inline model input
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    /// MIME type of `data` (e.g. `image/png`)
    pub mime_type: String,
    /// Original encoded bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// One piece of model input, in the order it should be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    Image(ImageInput),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Image(_) => None,
        }
    }
}

/// Provider-agnostic generation request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    /// System instruction, if the call has one
    pub system: Option<String>,
    /// Ordered user content
    pub parts: Vec<ContentPart>,
}

impl GenerationRequest {
    pub fn new(parts: Vec<ContentPart>) -> Self {
        Self {
            parts,
            ..Self::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Concatenate all text parts with newlines
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::Image(_)))
            .count()
    }
}

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including content and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub content: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Gemini `usageMetadata`
    pub fn from_gemini(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            input_tokens: prompt_token_count,
            output_tokens: candidates_token_count,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock)
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

// =============================================================================
// Model Registry
// =============================================================================

/// A model advertised by a provider's registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Fully qualified name, e.g. `models/gemini-1.5-flash`
    pub name: String,
    pub display_name: Option<String>,
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == method)
    }
}

/// Lists the models a provider can serve
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Shared LLM provider type for use across request handlers.
pub type SharedProvider = Arc<dyn LlmProvider>;

/// LLM Provider trait for text generation with usage metrics
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Validate an API base URL and strip its trailing slash
pub(crate) fn normalize_api_base(api_base: &str, provider: &str) -> Result<String> {
    let url = url::Url::parse(api_base).map_err(|e| {
        RefinerError::Config(format!(
            "Invalid {} endpoint URL '{}': {}",
            provider, api_base, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RefinerError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::from_gemini(120, 30);
        assert_eq!(usage.total(), 150);
    }

    #[test]
    fn test_joined_text_skips_images() {
        let request = GenerationRequest::new(vec![
            ContentPart::text("first"),
            ContentPart::Image(ImageInput {
                mime_type: "image/png".to_string(),
                data: vec![1, 2, 3],
                width: 1,
                height: 1,
            }),
            ContentPart::text("second"),
        ]);
        assert_eq!(request.joined_text(), "first\nsecond");
        assert_eq!(request.image_count(), 1);
    }

    #[test]
    fn test_model_supports_method() {
        let model = ModelInfo {
            name: "models/gemini-1.5-flash".to_string(),
            display_name: None,
            supported_generation_methods: vec![
                "generateContent".to_string(),
                "countTokens".to_string(),
            ],
        };
        assert!(model.supports("generateContent"));
        assert!(!model.supports("embedContent"));
    }

    #[test]
    fn test_normalize_api_base() {
        assert_eq!(
            normalize_api_base("https://api.groq.com/openai/v1/", "groq").unwrap(),
            "https://api.groq.com/openai/v1"
        );
        assert!(normalize_api_base("ftp://example.com", "groq").is_err());
        assert!(normalize_api_base("not a url", "gemini").is_err());
    }
}
