//! Groq API Provider
//!
//! Refining provider using Groq's OpenAI-compatible Chat Completions API.
//! Text only: requests carrying images are rejected before any network call.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{
    GenerationRequest, LlmProvider, LlmResponse, ResponseTiming, TokenUsage, normalize_api_base,
};
use crate::config::RefiningConfig;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, RefinerError, Result};

const PROVIDER_NAME: &str = "groq";

/// Groq API Provider with secure API key handling
pub struct GroqProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl std::fmt::Debug for GroqProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GroqProvider {
    pub fn new(config: &RefiningConfig, api_key: SecretString) -> Result<Self> {
        let api_base = normalize_api_base(&config.api_base, PROVIDER_NAME)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RefinerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base,
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        })
    }

    fn build_request(&self, request: &GenerationRequest) -> Result<ChatCompletionRequest> {
        if request.image_count() > 0 {
            return Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                "Chat completions accept text input only",
                PROVIDER_NAME,
            )
            .into());
        }

        let user_content = request.joined_text();
        if user_content.is_empty() {
            return Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                "Request has no text content",
                PROVIDER_NAME,
            )
            .into());
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user_content,
        });

        Ok(ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
        })
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        let body = self.build_request(request)?;

        info!(
            "Generating with Groq (model: {}, temperature: {})",
            self.model, body.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to Groq API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Groq API error ({}): {}", status, message),
                PROVIDER_NAME,
            )
            .into());
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        let usage = response_body
            .usage
            .as_ref()
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                LlmError::with_provider(
                    ErrorCategory::Unknown,
                    "No content in Groq response",
                    PROVIDER_NAME,
                )
            })?;

        debug!(
            tokens = usage.total(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Received response from Groq"
        );

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}
