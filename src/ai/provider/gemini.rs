//! Gemini API Provider
//!
//! Drafting provider backed by the Generative Language REST API.
//! Supports mixed text and inline image input, and lists available models
//! for startup model selection.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{
    ContentPart, GenerationRequest, LlmProvider, LlmResponse, ModelInfo, ModelRegistry,
    ResponseTiming, TokenUsage, normalize_api_base,
};
use crate::config::DraftingConfig;
use crate::constants::drafting::MAX_REGISTRY_PAGES;
use crate::types::{ErrorCategory, ErrorClassifier, LlmError, RefinerError, Result};

const PROVIDER_NAME: &str = "gemini";
const API_KEY_HEADER: &str = "x-goog-api-key";
const LIST_PAGE_SIZE: u32 = 1000;

/// Gemini provider with secure API key handling
pub struct GeminiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: SecretString,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a provider bound to the configured fallback model.
    /// Call [`GeminiProvider::with_model`] once selection has run.
    pub fn new(config: &DraftingConfig, api_key: SecretString) -> Result<Self> {
        let api_base = normalize_api_base(&config.api_base, PROVIDER_NAME)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RefinerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base,
            model: config.fallback_model.clone(),
            client,
        })
    }

    /// Rebind the provider to another model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/{}:generateContent", self.api_base, qualified_model(&self.model))
    }

    fn build_request(&self, request: &GenerationRequest) -> GenerateContentRequest {
        let parts = request.parts.iter().map(Part::from_content).collect();

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            system_instruction: request.system.as_ref().map(|system| Content {
                role: None,
                parts: vec![Part::Text {
                    text: system.clone(),
                }],
            }),
        }
    }

    async fn error_from_response(response: reqwest::Response) -> LlmError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) => ErrorClassifier::classify_response(
                status.as_u16(),
                envelope.error.status.as_deref(),
                &format!("Gemini API error ({}): {}", status, envelope.error.message),
                PROVIDER_NAME,
            ),
            Err(_) => ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("Gemini API error ({}): {}", status, body),
                PROVIDER_NAME,
            ),
        }
    }

    async fn list_page(&self, page_token: Option<&str>) -> Result<ListModelsResponse> {
        let url = format!("{}/models", self.api_base);
        let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await.into());
        }

        response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME).into())
    }
}

/// Model names from the registry are already `models/...`; bare names get the prefix
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<LlmResponse> {
        info!(
            "Generating with Gemini (model: {}, parts: {}, images: {})",
            self.model,
            request.parts.len(),
            request.image_count()
        );

        let start_time = Instant::now();
        let body = self.build_request(request);

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(self.generate_url())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await.into());
        }

        let response_body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, PROVIDER_NAME))?;

        let usage = response_body
            .usage_metadata
            .as_ref()
            .map(|u| TokenUsage::from_gemini(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        let content = response_body.text().ok_or_else(|| {
            LlmError::with_provider(
                ErrorCategory::Unknown,
                response_body.empty_reason(),
                PROVIDER_NAME,
            )
        })?;

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

#[async_trait]
impl ModelRegistry for GeminiProvider {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_REGISTRY_PAGES {
            let page = self.list_page(page_token.as_deref()).await?;
            models.extend(page.models.into_iter().map(ModelInfo::from));

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = models.len(), "Listed Gemini models");
        Ok(models)
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    fn from_content(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text(text) => Part::Text { text: text.clone() },
            ContentPart::Image(image) => Part::InlineData {
                inline_data: Blob {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.data),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, if it produced any
    fn text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("Prompt was blocked: {}", reason);
        }
        match self
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            Some(reason) => format!("Response contained no text (finish reason: {})", reason),
            None => "Response contained no candidates".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

impl From<ModelEntry> for ModelInfo {
    fn from(entry: ModelEntry) -> Self {
        Self {
            name: entry.name,
            display_name: entry.display_name,
            supported_generation_methods: entry.supported_generation_methods,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::ImageInput;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            &DraftingConfig::default(),
            SecretString::from("test-key".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_url_uses_qualified_model() {
        let p = provider().with_model("gemini-1.5-pro");
        assert_eq!(
            p.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );

        let p = provider();
        assert!(p.generate_url().ends_with("/models/gemini-1.5-flash:generateContent"));
    }

    #[test]
    fn test_request_serialization_keeps_part_order() {
        let request = GenerationRequest::new(vec![
            ContentPart::text("instruction"),
            ContentPart::Image(ImageInput {
                mime_type: "image/png".to_string(),
                data: vec![0xde, 0xad],
                width: 1,
                height: 1,
            }),
            ContentPart::text("\n[PDF Content]\nbody"),
        ]);

        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "instruction");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "3q0=");
        assert_eq!(parts[2]["text"], "\n[PDF Content]\nbody");
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_request_with_system_instruction() {
        let request =
            GenerationRequest::new(vec![ContentPart::text("hi")]).with_system("be brief");
        let body = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn test_response_text_concatenates_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Hello "}, {"text": "world"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 2}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().as_deref(), Some("Hello world"));
    }

    #[test]
    fn test_blocked_response_has_no_text() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.empty_reason(), "Prompt was blocked: SAFETY");
    }

    #[test]
    fn test_list_models_page_parsing() {
        let raw = r#"{
            "models": [
                {"name": "models/gemini-1.5-flash", "displayName": "Gemini 1.5 Flash",
                 "supportedGenerationMethods": ["generateContent", "countTokens"]},
                {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
            ],
            "nextPageToken": "abc"
        }"#;
        let page: ListModelsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.models.len(), 2);
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));

        let info = ModelInfo::from(page.models.into_iter().next().unwrap());
        assert!(info.supports("generateContent"));
        assert_eq!(info.display_name.as_deref(), Some("Gemini 1.5 Flash"));
    }

    #[test]
    fn test_error_envelope_parsing() {
        let raw = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.error.status.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert_eq!(envelope.error.message, "Quota exceeded");
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-key"));
    }
}
