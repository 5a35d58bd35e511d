//! AI Integration Layer
//!
//! Provider clients for drafting and refining, startup model selection,
//! prompt templates and response cleanup.

pub mod cleaner;
pub mod prompt;
pub mod provider;
pub mod selector;

pub use cleaner::clean_response;
pub use prompt::{
    REFINER_SYSTEM, SECTION_HEADINGS, draft_instruction, missing_sections, refiner_user_message,
};
pub use provider::{
    ContentPart, GeminiProvider, GenerationRequest, GroqProvider, ImageInput, LlmProvider,
    LlmResponse, ModelInfo, ModelRegistry, ResponseTiming, SharedProvider, TokenUsage,
};
pub use selector::{
    ModelSelection, SelectionRules, SelectionSource, generation_models, select_default_model,
};
