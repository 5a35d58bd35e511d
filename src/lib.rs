//! Prompt Refiner - Two-Stage Prompt Specification Service
//!
//! Turns a rough user prompt plus optional attachments (PDF, Word, images)
//! into a structured, five-section prompt specification.
//!
//! ## Pipeline
//!
//! 1. **Extract**: per-upload text or image context, best-effort
//! 2. **Draft**: multimodal generation call, retried on rate limits
//! 3. **Refine**: chat call enforcing the five-section layout
//! 4. **Clean**: strip code fences and preamble
//!
//! A draft failure fails the request; a refine failure degrades to the
//! cleaned draft.
//!
//! ## Quick Start
//!
//! ```ignore
//! use prompt_refiner::{ConfigLoader, Credentials, RefinePipeline};
//!
//! let config = ConfigLoader::load(None)?;
//! let credentials = Credentials::from_env()?;
//! let (pipeline, selection) = RefinePipeline::from_config(&config, &credentials).await?;
//! let outcome = pipeline.run("Build a todo app", Vec::new()).await?;
//! println!("{}", outcome.refined_prompt);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: provider clients, model selection, prompts, response cleaner
//! - [`extract`]: PDF, Word and image extraction
//! - [`pipeline`]: draft/refine orchestration
//! - [`server`]: axum HTTP endpoint
//! - [`config`]: layered configuration and credentials

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod extract;
pub mod pipeline;
pub mod server;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader, Credentials};

// Error Types
pub use types::error::{ErrorCategory, LlmError, RefinerError, Result};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use extract::{DocumentKind, ExtractError, Extracted, Upload};
pub use pipeline::{
    Drafter, ExtractedContext, RefineOutcome, RefinePipeline, RefineSource, Refiner, RetryPolicy,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    ContentPart, GeminiProvider, GenerationRequest, GroqProvider, LlmProvider, LlmResponse,
    ModelSelection, SelectionSource, clean_response, select_default_model,
};
