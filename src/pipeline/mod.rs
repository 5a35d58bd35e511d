//! Refinement Pipeline
//!
//! Runs one request end to end:
//!
//! ```text
//! uploads ─▶ extract ─▶ draft (retry on rate limit) ─▶ refine ─▶ clean
//!                           │ failure                    │ failure
//!                           ▼                            ▼
//!                     request error               clean(draft)
//! ```
//!
//! Stages run strictly in sequence. The draft stage is load-bearing; the
//! refine stage only improves the result and degrades to the cleaned draft.

mod context;
mod draft;
mod refine;

pub use context::ExtractedContext;
pub use draft::{Drafter, RetryPolicy};
pub use refine::Refiner;

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{
    GeminiProvider, GroqProvider, ModelSelection, SelectionRules, clean_response,
    select_default_model,
};
use crate::config::{Config, Credentials, LimitsConfig};
use crate::extract::Upload;
use crate::types::Result;

/// Which stage produced the returned prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefineSource {
    Refined,
    DraftFallback,
}

impl fmt::Display for RefineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refined => write!(f, "refined"),
            Self::DraftFallback => write!(f, "draft-fallback"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefineOutcome {
    pub refined_prompt: String,
    pub source: RefineSource,
}

pub struct RefinePipeline {
    drafter: Drafter,
    refiner: Refiner,
    limits: LimitsConfig,
}

impl RefinePipeline {
    pub fn new(drafter: Drafter, refiner: Refiner, limits: LimitsConfig) -> Self {
        Self {
            drafter,
            refiner,
            limits,
        }
    }

    /// Build the production pipeline: select the drafting model once, then
    /// wire both hosted providers.
    pub async fn from_config(
        config: &Config,
        credentials: &Credentials,
    ) -> Result<(Self, ModelSelection)> {
        let gemini = GeminiProvider::new(&config.drafting, credentials.google_api_key.clone())?;
        let rules = SelectionRules::from_config(&config.drafting);
        let selection = select_default_model(&gemini, &rules).await;
        let gemini = gemini.with_model(selection.model.clone());

        let groq = GroqProvider::new(&config.refining, credentials.groq_api_key.clone())?;

        let pipeline = Self::new(
            Drafter::new(Arc::new(gemini), RetryPolicy::from_config(&config.drafting)),
            Refiner::new(Arc::new(groq)),
            config.limits,
        );

        Ok((pipeline, selection))
    }

    pub fn drafting_model(&self) -> &str {
        self.drafter.model()
    }

    pub fn refining_model(&self) -> &str {
        self.refiner.model()
    }

    /// Extract uploads off the async runtime; never fails
    pub async fn extract(&self, uploads: Vec<Upload>) -> ExtractedContext {
        if uploads.is_empty() {
            return ExtractedContext::new();
        }

        info!("Processing {} file(s)", uploads.len());
        let limits = self.limits;
        tokio::task::spawn_blocking(move || ExtractedContext::from_uploads(&uploads, &limits))
            .await
            .unwrap_or_else(|e| {
                warn!("Extraction task failed, continuing without context: {}", e);
                ExtractedContext::new()
            })
    }

    /// Run the full pipeline for one request.
    ///
    /// Only a draft-stage failure is returned as an error.
    pub async fn run(&self, user_prompt: &str, uploads: Vec<Upload>) -> Result<RefineOutcome> {
        let context = self.extract(uploads).await;

        let draft = self.drafter.draft(user_prompt, context.inputs()).await?;

        let refine_context = context.refine_context(self.limits.refine_context_chars);
        let outcome = match self.refiner.refine(user_prompt, &draft, refine_context).await {
            Ok(refined) => RefineOutcome {
                refined_prompt: clean_response(&refined),
                source: RefineSource::Refined,
            },
            Err(e) => {
                warn!("Refinement failed, returning cleaned draft: {}", e);
                RefineOutcome {
                    refined_prompt: clean_response(&draft),
                    source: RefineSource::DraftFallback,
                }
            }
        };

        info!(source = %outcome.source, "Pipeline complete");
        Ok(outcome)
    }
}
