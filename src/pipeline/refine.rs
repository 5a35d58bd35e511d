//! Refine stage: one chat call that restructures the draft.

use tracing::{info, warn};

use crate::ai::{
    ContentPart, GenerationRequest, REFINER_SYSTEM, SharedProvider, missing_sections,
    refiner_user_message,
};
use crate::types::Result;

pub struct Refiner {
    provider: SharedProvider,
}

impl Refiner {
    pub fn new(provider: SharedProvider) -> Self {
        Self { provider }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn build_request(user_prompt: &str, draft: &str, context: &str) -> GenerationRequest {
        GenerationRequest::new(vec![ContentPart::text(refiner_user_message(
            user_prompt,
            draft,
            context,
        ))])
        .with_system(REFINER_SYSTEM)
    }

    /// Single call, no retry. `context` must already be capped.
    pub async fn refine(&self, user_prompt: &str, draft: &str, context: &str) -> Result<String> {
        info!(
            "Refining with {}/{}",
            self.provider.name(),
            self.provider.model()
        );

        let request = Self::build_request(user_prompt, draft, context);
        let response = self.provider.generate(&request).await?;

        info!(
            "Refinement complete ({} tokens, {}ms)",
            response.usage.total(),
            response.timing.total_ms
        );

        let missing = missing_sections(&response.content);
        if !missing.is_empty() {
            warn!(
                "Refined prompt from {} is missing sections: {}",
                self.provider.name(),
                missing.join(", ")
            );
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_carries_system_and_message() {
        let request = Refiner::build_request("todo", "Draft text", "ctx");
        assert_eq!(request.system.as_deref(), Some(REFINER_SYSTEM));
        assert_eq!(request.parts.len(), 1);

        let message = request.parts[0].as_text().unwrap();
        assert!(message.starts_with("Refine this.\nUser Intent: todo\n"));
        assert!(message.contains("Gemini Draft: Draft text"));
        assert!(message.contains("Context: ctx"));
    }
}
