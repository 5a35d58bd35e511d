//! Draft stage: first generation call with rate-limit retry.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tracing::{debug, error, info, warn};

use crate::ai::{ContentPart, GenerationRequest, SharedProvider, draft_instruction};
use crate::config::DraftingConfig;
use crate::types::{RefinerError, Result};

/// Fixed-delay retry applied only to rate-limit failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &DraftingConfig) -> Self {
        Self::new(config.max_attempts, config.rate_limit_delay())
    }

    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }
}

pub struct Drafter {
    provider: SharedProvider,
    policy: RetryPolicy,
}

impl Drafter {
    pub fn new(provider: SharedProvider, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Build the drafting request: instruction first, then context inputs
    pub fn build_request(user_prompt: &str, context: &[ContentPart]) -> GenerationRequest {
        let mut parts = Vec::with_capacity(context.len() + 1);
        parts.push(ContentPart::text(draft_instruction(user_prompt)));
        parts.extend_from_slice(context);
        GenerationRequest::new(parts)
    }

    /// Produce a draft, waiting out rate limits.
    ///
    /// Non-rate-limit failures return immediately. When every attempt is
    /// rate limited the result is [`RefinerError::RetriesExhausted`].
    pub async fn draft(&self, user_prompt: &str, context: &[ContentPart]) -> Result<String> {
        let request = Self::build_request(user_prompt, context);
        let counter = AtomicU32::new(0);

        info!(
            "Drafting with {}/{} (inputs: {})",
            self.provider.name(),
            self.provider.model(),
            request.parts.len()
        );

        let provider = &self.provider;
        let request = &request;
        let attempts = &counter;
        let max_attempts = self.policy.max_attempts;

        let result = (|| async move {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(attempt, max_attempts, "Draft attempt");
            provider.generate(request).await
        })
        .retry(self.policy.backoff())
        .sleep(tokio::time::sleep)
        .when(|e: &RefinerError| e.is_rate_limited())
        .notify(|e: &RefinerError, wait: Duration| {
            warn!(
                "Quota hit, waiting {}s before retrying ({}/{}): {}",
                wait.as_secs(),
                attempts.load(Ordering::SeqCst),
                max_attempts,
                e
            );
        })
        .await;

        match result {
            Ok(response) => {
                info!(
                    "Draft complete ({} chars, {} tokens, {}ms)",
                    response.content.chars().count(),
                    response.usage.total(),
                    response.timing.total_ms
                );
                Ok(response.content)
            }
            Err(e) if e.is_rate_limited() => {
                let attempts = counter.load(Ordering::SeqCst);
                error!("Draft still rate limited after {} attempts: {}", attempts, e);
                Err(RefinerError::RetriesExhausted { attempts })
            }
            Err(e) => {
                error!("Draft failed on {}: {}", self.provider.name(), e);
                Err(e)
            }
        }
    }
}
