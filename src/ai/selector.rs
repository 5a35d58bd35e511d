//! Drafting Model Selection
//!
//! Chooses the drafting model once at startup from the provider registry.
//! Priority:
//! 1. first model containing the preferred marker and not the excluded marker
//! 2. first model containing the fast marker (case-insensitive)
//! 3. first listed model
//!
//! A registry failure or an empty registry falls back to a fixed identifier.

use std::fmt;

use tracing::info;

use super::provider::{ModelInfo, ModelRegistry};
use crate::config::DraftingConfig;
use crate::constants::drafting::{FAST_MARKER, GENERATE_CONTENT_METHOD};
use crate::types::log_filter_warn;

/// Name-matching rules for model selection
#[derive(Debug, Clone)]
pub struct SelectionRules {
    pub preferred_marker: String,
    pub excluded_marker: String,
    pub fast_marker: String,
    pub fallback_model: String,
}

impl SelectionRules {
    pub fn from_config(config: &DraftingConfig) -> Self {
        Self {
            preferred_marker: config.preferred_marker.clone(),
            excluded_marker: config.excluded_marker.clone(),
            fast_marker: FAST_MARKER.to_string(),
            fallback_model: config.fallback_model.clone(),
        }
    }

    /// Apply the priority order to candidate names
    pub fn pick<'a>(&self, names: &[&'a str]) -> Option<&'a str> {
        let fast = self.fast_marker.to_lowercase();

        names
            .iter()
            .find(|name| {
                name.contains(self.preferred_marker.as_str())
                    && !name.contains(self.excluded_marker.as_str())
            })
            .or_else(|| names.iter().find(|name| name.to_lowercase().contains(&fast)))
            .or_else(|| names.first())
            .copied()
    }
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self::from_config(&DraftingConfig::default())
    }
}

/// Where the selected model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSource {
    Registry,
    Fallback,
}

impl fmt::Display for SelectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry => write!(f, "registry"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Model chosen for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: String,
    pub source: SelectionSource,
}

impl ModelSelection {
    fn fallback(rules: &SelectionRules) -> Self {
        Self {
            model: rules.fallback_model.clone(),
            source: SelectionSource::Fallback,
        }
    }
}

/// Models from the registry that can serve content generation
pub fn generation_models(models: &[ModelInfo]) -> Vec<&str> {
    models
        .iter()
        .filter(|m| m.supports(GENERATE_CONTENT_METHOD))
        .map(|m| m.name.as_str())
        .collect()
}

/// Query the registry and pick the drafting model. Never fails.
pub async fn select_default_model(
    registry: &dyn ModelRegistry,
    rules: &SelectionRules,
) -> ModelSelection {
    let Some(models) = log_filter_warn(
        registry.list_models().await,
        "Model registry unavailable, using fallback model",
    ) else {
        return ModelSelection::fallback(rules);
    };

    let candidates = generation_models(&models);
    let selection = match rules.pick(&candidates) {
        Some(name) => ModelSelection {
            model: name.to_string(),
            source: SelectionSource::Registry,
        },
        None => ModelSelection::fallback(rules),
    };

    info!(
        model = %selection.model,
        source = %selection.source,
        candidates = candidates.len(),
        "Selected drafting model"
    );

    selection
}
