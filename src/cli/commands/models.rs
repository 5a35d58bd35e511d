//! Models Command
//!
//! Lists drafting models that support content generation and marks the
//! one startup selection would choose.

use crate::ai::{GeminiProvider, ModelRegistry, SelectionRules, generation_models};
use crate::cli::{CommandContext, Output};
use crate::types::Result;

pub async fn run(ctx: &CommandContext, output: &Output) -> Result<()> {
    let provider = GeminiProvider::new(
        &ctx.config.drafting,
        ctx.credentials.google_api_key.clone(),
    )?;

    // Unlike server startup, a registry failure is reported here
    let models = provider.list_models().await?;
    let names = generation_models(&models);
    let rules = SelectionRules::from_config(&ctx.config.drafting);

    let selected = rules
        .pick(&names)
        .map(str::to_string)
        .unwrap_or_else(|| rules.fallback_model.clone());

    output.section(&format!("Generation models ({})", names.len()));
    for name in &names {
        output.item(name, *name == selected);
    }

    if names.is_empty() {
        output.warning(&format!(
            "No generation models listed; the server would use {}",
            selected
        ));
    } else {
        output.success(&format!("Drafting model: {}", selected));
    }
    Ok(())
}
