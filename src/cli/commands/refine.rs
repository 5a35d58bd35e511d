//! Refine Command
//!
//! Runs the pipeline once from the command line and prints the result.
//!
//! Usage:
//!   prompt-refiner refine "Build a todo app" --file brief.pdf --file mockup.png

use std::path::PathBuf;

use crate::cli::{CommandContext, Output, uploads_from_paths};
use crate::pipeline::{RefinePipeline, RefineSource};
use crate::types::Result;

pub async fn run(
    ctx: &CommandContext,
    prompt: &str,
    files: &[PathBuf],
    output: &Output,
) -> Result<()> {
    let uploads = uploads_from_paths(files)?;

    let (pipeline, selection) = RefinePipeline::from_config(&ctx.config, &ctx.credentials).await?;
    output.info(&format!(
        "Drafting with {} ({}), refining with {}",
        selection.model,
        selection.source,
        pipeline.refining_model()
    ));

    let outcome = pipeline.run(prompt, uploads).await?;

    if outcome.source == RefineSource::DraftFallback {
        output.warning("Refinement failed; showing the cleaned draft");
    }
    output.result(&outcome.refined_prompt);
    Ok(())
}
