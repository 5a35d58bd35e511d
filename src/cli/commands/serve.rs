//! Serve Command
//!
//! Selects the drafting model, then serves `POST /refine-prompt` until
//! Ctrl-C.

use crate::ai::SelectionSource;
use crate::cli::{CommandContext, Output};
use crate::pipeline::RefinePipeline;
use crate::server;
use crate::types::Result;

pub async fn run(
    mut ctx: CommandContext,
    host: Option<String>,
    port: Option<u16>,
    output: &Output,
) -> Result<()> {
    if let Some(host) = host {
        ctx.config.server.host = host;
    }
    if let Some(port) = port {
        ctx.config.server.port = port;
    }
    ctx.config.validate()?;

    let (pipeline, selection) = RefinePipeline::from_config(&ctx.config, &ctx.credentials).await?;

    match selection.source {
        SelectionSource::Registry => {
            output.success(&format!("Locked on drafting model: {}", selection.model))
        }
        SelectionSource::Fallback => output.warning(&format!(
            "Model registry unavailable, using fallback: {}",
            selection.model
        )),
    }
    output.field("Refining model", pipeline.refining_model());
    output.field(
        "Listening on",
        &format!(
            "http://{}:{}{}",
            ctx.config.server.host,
            ctx.config.server.port,
            server::REFINE_ROUTE
        ),
    );

    server::serve(&ctx.config.server, pipeline).await
}
