//! `aonui reorder`: splice a local file into Tawhiri order.

use anyhow::{Context, Result};
use aonui_core::{GribTool, reorder_composite};
use tracing::info;

use crate::cli::ReorderArgs;

pub(crate) async fn run_reorder_command(args: &ReorderArgs, tool: &dyn GribTool) -> Result<()> {
    let inventory = reorder_composite(tool, &args.input, &args.output)
        .await
        .with_context(|| format!("Failed to reorder '{}'", args.input.display()))?;
    info!(records = inventory.len(), path = %args.output.display(), "wrote reordered file");
    Ok(())
}
