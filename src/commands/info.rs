//! `aonui info`: summarize a file's Tawhiri dimensions.

use anyhow::{Context, Result};
use aonui_core::{GribInfo, GribTool, collate_info};

use crate::cli::InfoArgs;

pub(crate) async fn run_info_command(args: &InfoArgs, tool: &dyn GribTool) -> Result<()> {
    let info = collate_info(tool, &args.input)
        .await
        .with_context(|| format!("Failed to read '{}'", args.input.display()))?;
    print!("{}", render(&info, args.json)?);
    Ok(())
}

fn render(info: &GribInfo, json: bool) -> Result<String> {
    if json {
        let mut text = serde_json::to_string_pretty(info).context("Failed to encode info as JSON")?;
        text.push('\n');
        Ok(text)
    } else {
        Ok(info.to_string())
    }
}
