//! `aonui inv`: print a file's inventory in short format.

use std::io::{self, Write};

use anyhow::Result;
use aonui_core::inventory::short_lines;
use aonui_core::{GribTool, TawhiriOptions, load_inventory, tawhiri_order};

use crate::cli::InvArgs;

pub(crate) async fn run_inv_command(args: &InvArgs, tool: &dyn GribTool) -> Result<()> {
    let inventory = load_inventory(tool, &args.input).await?;
    let options = TawhiriOptions {
        sort: !args.no_sort,
        filter: !args.no_filter,
    };
    let ordered = tawhiri_order(&inventory, options);

    let mut out = io::stdout().lock();
    for line in short_lines(ordered) {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}
