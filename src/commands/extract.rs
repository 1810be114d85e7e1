//! `aonui extract`: reorder a local file and expand it to raw floats.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aonui_core::grib::extract_temp_prefix;
use aonui_core::{GribTool, TemporaryFileSet, extract_binary};
use tracing::warn;

use crate::ProcessExit;
use crate::cli::ExtractArgs;

/// Directory for the temporary composite: `--tmpdir`, else the output's
/// directory.
pub(crate) fn temp_dir_for(tmp_dir: Option<&Path>, output: &Path) -> PathBuf {
    if let Some(dir) = tmp_dir {
        return dir.to_path_buf();
    }
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Ctrl-C abandons the extraction and removes the temporary composite.
pub(crate) async fn run_extract_command(args: &ExtractArgs, tool: &dyn GribTool) -> Result<ProcessExit> {
    let temp_files = TemporaryFileSet::new(
        temp_dir_for(args.tmp_dir.as_deref(), &args.output),
        extract_temp_prefix(&args.output),
    );

    tokio::select! {
        result = extract_binary(tool, &args.input, &args.output, &temp_files) => {
            result.with_context(|| format!("Failed to extract '{}'", args.input.display()))?;
            Ok(ProcessExit::Success)
        }
        _ = tokio::signal::ctrl_c() => {
            let removed = temp_files.close();
            warn!(removed, "interrupted, cleaned up temporary files");
            Ok(ProcessExit::Interrupted)
        }
    }
}
