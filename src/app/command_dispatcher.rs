//! CLI command routing: resolves shared settings and runs the chosen
//! subcommand.

use anyhow::Result;
use aonui_core::Wgrib2;
use aonui_core::grib::DEFAULT_WGRIB2_COMMAND;
use tracing::debug;

use crate::app::config::{self, FileConfig};
use crate::cli::{Cli, Command};
use crate::{ProcessExit, commands};

/// Loads the config file, then runs `cli`'s subcommand.
pub(crate) async fn dispatch(cli: &Cli) -> Result<ProcessExit> {
    let file_config = config::load_config(cli.config.as_deref())?;
    debug!(?file_config, "configuration loaded");

    match &cli.command {
        Command::Sync(args) => commands::run_sync_command(args, &file_config, cli.quiet).await,
        Command::Reorder(args) => {
            commands::run_reorder_command(args, &wgrib2_tool(cli, &file_config)).await?;
            Ok(ProcessExit::Success)
        }
        Command::Extract(args) => commands::run_extract_command(args, &wgrib2_tool(cli, &file_config)).await,
        Command::Info(args) => {
            commands::run_info_command(args, &wgrib2_tool(cli, &file_config)).await?;
            Ok(ProcessExit::Success)
        }
        Command::Inv(args) => {
            commands::run_inv_command(args, &wgrib2_tool(cli, &file_config)).await?;
            Ok(ProcessExit::Success)
        }
    }
}

/// `--wgrib2` / `AONUI_WGRIB2`, then the config file, then `wgrib2` on `PATH`.
pub(crate) fn wgrib2_command<'a>(cli_value: Option<&'a str>, file_config: &'a FileConfig) -> &'a str {
    cli_value
        .or(file_config.wgrib2.as_deref())
        .unwrap_or(DEFAULT_WGRIB2_COMMAND)
}

fn wgrib2_tool(cli: &Cli, file_config: &FileConfig) -> Wgrib2 {
    Wgrib2::new(wgrib2_command(cli.wgrib2.as_deref(), file_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgrib2_command_precedence() {
        let mut file_config = FileConfig::default();
        assert_eq!(wgrib2_command(None, &file_config), "wgrib2");

        file_config.wgrib2 = Some("/etc-configured/wgrib2".to_string());
        assert_eq!(wgrib2_command(None, &file_config), "/etc-configured/wgrib2");
        assert_eq!(wgrib2_command(Some("/flag/wgrib2"), &file_config), "/flag/wgrib2");
    }
}
