//! [`GribTool`] backed by the `wgrib2` command-line program.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{GribError, GribTool};
use crate::inventory::{InventoryItem, short_lines};

/// Program looked up on `PATH` when no other command is configured.
pub const DEFAULT_WGRIB2_COMMAND: &str = "wgrib2";

/// Runs `wgrib2` as a subprocess. Its standard error is passed through.
#[derive(Debug, Clone)]
pub struct Wgrib2 {
    command: String,
}

impl Default for Wgrib2 {
    fn default() -> Self {
        Self::new(DEFAULT_WGRIB2_COMMAND)
    }
}

impl Wgrib2 {
    /// Uses `command` (a program name or path) as the tool.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The configured program.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Runs the tool with `args`, feeding `stdin_lines` (if any) one per
    /// line, and returns its standard output.
    async fn run<I, S>(&self, args: I, stdin_lines: Option<Vec<String>>) -> Result<Vec<u8>, GribError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(&self.command)
            .args(args)
            .stdin(if stdin_lines.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GribError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            let (Some(mut stdin), Some(lines)) = (stdin, stdin_lines) else {
                return Ok::<(), std::io::Error>(());
            };
            for line in lines {
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
            }
            stdin.shutdown().await
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|source| GribError::Spawn {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(GribError::ToolFailed {
                command: self.command.clone(),
                status: output.status,
            });
        }
        fed.map_err(|source| GribError::Stdin {
            command: self.command.clone(),
            source,
        })?;

        Ok(output.stdout)
    }
}

#[async_trait]
impl GribTool for Wgrib2 {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn short_inventory(&self, path: &Path) -> Result<String, GribError> {
        let stdout = self.run([OsStr::new("-s"), path.as_os_str()], None).await?;
        debug!(bytes = stdout.len(), "read inventory");
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    #[instrument(skip(self, items), fields(input = %input.display(), records = items.len()))]
    async fn grid_listing(&self, items: &[&InventoryItem], input: &Path) -> Result<String, GribError> {
        let lines = short_lines(items.iter().copied());
        let stdout = self
            .run(
                [OsStr::new("-i"), OsStr::new("-nxny"), input.as_os_str()],
                Some(lines),
            )
            .await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    #[instrument(skip(self, items), fields(input = %input.display(), output = %output.display(), records = items.len()))]
    async fn expand(&self, items: &[&InventoryItem], input: &Path, output: &Path) -> Result<(), GribError> {
        let lines = short_lines(items.iter().copied());
        self.run(
            [
                OsStr::new("-i"),
                OsStr::new("-no_header"),
                OsStr::new("-bin"),
                output.as_os_str(),
                input.as_os_str(),
            ],
            Some(lines),
        )
        .await?;
        Ok(())
    }
}
