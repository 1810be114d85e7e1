//! `aonui sync`: fetch the newest complete run.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aonui_core::download::DATASET_TEMP_PREFIX;
use aonui_core::{
    DEFAULT_MAX_DOWNLOADS, DataSource, DownloadLimiter, FetchStrategy, HttpClient, SyncEngine, TemporaryFileSet,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::config::FileConfig;
use crate::app::{progress_manager, terminal};
use crate::cli::SyncArgs;

/// Runs examined when neither flag nor config says otherwise.
const DEFAULT_MAX_RUNS: usize = 3;

/// Effective sync settings after applying flag > config file > default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyncSettings {
    pub base_dir: PathBuf,
    pub high_res: bool,
    pub max_runs: usize,
    pub max_downloads: usize,
    pub strategy: FetchStrategy,
}

impl SyncSettings {
    pub(crate) fn resolve(args: &SyncArgs, file: &FileConfig) -> Self {
        let base_dir = args
            .base_dir
            .clone()
            .or_else(|| file.base_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let max_runs = args.max_runs.or(file.max_runs).map_or(DEFAULT_MAX_RUNS, usize::from);
        let max_downloads = args
            .max_downloads
            .or(file.max_downloads)
            .map_or(DEFAULT_MAX_DOWNLOADS, usize::from);

        let mut strategy = FetchStrategy::default();
        if let Some(max_retries) = args.max_retries.or(file.max_retries) {
            strategy = strategy.with_max_retries(max_retries);
        }
        if let Some(secs) = file.retry_sleep_secs {
            strategy = strategy.with_retry_sleep(Duration::from_secs(secs));
        }
        if let Some(secs) = file.fetch_timeout_secs {
            strategy = strategy.with_fetch_timeout(Duration::from_secs(secs));
        }

        Self {
            base_dir,
            high_res: args.high_res,
            max_runs,
            max_downloads,
            strategy,
        }
    }

    fn data_source(&self) -> DataSource {
        let preset = if self.high_res {
            DataSource::gfs_quarter_degree()
        } else {
            DataSource::gfs_half_degree()
        };
        preset.with_strategy(self.strategy)
    }
}

/// Syncs the newest complete run into the base directory and prints the
/// written path. Ctrl-C abandons the sync and removes its temporary files.
pub(crate) async fn run_sync_command(args: &SyncArgs, file: &FileConfig, quiet: bool) -> Result<ProcessExit> {
    let settings = SyncSettings::resolve(args, file);
    debug!(?settings, "sync settings resolved");

    tokio::fs::create_dir_all(&settings.base_dir)
        .await
        .with_context(|| format!("Failed to create base directory '{}'", settings.base_dir.display()))?;

    let source = Arc::new(settings.data_source());
    info!(root = %source.root(), "syncing from data source");

    let engine = SyncEngine::new(HttpClient::new(), DownloadLimiter::new(settings.max_downloads));
    let temp_files = TemporaryFileSet::new(&settings.base_dir, DATASET_TEMP_PREFIX);

    let use_spinner = terminal::should_use_spinner(io::stderr().is_terminal(), quiet, terminal::is_dumb_terminal());
    let (progress_handle, progress_stop) = progress_manager::spawn_progress_ui(use_spinner, engine.stats());

    let outcome = tokio::select! {
        result = engine.sync_source(&source, &settings.base_dir, settings.max_runs, &temp_files) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    progress_manager::stop_progress_ui(progress_handle, &progress_stop).await;

    match outcome {
        Some(Ok(path)) => {
            println!("{}", path.display());
            Ok(ProcessExit::Success)
        }
        Some(Err(e)) => Err(e).context("sync failed"),
        None => {
            let removed = temp_files.close();
            warn!(removed, "interrupted, cleaned up temporary files");
            Ok(ProcessExit::Interrupted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = SyncSettings::resolve(&SyncArgs::default(), &FileConfig::default());
        assert_eq!(settings.base_dir, PathBuf::from("."));
        assert!(!settings.high_res);
        assert_eq!(settings.max_runs, 3);
        assert_eq!(settings.max_downloads, 5);
        assert_eq!(settings.strategy, FetchStrategy::default());
    }

    #[test]
    fn test_settings_config_file_overrides_defaults() {
        let file = FileConfig {
            base_dir: Some(PathBuf::from("/data")),
            max_runs: Some(6),
            max_downloads: Some(2),
            max_retries: Some(4),
            retry_sleep_secs: Some(1),
            fetch_timeout_secs: Some(60),
            wgrib2: None,
        };
        let settings = SyncSettings::resolve(&SyncArgs::default(), &file);

        assert_eq!(settings.base_dir, PathBuf::from("/data"));
        assert_eq!(settings.max_runs, 6);
        assert_eq!(settings.max_downloads, 2);
        assert_eq!(settings.strategy.max_retries(), 4);
        assert_eq!(settings.strategy.retry_sleep(), Duration::from_secs(1));
        assert_eq!(settings.strategy.fetch_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_settings_flags_override_config_file() {
        let file = FileConfig {
            base_dir: Some(PathBuf::from("/data")),
            max_runs: Some(6),
            max_downloads: Some(2),
            max_retries: Some(4),
            ..FileConfig::default()
        };
        let args = SyncArgs {
            base_dir: Some(PathBuf::from("/scratch")),
            high_res: true,
            max_runs: Some(1),
            max_downloads: Some(9),
            max_retries: Some(2),
        };
        let settings = SyncSettings::resolve(&args, &file);

        assert_eq!(settings.base_dir, PathBuf::from("/scratch"));
        assert!(settings.high_res);
        assert_eq!(settings.max_runs, 1);
        assert_eq!(settings.max_downloads, 9);
        assert_eq!(settings.strategy.max_retries(), 2);
    }

    #[test]
    fn test_settings_select_preset_by_resolution() {
        let low = SyncSettings::resolve(&SyncArgs::default(), &FileConfig::default()).data_source();
        assert_eq!(low.min_datasets(), 186);

        let args = SyncArgs {
            high_res: true,
            ..SyncArgs::default()
        };
        let high = SyncSettings::resolve(&args, &FileConfig::default()).data_source();
        assert_eq!(high.min_datasets(), 146);
        assert_eq!(high.max_forecast_hour(), 0);
    }
}
