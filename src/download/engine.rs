//! Concurrent run synchronization.
//!
//! This module provides the [`SyncEngine`], which assembles one GFS run into
//! a single composite GRIB2 file from the wanted records of every eligible
//! dataset, and falls back to older runs when a newer one is incomplete.
//!
//! # Concurrency Model
//!
//! - Each dataset is fetched by its own Tokio task held in a [`JoinSet`]
//! - A [`DownloadLimiter`] permit is held for the whole of a dataset's
//!   attempts and released on drop (RAII)
//! - Each attempt writes a fresh temporary file; a finished file is sent over
//!   an mpsc channel, a failed dataset sends nothing
//! - Every task owns a sender clone, so the channel closes exactly when the
//!   last task ends; the orchestrator drains it, appending files to the
//!   output in completion order
//! - Returning early drops the [`JoinSet`], which aborts the remaining tasks
//!
//! The assembled file is therefore in completion order, not Tawhiri order.
//! Run it through [`reorder_composite`](crate::grib::reorder_composite) when
//! canonical order is needed.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use aonui_core::{DataSource, DownloadLimiter, HttpClient, SyncEngine, TemporaryFileSet};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::new(HttpClient::new(), DownloadLimiter::new(5));
//! let source = Arc::new(DataSource::gfs_half_degree());
//! let temp_files = TemporaryFileSet::new(".", "dataset-");
//!
//! let path = engine.sync_source(&source, Path::new("."), 3, &temp_files).await?;
//! println!("wrote {}", path.display());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use super::byte_count::ByteCount;
use super::constants::{PARTIAL_SUFFIX, RUN_FILE_EXTENSION};
use super::error::SyncError;
use super::limiter::DownloadLimiter;
use super::temp_files::TemporaryFileSet;
use super::HttpClient;
use crate::inventory::RecordSelection;
use crate::source::{DataSource, Dataset, Run, SourceError, sort_newest_first};

/// Live counters for the run currently being synchronized.
///
/// Shared with the engine's tasks through an `Arc`; a progress display can
/// poll it while a sync is in flight.
#[derive(Debug, Default)]
pub struct DownloadStats {
    planned: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    bytes: AtomicU64,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Datasets scheduled for the current run.
    #[must_use]
    pub fn planned(&self) -> usize {
        self.planned.load(Ordering::SeqCst)
    }

    /// Datasets fetched successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Datasets dropped after exhausting their attempts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Datasets finished either way.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.completed() + self.failed()
    }

    /// Attempts repeated after a failure.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Record bytes received.
    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    fn begin(&self, planned: usize) {
        self.planned.store(planned, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.retried.store(0, Ordering::SeqCst);
        self.bytes.store(0, Ordering::SeqCst);
    }

    fn increment_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }

    fn add_bytes(&self, n: u64) {
        self.bytes.fetch_add(n, Ordering::SeqCst);
    }
}

/// Outcome of one successfully synchronized run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Datasets appended to the output.
    pub completed: usize,
    /// Datasets dropped from the output.
    pub failed: usize,
    /// Bytes written to the output.
    pub bytes_written: u64,
    /// Wall time of the download phase.
    pub elapsed: Duration,
}

/// Synchronizes runs into composite files.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    client: HttpClient,
    limiter: DownloadLimiter,
    selection: Arc<RecordSelection>,
    stats: Arc<DownloadStats>,
}

impl SyncEngine {
    /// Creates an engine with the default [`RecordSelection`].
    #[must_use]
    pub fn new(client: HttpClient, limiter: DownloadLimiter) -> Self {
        debug!(max_in_flight = limiter.capacity(), "creating sync engine");
        Self {
            client,
            limiter,
            selection: Arc::new(RecordSelection::default()),
            stats: Arc::new(DownloadStats::new()),
        }
    }

    /// Returns an engine fetching a different subset of records.
    #[must_use]
    pub fn with_selection(self, selection: RecordSelection) -> Self {
        Self {
            selection: Arc::new(selection),
            ..self
        }
    }

    /// Live counters of the run in progress.
    #[must_use]
    pub fn stats(&self) -> Arc<DownloadStats> {
        Arc::clone(&self.stats)
    }

    /// Discovers the runs of `source` and synchronizes the newest complete one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Source`] if run discovery fails, otherwise the
    /// errors of [`sync_latest`](Self::sync_latest).
    pub async fn sync_source(
        &self,
        source: &Arc<DataSource>,
        base_dir: &Path,
        max_runs: usize,
        temp_files: &TemporaryFileSet,
    ) -> Result<PathBuf, SyncError> {
        let runs = source.discover_runs(&self.client).await?;
        self.sync_latest(runs, base_dir, max_runs, temp_files).await
    }

    /// Tries the `max_runs` newest of `runs`, newest first, and stops at the
    /// first one synchronized.
    ///
    /// A run whose output file `<base_dir>/<identifier>.grib2` already exists
    /// is skipped. A run is assembled under a `.part` name and renamed into
    /// place once it succeeds; a failed run's partial output is deleted.
    /// Temporary files are swept after every run, successful or not.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NoRunsDownloaded`] if no candidate succeeds.
    #[instrument(skip(self, runs, temp_files), fields(base_dir = %base_dir.display()))]
    pub async fn sync_latest(
        &self,
        mut runs: Vec<Run>,
        base_dir: &Path,
        max_runs: usize,
        temp_files: &TemporaryFileSet,
    ) -> Result<PathBuf, SyncError> {
        sort_newest_first(&mut runs);
        runs.truncate(max_runs);
        let examined = runs.len();

        for run in runs {
            let dest = base_dir.join(run.file_name(RUN_FILE_EXTENSION));
            if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
                info!(path = %dest.display(), "not overwriting existing run file");
                continue;
            }

            let partial = partial_path(&dest);
            let run = Arc::new(run);
            let result = self.sync_run(&run, &partial, temp_files).await;
            let swept = temp_files.remove_all();
            if swept > 0 {
                debug!(swept, "removed leftover temporary files");
            }

            match result {
                Ok(summary) => {
                    tokio::fs::rename(&partial, &dest)
                        .await
                        .map_err(|e| SyncError::io(&dest, e))?;
                    info!(
                        run = %run.identifier,
                        completed = summary.completed,
                        failed = summary.failed,
                        size = %ByteCount(summary.bytes_written),
                        elapsed_secs = summary.elapsed.as_secs_f64(),
                        path = %dest.display(),
                        "run downloaded successfully"
                    );
                    return Ok(dest);
                }
                Err(e) => {
                    warn!(run = %run.identifier, error = %e, "error syncing run");
                    match tokio::fs::remove_file(&partial).await {
                        Ok(()) => info!(path = %partial.display(), "removed partial run file"),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => warn!(path = %partial.display(), error = %e, "could not remove partial run file"),
                    }
                }
            }
        }

        Err(SyncError::NoRunsDownloaded { examined })
    }

    /// Downloads the wanted records of every eligible dataset of `run` and
    /// concatenates them into `dest` in completion order.
    ///
    /// Datasets that exhaust their attempts are left out of the output.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Source`] if dataset discovery fails
    /// - [`SyncError::TooFewDatasets`] if the run looks partially uploaded
    /// - [`SyncError::NothingDownloaded`] if every dataset failed
    /// - [`SyncError::Io`] if `dest` cannot be written
    #[instrument(skip(self, run, temp_files), fields(run = %run.identifier, dest = %dest.display()))]
    pub async fn sync_run(
        &self,
        run: &Arc<Run>,
        dest: &Path,
        temp_files: &TemporaryFileSet,
    ) -> Result<RunSummary, SyncError> {
        info!(when = %run.timestamp, "fetching data for run");

        let datasets = run.discover_datasets(&self.client).await?;
        let required = run.source.min_datasets();
        if datasets.len() < required {
            return Err(SyncError::TooFewDatasets {
                run: run.identifier.clone(),
                found: datasets.len(),
                required,
            });
        }

        let eligible: Vec<Dataset> = datasets.into_iter().filter(Dataset::within_forecast_limit).collect();
        self.stats.begin(eligible.len());
        info!(datasets = eligible.len(), "fetching run");

        let mut output = tokio::fs::File::create(dest)
            .await
            .map_err(|e| SyncError::io(dest, e))?;

        let started = Instant::now();
        let (tx, mut rx) = mpsc::channel::<PathBuf>(eligible.len().max(1));
        let mut tasks = JoinSet::new();

        for dataset in eligible {
            let tx = tx.clone();
            let client = self.client.clone();
            let limiter = self.limiter.clone();
            let selection = Arc::clone(&self.selection);
            let stats = Arc::clone(&self.stats);
            let temp_files = temp_files.clone();

            tasks.spawn(async move {
                let Ok(_permit) = limiter.acquire().await else {
                    warn!(dataset = %dataset.identifier, "download limiter closed");
                    stats.increment_failed();
                    return;
                };

                match fetch_dataset(&client, &dataset, &selection, &temp_files, &stats).await {
                    Ok(path) => {
                        stats.increment_completed();
                        if tx.send(path).await.is_err() {
                            debug!(dataset = %dataset.identifier, "assembler gone, dropping dataset");
                        }
                    }
                    Err(e) => {
                        warn!(dataset = %dataset.identifier, error = %e, "failed to download dataset");
                        stats.increment_failed();
                    }
                }
            });
        }
        drop(tx);

        let mut bytes_written = 0u64;
        while let Some(path) = rx.recv().await {
            bytes_written += append_file(&mut output, &path, dest).await?;
            if let Err(e) = temp_files.remove(&path).await {
                warn!(error = %e, "could not remove temporary file");
            }
        }
        output.flush().await.map_err(|e| SyncError::io(dest, e))?;

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "dataset task panicked");
            }
        }

        let elapsed = started.elapsed();
        info!(speed = %format!("{}/sec", ByteCount::per_second(bytes_written, elapsed)), "overall download speed");

        let completed = self.stats.completed();
        let failed = self.stats.failed();
        info!(completed, failed, retried = self.stats.retried(), "run download phase complete");

        if completed == 0 {
            return Err(SyncError::NothingDownloaded {
                run: run.identifier.clone(),
            });
        }

        Ok(RunSummary {
            completed,
            failed,
            bytes_written,
            elapsed,
        })
    }
}

/// Where a run is assembled before it is renamed into place. A run file
/// that exists under its final name is always complete.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Fetches one dataset into a fresh temporary file, retrying with a new
/// file per attempt. Returns the finished file's path.
#[instrument(skip_all, fields(dataset = %dataset.identifier))]
async fn fetch_dataset(
    client: &HttpClient,
    dataset: &Dataset,
    selection: &RecordSelection,
    temp_files: &TemporaryFileSet,
    stats: &DownloadStats,
) -> Result<PathBuf, SourceError> {
    let strategy = dataset.run.source.strategy();
    let max_attempts = strategy.attempts();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        info!(attempt, max_attempts, "fetching dataset");

        let result = match temp_files.create() {
            Ok((mut file, path)) => {
                let fetched = fetch_into(client, dataset, selection, &mut file).await;
                drop(file);
                match fetched {
                    Ok(bytes) => {
                        stats.add_bytes(bytes);
                        return Ok(path);
                    }
                    Err(e) => {
                        if let Err(remove_err) = temp_files.remove(&path).await {
                            debug!(error = %remove_err, "could not remove failed attempt's file");
                        }
                        e
                    }
                }
            }
            Err(e) => SourceError::from(e),
        };

        warn!(attempt, max_attempts, error = %result, "dataset attempt failed");
        if attempt >= max_attempts {
            return Err(result);
        }
        stats.increment_retried();
        tokio::time::sleep(strategy.retry_sleep()).await;
    }
}

async fn fetch_into(
    client: &HttpClient,
    dataset: &Dataset,
    selection: &RecordSelection,
    file: &mut tokio::fs::File,
) -> Result<u64, SourceError> {
    let inventory = dataset.fetch_inventory(client).await?;
    let records = selection.select(&inventory);
    if records.is_empty() {
        info!("no records to fetch");
        return Ok(0);
    }

    let total: u64 = records.iter().map(|r| r.extent).sum();
    info!(records = records.len(), size = %ByteCount(total), "fetching records");
    Ok(dataset.fetch_records(client, &records, file).await?)
}

async fn append_file(output: &mut tokio::fs::File, path: &Path, dest: &Path) -> Result<u64, SyncError> {
    let mut input = tokio::fs::File::open(path)
        .await
        .map_err(|e| SyncError::io(path, e))?;
    tokio::io::copy(&mut input, output)
        .await
        .map_err(|e| SyncError::io(dest, e))
}
