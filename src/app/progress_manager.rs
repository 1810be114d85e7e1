//! Progress UI (spinner) for sync runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use aonui_core::{ByteCount, DownloadStats};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Spawns the progress UI (spinner) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    stats: Arc<DownloadStats>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(stats, Arc::clone(&stop));
    (Some(handle), stop)
}

/// Signals the spinner to stop and waits for it. A spinner task that
/// panicked or was cancelled is logged, never propagated.
pub(crate) async fn stop_progress_ui(handle: Option<tokio::task::JoinHandle<()>>, stop: &AtomicBool) {
    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            debug!(error = %e, "progress task ended abnormally");
        }
    }
}

/// `[done/total] datasets (size)`; before the first run starts there is no
/// total yet.
pub(crate) fn progress_message(stats: &DownloadStats) -> String {
    let planned = stats.planned();
    if planned == 0 {
        return "Looking for runs...".to_string();
    }
    format!(
        "[{}/{}] datasets ({})",
        stats.finished().min(planned),
        planned,
        ByteCount(stats.bytes())
    )
}

fn spawn_spinner_inner(stats: Arc<DownloadStats>, stop: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(progress_message(&stats));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}
