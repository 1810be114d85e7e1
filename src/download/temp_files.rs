//! Tracked temporary files for one synchronization attempt.
//!
//! Every file handed out by [`TemporaryFileSet::create`] is remembered until it
//! is removed individually, so that [`TemporaryFileSet::remove_all`] can sweep
//! whatever is left behind by an error path. [`TemporaryFileSet::close`] is
//! the interrupt variant: it sweeps and refuses all later creations.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::error::DownloadError;

/// A shareable set of temporary files created in one directory with a common
/// prefix.
///
/// Clones share the same bookkeeping. The list is guarded by a mutex that is
/// never held across an await point. The one file system call made under it
/// deletes a file created after [`close`](Self::close).
#[derive(Debug, Clone)]
pub struct TemporaryFileSet {
    dir: PathBuf,
    prefix: String,
    state: Arc<Mutex<Tracked>>,
}

#[derive(Debug, Default)]
struct Tracked {
    files: Vec<PathBuf>,
    closed: bool,
}

impl TemporaryFileSet {
    /// Creates an empty set placing files in `dir` with names starting `prefix`.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            state: Arc::new(Mutex::new(Tracked::default())),
        }
    }

    /// Directory the files are created in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a new empty file, records it and opens it for writing.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if the file cannot be created or the set
    /// has been closed.
    pub fn create(&self) -> Result<(tokio::fs::File, PathBuf), DownloadError> {
        if self.lock().closed {
            return Err(self.closed_error());
        }

        let named = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempfile_in(&self.dir)
            .map_err(|e| DownloadError::io(&self.dir, e))?;
        let (file, path) = named
            .keep()
            .map_err(|e| DownloadError::io(&self.dir, e.error))?;

        {
            let mut state = self.lock();
            if state.closed {
                // Lost the race with close(); it will not see this file.
                drop(file);
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "could not remove temporary file");
                }
                return Err(self.closed_error());
            }
            state.files.push(path.clone());
        }
        debug!(path = %path.display(), "created temporary file");

        Ok((tokio::fs::File::from_std(file), path))
    }

    /// Forgets `path` and deletes it from disk.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if `path` was not created by this set or
    /// cannot be deleted.
    pub async fn remove(&self, path: &Path) -> Result<(), DownloadError> {
        let tracked = {
            let mut state = self.lock();
            match state.files.iter().position(|p| p == path) {
                Some(idx) => {
                    state.files.swap_remove(idx);
                    true
                }
                None => false,
            }
        };

        if !tracked {
            return Err(DownloadError::io(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "temporary file is not tracked by this set"),
            ));
        }

        tokio::fs::remove_file(path)
            .await
            .map_err(|e| DownloadError::io(path, e))
    }

    /// Deletes every file still tracked and empties the set. The set stays
    /// usable.
    ///
    /// Files already gone are not an error; other failures are logged and
    /// skipped. Returns the number of files deleted.
    pub fn remove_all(&self) -> usize {
        let files = std::mem::take(&mut self.lock().files);
        sweep(files)
    }

    /// Deletes every file still tracked and refuses any later
    /// [`create`](Self::create), including one already in progress.
    ///
    /// Synchronous so it can run from an interrupt handler while aborted
    /// download tasks may still be running on other threads. Returns the
    /// number of files deleted.
    pub fn close(&self) -> usize {
        let files = {
            let mut state = self.lock();
            state.closed = true;
            std::mem::take(&mut state.files)
        };
        sweep(files)
    }

    /// Whether [`close`](Self::close) has been called on this set or a clone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of files currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().files.len()
    }

    /// Whether no files are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().files.is_empty()
    }

    fn closed_error(&self) -> DownloadError {
        DownloadError::io(
            &self.dir,
            io::Error::new(io::ErrorKind::Interrupted, "temporary file set is closed"),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tracked> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep(files: Vec<PathBuf>) -> usize {
    let mut removed = 0;

    for path in files {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "could not remove temporary file"),
        }
    }

    removed
}
