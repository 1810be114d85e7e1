//! Error types for the download module.
//!
//! [`DownloadError`] covers single HTTP operations and the retry executor.
//! [`SyncError`] covers whole-run synchronization, where per-dataset failures
//! are recovered by omission and only run-level outcomes surface.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::SourceError;

/// Errors that can occur while fetching from the remote server.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, reset mid-body, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The fetch deadline expired before the transfer completed.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Unexpected HTTP status (anything but the status the operation requires).
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Every attempt allowed by the fetch strategy failed.
    #[error("giving up on {url} after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        /// The URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// The failure of the final attempt.
        #[source]
        last: Box<DownloadError>,
    },

    /// The server did not report a Content-Length for a dataset.
    #[error("server did not give Content-Length for {url}")]
    MissingLength {
        /// The dataset URL.
        url: String,
    },

    /// File system error while writing fetched data.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output sink rejected data streamed from a response body.
    #[error("error writing data fetched from {url}: {source}")]
    Write {
        /// The URL whose body was being copied.
        url: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Wraps the final attempt's failure once retries are used up.
    pub fn retries_exhausted(url: impl Into<String>, attempts: u32, last: DownloadError) -> Self {
        Self::RetriesExhausted {
            url: url.into(),
            attempts,
            last: Box::new(last),
        }
    }

    /// Creates a missing Content-Length error.
    pub fn missing_length(url: impl Into<String>) -> Self {
        Self::MissingLength { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error for a body being copied to an output sink.
    pub fn write(url: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            url: url.into(),
            source,
        }
    }
}

/// Errors that end the synchronization of a run, or of the whole sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Discovering datasets for the run failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The run is judged incomplete on the server.
    #[error("run {run} has {found} dataset(s), expecting at least {required}")]
    TooFewDatasets {
        /// Run identifier.
        run: String,
        /// Datasets listed for the run.
        found: usize,
        /// Configured minimum.
        required: usize,
    },

    /// Every eligible dataset of the run failed to download.
    #[error("no datasets of run {run} could be downloaded")]
    NothingDownloaded {
        /// Run identifier.
        run: String,
    },

    /// All candidate runs were skipped or failed.
    #[error("no runs were downloaded ({examined} examined)")]
    NoRunsDownloaded {
        /// Number of candidate runs looked at.
        examined: usize,
    },

    /// Creating or writing the assembled output failed.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
