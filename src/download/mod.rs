//! Network access and run synchronization.
//!
//! This module provides everything that talks to the remote server:
//!
//! - [`HttpClient`] - the retry fetch executor plus `HEAD` and multi-range
//!   requests
//! - [`FetchStrategy`] - fixed-delay retry count, sleep and transfer deadline
//! - [`SyncEngine`] - the bounded, concurrent pipeline assembling a run
//! - [`DownloadLimiter`] - the permit pool bounding in-flight datasets
//! - [`TemporaryFileSet`] - tracked per-attempt temporary files
//!
//! # Example
//!
//! ```no_run
//! use aonui_core::download::{FetchStrategy, HttpClient};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let url = Url::parse("http://www.ftp.ncep.noaa.gov/data/nccf/com/gfs/prod/")?;
//! let index = client.fetch_text(&url, &FetchStrategy::default()).await?;
//! println!("{} bytes of index", index.len());
//! # Ok(())
//! # }
//! ```

mod byte_count;
mod client;
mod constants;
mod engine;
mod error;
mod limiter;
mod retry;
mod temp_files;

pub use byte_count::ByteCount;
pub use client::{ByteRange, HttpClient, range_header};
pub use constants::{DATASET_TEMP_PREFIX, DEFAULT_MAX_DOWNLOADS, RUN_FILE_EXTENSION};
pub use engine::{DownloadStats, RunSummary, SyncEngine};
pub use error::{DownloadError, SyncError};
pub use limiter::DownloadLimiter;
pub use retry::{DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_SLEEP, FetchStrategy};
pub use temp_files::TemporaryFileSet;
