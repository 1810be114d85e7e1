//! Constants for the download module (timeouts, pipeline limits).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("aonui/", env!("CARGO_PKG_VERSION"));

/// Default cap on simultaneously in-flight dataset downloads.
pub const DEFAULT_MAX_DOWNLOADS: usize = 5;

/// Prefix of the per-dataset temporary files written during a sync.
pub const DATASET_TEMP_PREFIX: &str = "dataset-";

/// Extension of assembled run files.
pub const RUN_FILE_EXTENSION: &str = "grib2";

/// Appended to a run file's name while it is being assembled.
pub const PARTIAL_SUFFIX: &str = ".part";
