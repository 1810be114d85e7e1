//! Fixed-delay retry strategy shared by every network operation.
//!
//! A [`FetchStrategy`] travels with its [`DataSource`](crate::source::DataSource)
//! and bounds how hard the client works against NOAA's servers: how many
//! attempts each operation gets, how long to sleep between them and how long a
//! single byte-range transfer may take.
//!
//! The delay is constant. The server's failures are short maintenance windows
//! and half-uploaded directories, not congestion, so backing off gains nothing.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use aonui_core::download::FetchStrategy;
//!
//! let strategy = FetchStrategy::new(3, Duration::from_secs(10), Duration::from_secs(60));
//! assert_eq!(strategy.attempts(), 3);
//!
//! // Zero retries still means one attempt.
//! let strategy = FetchStrategy::new(0, Duration::ZERO, Duration::from_secs(60));
//! assert_eq!(strategy.attempts(), 1);
//! ```

use std::time::Duration;

/// Default number of attempts per operation.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default sleep between attempts (30 seconds).
pub const DEFAULT_RETRY_SLEEP: Duration = Duration::from_secs(30);

/// Default deadline for a single byte-range transfer (10 minutes).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Immutable retry and timeout configuration for network operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStrategy {
    /// Maximum attempts, including the first.
    max_retries: u32,

    /// Fixed sleep between consecutive attempts.
    retry_sleep: Duration,

    /// Deadline for one ranged transfer, connect through last body byte.
    fetch_timeout: Duration,
}

impl Default for FetchStrategy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_sleep: DEFAULT_RETRY_SLEEP,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl FetchStrategy {
    /// Creates a strategy with explicit settings.
    #[must_use]
    pub fn new(max_retries: u32, retry_sleep: Duration, fetch_timeout: Duration) -> Self {
        Self {
            max_retries,
            retry_sleep,
            fetch_timeout,
        }
    }

    /// Returns a copy with a different retry count.
    #[must_use]
    pub fn with_max_retries(self, max_retries: u32) -> Self {
        Self {
            max_retries,
            ..self
        }
    }

    /// Returns a copy with a different sleep between attempts.
    #[must_use]
    pub fn with_retry_sleep(self, retry_sleep: Duration) -> Self {
        Self {
            retry_sleep,
            ..self
        }
    }

    /// Returns a copy with a different transfer deadline.
    #[must_use]
    pub fn with_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    /// The configured retry count, as given.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Number of attempts actually made: the retry count clamped to at least one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Sleep between attempts.
    #[must_use]
    pub fn retry_sleep(&self) -> Duration {
        self.retry_sleep
    }

    /// Deadline for a single ranged transfer.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}
