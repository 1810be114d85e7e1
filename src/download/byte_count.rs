//! Human-friendly byte counts for log lines.

use std::fmt;
use std::time::Duration;

/// A number of bytes, displayed in the largest unit that keeps at least two
/// of it (`1500B`, `2KiB`, `511MiB`, `3GiB`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteCount(pub u64);

impl ByteCount {
    /// Average rate of `bytes` over `elapsed`, in bytes.
    ///
    /// A zero duration yields the raw count.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn per_second(bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return Self(bytes);
        }
        Self((bytes as f64 / secs) as u64)
    }
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.0;
        if n < 2 << 10 {
            write!(f, "{n}B")
        } else if n < 2 << 20 {
            write!(f, "{}KiB", n >> 10)
        } else if n < 2 << 30 {
            write!(f, "{}MiB", n >> 20)
        } else {
            write!(f, "{}GiB", n >> 30)
        }
    }
}
