//! Counting permit pool bounding simultaneous dataset downloads.
//!
//! The limiter is an owned value handed to each pipeline invocation. Two
//! pipelines built with separate limiters never contend with each other;
//! clones of one limiter share the same pool.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Bounded pool of in-flight download permits.
///
/// A permit is held for the full lifetime of one dataset download, retries
/// included, and is released when dropped, whether the download succeeded,
/// failed or panicked.
#[derive(Debug, Clone)]
pub struct DownloadLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl DownloadLimiter {
    /// Creates a pool with `max_in_flight` permits (at least one).
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        let capacity = max_in_flight.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free permit.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] only if the pool was closed, which this type
    /// never does itself.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Total number of permits.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits not currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
