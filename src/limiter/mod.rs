use log::debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Default number of recovery calls allowed to run at the same time.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Bounds how many recovery calls run at the same time.
///
/// Callers beyond the limit wait in FIFO order. When a permit is released the
/// slot is handed straight to the oldest waiter, so a late arrival can never
/// overtake a queued caller. Cloning the limiter shares the same slots.
///
/// # Examples
/// ```
/// use recovery_rs::limiter::ConcurrencyLimiter;
///
/// async_std::task::block_on(async {
///     let limiter = ConcurrencyLimiter::new(2);
///     let permit = limiter.acquire().await;
///     assert_eq!(limiter.active_requests(), 1);
///     drop(permit);
///     assert_eq!(limiter.active_requests(), 0);
/// });
/// ```
#[derive(Debug, Clone)]
pub struct ConcurrencyLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    max_concurrent: usize,
    slots: Arc<Semaphore>,
    queued: AtomicUsize,
}

impl Default for ConcurrencyLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl ConcurrencyLimiter {
    /// Creates a limiter allowing `max_concurrent` holders at once.
    ///
    /// # Panics
    /// Panics if `max_concurrent` is zero or above `Semaphore::MAX_PERMITS`.
    pub fn new(max_concurrent: usize) -> Self {
        assert!(max_concurrent > 0, "max_concurrent must be greater than 0");
        ConcurrencyLimiter {
            inner: Arc::new(Inner {
                max_concurrent,
                slots: Arc::new(Semaphore::new(max_concurrent)),
                queued: AtomicUsize::new(0),
            }),
        }
    }

    /// The configured number of slots.
    pub fn max_concurrent(&self) -> usize {
        self.inner.max_concurrent
    }

    /// The number of permits currently held.
    pub fn active_requests(&self) -> usize {
        self.inner.max_concurrent - self.inner.slots.available_permits()
    }

    /// The number of callers waiting for a slot.
    pub fn queued_requests(&self) -> usize {
        self.inner.queued.load(Ordering::SeqCst)
    }

    /// Waits for a free slot and returns a permit holding it.
    ///
    /// The slot is released when the permit is dropped. Dropping this future
    /// while it is still queued gives up its place without leaking a slot.
    pub async fn acquire(&self) -> ConcurrencyPermit {
        if let Ok(permit) = self.inner.slots.clone().try_acquire_owned() {
            return ConcurrencyPermit { _permit: permit };
        }

        let _queued = QueuedGuard::enter(&self.inner.queued);
        debug!(
            "Concurrency limit {} reached, {} caller(s) queued",
            self.inner.max_concurrent,
            self.queued_requests()
        );
        // The semaphore is owned by the limiter and never closed.
        let permit = self
            .inner
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore closed");
        ConcurrencyPermit { _permit: permit }
    }
}

/// A held concurrency slot. The slot is released on drop.
#[derive(Debug)]
pub struct ConcurrencyPermit {
    _permit: OwnedSemaphorePermit,
}

/// Counts a caller as queued for as long as its `acquire` is pending.
struct QueuedGuard<'a>(&'a AtomicUsize);

impl<'a> QueuedGuard<'a> {
    fn enter(queued: &'a AtomicUsize) -> Self {
        queued.fetch_add(1, Ordering::SeqCst);
        QueuedGuard(queued)
    }
}

impl Drop for QueuedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
