use log::{error, info, warn};
use std::fmt::Display;
use std::time::Duration;

/// Receives diagnostic events from the recovery operations.
///
/// Every method has an empty default body, so an implementation only overrides
/// the events it cares about. Events are advisory: nothing an observer does
/// changes the outcome of the operation that emitted them.
///
/// Attempt and option numbers are 1-based.
pub trait RecoveryObserver: Send + Sync {
    /// A retry is about to wait `delay` before running again.
    fn retry_scheduled(&self, _context: &str, _retry: usize, _max_retries: usize, _delay: Duration) {
    }

    /// A single attempt failed with `error`.
    fn attempt_failed(
        &self,
        _context: &str,
        _attempt: usize,
        _total_attempts: usize,
        _error: &dyn Display,
    ) {
    }

    /// The operation succeeded after `retries` retries (at least one).
    fn retry_succeeded(&self, _context: &str, _retries: usize) {}

    /// The retry budget ran out after `retries` retries.
    fn retry_exhausted(&self, _context: &str, _retries: usize) {}

    /// The retry condition rejected the error of attempt `attempt`.
    fn retry_aborted(&self, _context: &str, _attempt: usize) {}

    /// The timeout wrapper gave up after `timeout`.
    fn timed_out(&self, _context: &str, _timeout: Duration) {}

    /// Option `option` of `total` in a fallback chain is about to run.
    fn fallback_attempt(&self, _context: &str, _option: usize, _total: usize) {}

    /// Option `option` of a fallback chain failed with `error`.
    fn fallback_failed(&self, _context: &str, _option: usize, _error: &dyn Display) {}

    /// All `total` options of a fallback chain failed.
    fn fallback_exhausted(&self, _context: &str, _total: usize) {}

    /// A recovery call exhausted its retries and is switching to its fallback.
    fn recovery_fallback(&self, _context: &str) {}

    /// A health probe failed or did not answer in time.
    fn health_check_failed(&self, _name: &str, _error: &dyn Display) {}

    /// `kept` of `total` results were present, enough to continue with.
    fn partial_result(&self, _kept: usize, _total: usize) {}
}

/// The default observer: forwards every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RecoveryObserver for LogObserver {
    fn retry_scheduled(&self, context: &str, retry: usize, max_retries: usize, delay: Duration) {
        info!("Retry {retry}/{max_retries} for {context} (delay: {delay:?})");
    }

    fn attempt_failed(
        &self,
        context: &str,
        attempt: usize,
        total_attempts: usize,
        error: &dyn Display,
    ) {
        warn!("{context} failed (attempt {attempt}/{total_attempts}): {error}");
    }

    fn retry_succeeded(&self, context: &str, retries: usize) {
        info!("{context} succeeded after {retries} retries");
    }

    fn retry_exhausted(&self, context: &str, retries: usize) {
        error!("{context} failed after {retries} retries, giving up");
    }

    fn retry_aborted(&self, context: &str, attempt: usize) {
        warn!("{context} failed (attempt {attempt}), not retryable, giving up");
    }

    fn timed_out(&self, context: &str, timeout: Duration) {
        warn!("{context} timed out after {}ms", timeout.as_millis());
    }

    fn fallback_attempt(&self, context: &str, option: usize, total: usize) {
        info!("Trying {context} option {option}/{total}");
    }

    fn fallback_failed(&self, context: &str, option: usize, error: &dyn Display) {
        warn!("{context} option {option} failed: {error}");
    }

    fn fallback_exhausted(&self, context: &str, total: usize) {
        error!("All {total} fallback options failed for {context}");
    }

    fn recovery_fallback(&self, context: &str) {
        info!("Using fallback for {context}");
    }

    fn health_check_failed(&self, name: &str, error: &dyn Display) {
        warn!("{name} health check failed: {error}");
    }

    fn partial_result(&self, kept: usize, total: usize) {
        info!("Partial result: {kept}/{total} items");
    }
}

/// An observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RecoveryObserver for NoopObserver {}


#[cfg(test)]
mod tests {
    use super::testing::RecordingObserver;
    use super::*;

    #[test]
    fn test_noop_observer_accepts_every_event() {
        let observer = NoopObserver;
        observer.retry_scheduled("op", 1, 3, Duration::from_millis(10));
        observer.attempt_failed("op", 1, 4, &"boom");
        observer.fallback_exhausted("op", 2);
    }

    #[test]
    fn test_log_observer_is_usable_as_trait_object() {
        let observer: &dyn RecoveryObserver = &LogObserver;
        observer.timed_out("op", Duration::from_millis(50));
        observer.health_check_failed("wikipedia", &"timed out");
        observer.fallback_attempt("quotes", 1, 3);
        observer.partial_result(2, 3);
    }

    #[test]
    fn test_recording_observer_counts_by_prefix() {
        let observer = RecordingObserver::default();
        observer.retry_scheduled("op", 1, 2, Duration::ZERO);
        observer.retry_scheduled("op", 2, 2, Duration::ZERO);
        observer.retry_exhausted("op", 2);
        assert_eq!(observer.count("retry "), 2);
        assert_eq!(observer.events().last().map(String::as_str), Some("exhausted op 2"));
    }
}
