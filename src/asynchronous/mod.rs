mod attempts;
mod chain;
mod recover;
mod timeout;

pub use chain::FallbackOption;
pub use recover::{DEFAULT_HEALTH_CHECK_TIMEOUT, RecoveryReport, partial_results};

use crate::config::RetryConfig;
use crate::error::RecoveryError;
use crate::limiter::ConcurrencyLimiter;
use crate::observer::{LogObserver, RecoveryObserver};
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

/// Retries an asynchronous operation with backoff until it succeeds or the
/// retry budget runs out.
///
/// The operation runs at most `retry_config.max_retries + 1` times. Before each
/// retry (never before the first attempt) the call sleeps for
/// `retry_config.backoff_delay(retry)`. Diagnostics go to the `log` facade; use
/// [`Recovery::with_observer`] to route them elsewhere.
///
/// # Arguments
/// * `operation` - A closure that returns a `Future` resolving to a `Result<T, E>`.
/// * `retry_config` - The retry budget and delay schedule.
/// * `context` - A label for the operation, used in diagnostics and errors.
///
/// # Returns
/// * `Ok(T)` from the first successful attempt.
/// * `Err(RecoveryError::Exhausted)` when every attempt failed. Its message is
///   `"<context> failed: <last error>"`.
/// * `Err(RecoveryError::Aborted)` when the retry condition rejected an error.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use async_std::task::block_on;
/// use recovery_rs::asynchronous::retry;
/// use recovery_rs::config::RetryConfig;
///
/// let config = RetryConfig::new(2, Duration::from_millis(10), Duration::from_millis(100));
/// let mut calls = 0;
/// let result = block_on(retry(
///     || {
///         calls += 1;
///         let outcome = if calls < 3 { Err("503") } else { Ok(42) };
///         async move { outcome }
///     },
///     &config,
///     "fetchPrice",
/// ));
/// assert_eq!(result.unwrap(), 42);
/// assert_eq!(calls, 3);
/// ```
pub async fn retry<F, Fut, T, E>(
    operation: F,
    retry_config: &RetryConfig<E>,
    context: &str,
) -> Result<T, RecoveryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    attempts::retry_observed(operation, retry_config, context, &LogObserver).await
}

/// Executes an asynchronous operation with a timeout.
///
/// Returns the operation's own result if it settles before `timeout_duration`
/// elapses; its own errors come back as `RecoveryError::Failed`. Otherwise the
/// call fails with `RecoveryError::TimedOut`, whose message is
/// `"<context> timed out after <ms>ms"`. A zero duration fails immediately.
///
/// When the timer wins the operation future is dropped, which cancels it. To
/// let the work run to completion regardless, spawn it as a task and pass the
/// task handle here instead.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use async_std::future::pending;
/// use async_std::task::block_on;
/// use recovery_rs::asynchronous::with_timeout;
///
/// let result = block_on(with_timeout(
///     pending::<Result<(), String>>(),
///     Duration::from_millis(50),
///     "slowCall",
/// ));
/// let err = result.unwrap_err();
/// assert!(err.is_timeout());
/// assert_eq!(err.to_string(), "slowCall timed out after 50ms");
/// ```
pub async fn with_timeout<Fut, T, E>(
    operation: Fut,
    timeout_duration: Duration,
    context: &str,
) -> Result<T, RecoveryError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    timeout::with_timeout_observed(operation, timeout_duration, context, &LogObserver).await
}

/// Tries a sequence of alternative asynchronous operations in order.
///
/// Returns the first success without invoking the remaining operations. If
/// every operation fails the call returns `RecoveryError::FallbackExhausted`,
/// whose message is `"All <N> fallback options failed for <context>"` and whose
/// [`errors`](RecoveryError::errors) hold each individual failure.
///
/// Operations of different closure types can be boxed as [`FallbackOption`].
///
/// # Example
/// ```rust
/// use async_std::task::block_on;
/// use recovery_rs::asynchronous::fallback;
///
/// let mirrors = ["primary", "secondary", "archive"];
/// let result = block_on(fallback(
///     mirrors.map(|mirror| move || async move {
///         if mirror == "secondary" { Ok(mirror) } else { Err(format!("{mirror} offline")) }
///     }),
///     "mirrors",
/// ));
/// assert_eq!(result.unwrap(), "secondary");
/// ```
pub async fn fallback<I, F, Fut, T, E>(operations: I, context: &str) -> Result<T, RecoveryError<E>>
where
    I: IntoIterator<Item = F>,
    I::IntoIter: ExactSizeIterator,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    chain::fallback_observed(operations, context, &LogObserver).await
}

/// A handle bundling the recovery operations with an observer, an optional
/// concurrency limit and a health-check timeout.
///
/// `Recovery` is cheap to clone; clones share the observer and the limiter.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use async_std::task::block_on;
/// use recovery_rs::asynchronous::Recovery;
/// use recovery_rs::config::RetryConfig;
/// use recovery_rs::limiter::ConcurrencyLimiter;
/// use recovery_rs::observer::NoopObserver;
///
/// let recovery = Recovery::new()
///     .with_observer(NoopObserver)
///     .with_limiter(ConcurrencyLimiter::new(3));
/// let config = RetryConfig::new(1, Duration::from_millis(5), Duration::from_millis(50));
///
/// let report = block_on(recovery.recover_or_else(
///     || async { Err::<u32, _>("search api down".to_string()) },
///     &config,
///     "research",
///     || async { Ok(0) },
/// ));
/// assert!(report.fallback_used);
/// assert_eq!(report.attempts, 2);
/// ```
#[derive(Clone)]
pub struct Recovery {
    observer: Arc<dyn RecoveryObserver>,
    limiter: Option<ConcurrencyLimiter>,
    health_check_timeout: Duration,
}

impl Default for Recovery {
    fn default() -> Self {
        Recovery {
            observer: Arc::new(LogObserver),
            limiter: None,
            health_check_timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
        }
    }
}

impl fmt::Debug for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recovery")
            .field("limiter", &self.limiter)
            .field("health_check_timeout", &self.health_check_timeout)
            .finish_non_exhaustive()
    }
}

impl Recovery {
    /// Creates a handle that logs through `LogObserver`, has no concurrency
    /// limit and gives health probes 5 seconds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes diagnostics to `observer` instead of the `log` facade.
    pub fn with_observer(mut self, observer: impl RecoveryObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Bounds how many `recover` calls made through this handle (and its
    /// clones) run at the same time.
    pub fn with_limiter(mut self, limiter: ConcurrencyLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Sets how long `check_health` waits for a probe.
    pub fn with_health_check_timeout(mut self, timeout: Duration) -> Self {
        self.health_check_timeout = timeout;
        self
    }

    /// The concurrency limiter, if one is configured.
    pub fn limiter(&self) -> Option<&ConcurrencyLimiter> {
        self.limiter.as_ref()
    }

    /// Same as [`retry`], reporting to this handle's observer.
    ///
    /// # Arguments
    /// * `operation` - A closure that returns a `Future` resolving to a `Result<T, E>`.
    /// * `retry_config` - The retry budget and delay schedule.
    /// * `context` - A label for the operation, used in diagnostics and errors.
    ///
    /// # Returns
    /// * `Ok(T)` from the first successful attempt.
    /// * `Err(RecoveryError::Exhausted)` or `Err(RecoveryError::Aborted)` with the last error.
    pub async fn retry<F, Fut, T, E>(
        &self,
        operation: F,
        retry_config: &RetryConfig<E>,
        context: &str,
    ) -> Result<T, RecoveryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        attempts::retry_observed(operation, retry_config, context, self.observer.as_ref()).await
    }

    /// Same as [`with_timeout`], reporting to this handle's observer.
    ///
    /// # Returns
    /// * The operation's value, its own error as `RecoveryError::Failed`, or
    ///   `RecoveryError::TimedOut` when `timeout_duration` elapses first.
    pub async fn with_timeout<Fut, T, E>(
        &self,
        operation: Fut,
        timeout_duration: Duration,
        context: &str,
    ) -> Result<T, RecoveryError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
    {
        timeout::with_timeout_observed(operation, timeout_duration, context, self.observer.as_ref())
            .await
    }

    /// Same as [`fallback`], reporting to this handle's observer.
    ///
    /// # Returns
    /// * The first successful option's value, or
    ///   `RecoveryError::FallbackExhausted` holding every option's error.
    pub async fn fallback<I, F, Fut, T, E>(
        &self,
        operations: I,
        context: &str,
    ) -> Result<T, RecoveryError<E>>
    where
        I: IntoIterator<Item = F>,
        I::IntoIter: ExactSizeIterator,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        chain::fallback_observed(operations, context, self.observer.as_ref()).await
    }

    /// Retries `operation` and reports the outcome and attempt count instead
    /// of failing.
    ///
    /// Holds a limiter slot for the whole call when a limiter is configured.
    pub async fn recover<F, Fut, T, E>(
        &self,
        operation: F,
        retry_config: &RetryConfig<E>,
        context: &str,
    ) -> RecoveryReport<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        recover::recover_observed(
            operation,
            retry_config,
            context,
            None::<F>,
            self.observer.as_ref(),
            self.limiter.as_ref(),
        )
        .await
    }

    /// Like [`recover`](Self::recover), but runs `fallback` once when every
    /// attempt failed.
    ///
    /// `fallback_used` is set only when the fallback succeeds. If it fails
    /// too, the report keeps the primary operation's last error.
    pub async fn recover_or_else<F, Fut, G, GFut, T, E>(
        &self,
        operation: F,
        retry_config: &RetryConfig<E>,
        context: &str,
        fallback: G,
    ) -> RecoveryReport<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        G: FnOnce() -> GFut,
        GFut: Future<Output = Result<T, E>>,
        E: Display,
    {
        recover::recover_observed(
            operation,
            retry_config,
            context,
            Some(fallback),
            self.observer.as_ref(),
            self.limiter.as_ref(),
        )
        .await
    }

    /// Probes an external dependency. Returns the probe's answer, or `false`
    /// when the probe fails or does not answer within the health-check timeout.
    pub async fn check_health<F, Fut, E>(&self, name: &str, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        recover::check_health_observed(name, probe, self.health_check_timeout, self.observer.as_ref())
            .await
    }

    /// Same as [`partial_results`], reporting to this handle's observer.
    pub fn partial_results<T, I>(&self, results: I, min_required: usize) -> Vec<T>
    where
        I: IntoIterator<Item = Option<T>>,
    {
        recover::partial_results_observed(results, min_required, self.observer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::testing::RecordingObserver;
    use async_std::task::{block_on, sleep};
    use futures::FutureExt;
    use std::sync::Mutex;

    /// Shares one recording observer between a `Recovery` handle and the test.
    #[derive(Clone, Default)]
    struct Shared(Arc<RecordingObserver>);

    impl RecoveryObserver for Shared {
        fn retry_scheduled(&self, context: &str, retry: usize, max: usize, delay: Duration) {
            self.0.retry_scheduled(context, retry, max, delay);
        }

        fn attempt_failed(&self, context: &str, attempt: usize, total: usize, error: &dyn Display) {
            self.0.attempt_failed(context, attempt, total, error);
        }

        fn timed_out(&self, context: &str, timeout: Duration) {
            self.0.timed_out(context, timeout);
        }

        fn fallback_attempt(&self, context: &str, option: usize, total: usize) {
            self.0.fallback_attempt(context, option, total);
        }

        fn fallback_exhausted(&self, context: &str, total: usize) {
            self.0.fallback_exhausted(context, total);
        }

        fn partial_result(&self, kept: usize, total: usize) {
            self.0.partial_result(kept, total);
        }
    }

    fn fast_config<E>(max_retries: usize) -> RetryConfig<E> {
        RetryConfig::new(max_retries, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[test]
    fn test_free_functions_use_default_observer() {
        let result = block_on(retry(
            || async { Ok::<_, String>("ok") },
            &fast_config(1),
            "op",
        ));
        assert_eq!(result.unwrap(), "ok");

        let result = block_on(with_timeout(
            async { Ok::<_, String>(1) },
            Duration::from_millis(100),
            "op",
        ));
        assert_eq!(result.unwrap(), 1);

        let result = block_on(fallback([|| async { Ok::<_, String>(2) }], "op"));
        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn test_handle_routes_events_to_injected_observer() {
        let shared = Shared::default();
        let recovery = Recovery::new().with_observer(shared.clone());

        let result: Result<(), _> = block_on(recovery.retry(
            || async { Err("boom".to_string()) },
            &fast_config(2),
            "op",
        ));

        assert!(result.unwrap_err().is_exhausted());
        assert_eq!(shared.0.count("retry op"), 2);
        assert_eq!(shared.0.count("failed op"), 3);
    }

    #[test]
    fn test_retry_of_timeout_composes() {
        let shared = Shared::default();
        let recovery = Recovery::new().with_observer(shared.clone());
        let calls = Mutex::new(0);

        let result = block_on(recovery.retry(
            || {
                let attempt = {
                    let mut calls = calls.lock().unwrap();
                    *calls += 1;
                    *calls
                };
                recovery.with_timeout(
                    async move {
                        if attempt == 1 {
                            sleep(Duration::from_millis(200)).await;
                        }
                        Ok::<_, String>(attempt)
                    },
                    Duration::from_millis(20),
                    "quote",
                )
            },
            &fast_config(2),
            "fetchQuote",
        ));

        assert_eq!(result.unwrap(), 2);
        assert_eq!(shared.0.count("timeout quote 20"), 1);
        assert_eq!(
            shared.0.events()[1],
            "failed fetchQuote 1/3: quote timed out after 20ms"
        );
    }

    #[test]
    fn test_fallback_of_retries_composes() {
        let shared = Shared::default();
        let recovery = Recovery::new().with_observer(shared.clone());
        let config = fast_config::<String>(1);

        let options: Vec<FallbackOption<'_, u32, RecoveryError<String>>> = vec![
            Box::new(|| {
                recovery
                    .retry(|| async { Err::<u32, _>("503".to_string()) }, &config, "yahoo")
                    .boxed()
            }),
            Box::new(|| {
                recovery
                    .retry(|| async { Ok::<u32, String>(7) }, &config, "proxy")
                    .boxed()
            }),
        ];
        let result = block_on(recovery.fallback(options, "price"));

        assert_eq!(result.unwrap(), 7);
        assert_eq!(shared.0.count("option price"), 2);
        assert_eq!(shared.0.count("failed yahoo"), 2);
    }

    #[test]
    fn test_check_health_uses_configured_timeout() {
        let shared = Shared::default();
        let recovery = Recovery::new()
            .with_observer(shared.clone())
            .with_health_check_timeout(Duration::from_millis(10));

        let healthy = block_on(recovery.check_health("wikipedia", || async {
            sleep(Duration::from_millis(100)).await;
            Ok::<_, String>(true)
        }));

        assert!(!healthy);
        assert_eq!(shared.0.count("timeout wikipedia 10"), 1);
    }

    #[test]
    fn test_recover_without_limiter() {
        let recovery = Recovery::new().with_observer(Shared::default());
        assert!(recovery.limiter().is_none());

        let report = block_on(recovery.recover(
            || async { Err::<(), _>("down".to_string()) },
            &fast_config(1),
            "research",
        ));

        assert_eq!(report.attempts, 2);
        assert_eq!(report.into_result(), Err("down".to_string()));
    }

    #[test]
    fn test_partial_results_report_to_handle_observer() {
        let shared = Shared::default();
        let recovery = Recovery::new().with_observer(shared.clone());

        let kept = recovery.partial_results(vec![Some(1), None, Some(3), Some(4)], 2);

        assert_eq!(kept, vec![1, 3, 4]);
        assert_eq!(shared.0.events(), vec!["partial 3/4".to_string()]);
    }
}
