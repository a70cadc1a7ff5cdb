use super::attempts::run_attempts;
use super::timeout::with_timeout_observed;
use crate::config::RetryConfig;
use crate::limiter::ConcurrencyLimiter;
use crate::observer::{LogObserver, RecoveryObserver};
use std::fmt::Display;
use std::time::Duration;

/// Default time a health probe may take before it counts as failed.
pub const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of a recovery call, returned instead of an error.
///
/// `attempts` counts invocations of the primary operation only; a fallback
/// invocation is reported through `fallback_used`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport<T, E> {
    /// The primary operation's value, the fallback's value, or the primary
    /// operation's last error.
    pub outcome: Result<T, E>,
    /// How many times the primary operation ran, between 1 and
    /// `max_retries + 1`.
    pub attempts: usize,
    /// True when the value in `outcome` came from the fallback.
    pub fallback_used: bool,
}

impl<T, E> RecoveryReport<T, E> {
    /// Returns true if `outcome` holds a value.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Discards the bookkeeping and returns the outcome.
    pub fn into_result(self) -> Result<T, E> {
        self.outcome
    }
}

/// Retries `operation`, then tries `fallback` once if every attempt failed.
///
/// The whole call holds one slot of `limiter`, when one is given. A failing
/// fallback is only reported to the observer; the outcome keeps the primary
/// operation's last error.
pub(crate) async fn recover_observed<F, Fut, G, GFut, T, E>(
    operation: F,
    retry_config: &RetryConfig<E>,
    context: &str,
    fallback: Option<G>,
    observer: &dyn RecoveryObserver,
    limiter: Option<&ConcurrencyLimiter>,
) -> RecoveryReport<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    G: FnOnce() -> GFut,
    GFut: Future<Output = Result<T, E>>,
    E: Display,
{
    let _permit = match limiter {
        Some(limiter) => Some(limiter.acquire().await),
        None => None,
    };

    let run = run_attempts(operation, retry_config, context, observer).await;
    let error = match run.result {
        Ok(output) => {
            return RecoveryReport {
                outcome: Ok(output),
                attempts: run.attempts,
                fallback_used: false,
            };
        }
        Err(error) => error,
    };

    if let Some(fallback) = fallback {
        observer.recovery_fallback(context);
        match fallback().await {
            Ok(output) => {
                return RecoveryReport {
                    outcome: Ok(output),
                    attempts: run.attempts,
                    fallback_used: true,
                };
            }
            Err(fallback_error) => observer.fallback_failed(context, 1, &fallback_error),
        }
    }

    RecoveryReport {
        outcome: Err(error),
        attempts: run.attempts,
        fallback_used: false,
    }
}

/// Runs a health probe under `timeout`. Errors and timeouts count as unhealthy.
pub(crate) async fn check_health_observed<F, Fut, E>(
    name: &str,
    probe: F,
    timeout: Duration,
    observer: &dyn RecoveryObserver,
) -> bool
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    match with_timeout_observed(probe(), timeout, name, observer).await {
        Ok(healthy) => healthy,
        Err(err) => {
            observer.health_check_failed(name, &err);
            false
        }
    }
}

/// Keeps the values that are present, if there are at least `min_required`.
///
/// Returns an empty `Vec` when too few values are present, so callers can
/// treat "not enough" and "nothing" the same way. A usable partial result is
/// logged through the `log` facade; [`Recovery::partial_results`] reports to
/// an injected observer instead.
///
/// [`Recovery::partial_results`]: super::Recovery::partial_results
///
/// # Examples
/// ```
/// use recovery_rs::asynchronous::partial_results;
///
/// let fetched = vec![Some("wikipedia"), None, Some("reddit")];
/// assert_eq!(partial_results(fetched.clone(), 2), vec!["wikipedia", "reddit"]);
/// assert!(partial_results(fetched, 3).is_empty());
/// ```
pub fn partial_results<T, I>(results: I, min_required: usize) -> Vec<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    partial_results_observed(results, min_required, &LogObserver)
}

pub(crate) fn partial_results_observed<T, I>(
    results: I,
    min_required: usize,
    observer: &dyn RecoveryObserver,
) -> Vec<T>
where
    I: IntoIterator<Item = Option<T>>,
{
    let mut total = 0;
    let present: Vec<T> = results
        .into_iter()
        .inspect(|_| total += 1)
        .flatten()
        .collect();

    if present.len() >= min_required {
        observer.partial_result(present.len(), total);
        present
    } else {
        Vec::new()
    }
}
