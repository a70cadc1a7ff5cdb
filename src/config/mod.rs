use crate::strategies::{self, Jitter, RetryStrategy};
use rand::Rng;
use std::fmt;
use std::time::Duration;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: usize = 3;
/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
/// Default upper bound on any single retry delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Configuration for retrying operations.
///
/// This struct defines the retry budget, the delay schedule and an optional
/// predicate deciding which errors are worth retrying. Every field has a
/// default, so callers override only what they care about:
///
/// ```
/// use std::time::Duration;
/// use recovery_rs::config::RetryConfig;
///
/// let config = RetryConfig::<String>::default()
///     .with_max_retries(2)
///     .with_base_delay(Duration::from_millis(100));
/// assert_eq!(config.max_retries, 2);
/// assert_eq!(config.max_delay, Duration::from_secs(10));
/// ```
pub struct RetryConfig<E> {
    /// The number of retries after the initial attempt.
    ///
    /// The operation is attempted at most `max_retries + 1` times. With
    /// `max_retries` set to 0 it runs exactly once and no delay is computed.
    pub max_retries: usize,

    /// The base delay the strategy scales from. Always greater than zero.
    pub base_delay: Duration,

    /// The upper bound on any single retry delay, jitter included.
    ///
    /// Never smaller than `base_delay`.
    pub max_delay: Duration,

    /// How the raw delay grows with each retry.
    pub strategy: RetryStrategy,

    /// Randomisation added on top of the raw delay.
    pub jitter: Jitter,

    /// An optional function to determine if a retry should be attempted.
    ///
    /// It takes a reference to the error (`&E`) and returns `true` if the
    /// operation should be retried, or `false` to stop immediately. When `None`
    /// (the default), every error is retried until the budget runs out.
    pub retry_condition: Option<fn(&E) -> bool>,
}

impl<E> Default for RetryConfig<E> {
    /// Provides the default retry configuration:
    /// - `max_retries`: 3 (4 attempts in total)
    /// - `base_delay`: 1 second
    /// - `max_delay`: 10 seconds
    /// - `strategy`: `ExponentialBackoff`
    /// - `jitter`: up to 30% added
    /// - `retry_condition`: `None`, meaning all errors trigger retries
    fn default() -> Self {
        RetryConfig {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            strategy: RetryStrategy::default(),
            jitter: Jitter::default(),
            retry_condition: None,
        }
    }
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            strategy: self.strategy,
            jitter: self.jitter,
            retry_condition: self.retry_condition,
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("strategy", &self.strategy)
            .field("jitter", &self.jitter)
            .field("retry_condition", &self.retry_condition.is_some())
            .finish()
    }
}

impl<E> RetryConfig<E> {
    /// Creates a new `RetryConfig` with the given budget and delay bounds.
    ///
    /// Strategy and jitter keep their defaults (exponential backoff with up
    /// to 30% jitter) and every error is retried.
    ///
    /// # Panics
    /// Panics if `base_delay` is zero or if `max_delay` is smaller than `base_delay`.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use recovery_rs::config::RetryConfig;
    ///
    /// let config = RetryConfig::<std::io::Error>::new(
    ///     2,
    ///     Duration::from_millis(100),
    ///     Duration::from_secs(1),
    /// );
    /// assert_eq!(config.total_attempts(), 3);
    /// ```
    pub fn new(max_retries: usize, base_delay: Duration, max_delay: Duration) -> Self {
        validate_delays(base_delay, max_delay);
        RetryConfig {
            max_retries,
            base_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Builder-style setter for `max_retries`.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builder-style setter for `base_delay`.
    ///
    /// If the new base delay exceeds the current `max_delay`, the maximum is
    /// raised to match so the pair stays consistent.
    ///
    /// # Panics
    /// Panics if `base_delay` is zero.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        assert!(base_delay > Duration::ZERO, "base_delay must be non-zero");
        self.base_delay = base_delay;
        self.max_delay = self.max_delay.max(base_delay);
        self
    }

    /// Builder-style setter for `max_delay`.
    ///
    /// # Panics
    /// Panics if `max_delay` is smaller than the current `base_delay`.
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        validate_delays(self.base_delay, max_delay);
        self.max_delay = max_delay;
        self
    }

    /// Sets the backoff strategy and returns the modified `RetryConfig`.
    ///
    /// # Examples
    /// ```
    /// use recovery_rs::config::RetryConfig;
    /// use recovery_rs::strategies::RetryStrategy;
    ///
    /// let config = RetryConfig::<String>::default()
    ///     .with_strategy(RetryStrategy::FibonacciBackoff);
    /// assert_eq!(config.strategy, RetryStrategy::FibonacciBackoff);
    /// ```
    pub fn with_strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the jitter applied on top of the strategy's delay.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Sets a custom retry condition and returns the modified `RetryConfig`.
    ///
    /// Errors for which `retry_condition` returns `false` stop the retry loop
    /// immediately instead of consuming the rest of the budget.
    ///
    /// # Examples
    /// ```
    /// use recovery_rs::config::RetryConfig;
    ///
    /// let config = RetryConfig::default()
    ///     .with_retry_condition(|e: &String| e.contains("503"));
    /// assert!(config.should_retry(&"503 Service Unavailable".to_string()));
    /// assert!(!config.should_retry(&"404 Not Found".to_string()));
    /// ```
    pub fn with_retry_condition(mut self, retry_condition: fn(&E) -> bool) -> Self {
        self.retry_condition = Some(retry_condition);
        self
    }

    /// The total number of attempts this configuration allows.
    pub fn total_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Whether `error` should be retried under this configuration.
    pub fn should_retry(&self, error: &E) -> bool {
        self.retry_condition.is_none_or(|condition| condition(error))
    }

    /// Computes the jittered delay before retry number `retry`.
    ///
    /// `retry` is 1-based: `1` is the first retry. The result never exceeds
    /// `max_delay`.
    pub fn backoff_delay(&self, retry: usize) -> Duration {
        let sample = rand::rng().random::<f64>();
        strategies::backoff_delay(
            self.strategy,
            self.jitter,
            self.base_delay,
            self.max_delay,
            retry,
            sample,
        )
    }
}

fn validate_delays(base_delay: Duration, max_delay: Duration) {
    assert!(base_delay > Duration::ZERO, "base_delay must be non-zero");
    assert!(
        max_delay >= base_delay,
        "max_delay must be greater than or equal to base_delay"
    );
}
