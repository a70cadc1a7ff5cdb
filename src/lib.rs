/// The `asynchronous` module provides the recovery operations themselves: retry with
/// backoff, the timeout wrapper, the fallback chain and the `Recovery` handle that
/// bundles them with an observer and an optional concurrency limit.
pub mod asynchronous;

/// The `config` module provides the retry configuration, including the retry budget,
/// the base and maximum delays and the backoff strategy.
pub mod config;

/// The `error` module defines `RecoveryError`, the tagged error returned by every
/// recovery operation.
pub mod error;

/// The `limiter` module bounds how many recovery calls may run at the same time.
pub mod limiter;

/// The `observer` module defines the injectable diagnostics hooks used at every
/// retry, timeout and fallback site.
pub mod observer;

/// The `strategies` module defines the backoff strategies and jitter used to compute
/// the delay before each retry attempt.
pub mod strategies;

pub use asynchronous::{FallbackOption, Recovery, RecoveryReport, fallback, retry, with_timeout};
pub use config::RetryConfig;
pub use error::RecoveryError;
pub use limiter::{ConcurrencyLimiter, ConcurrencyPermit};
pub use observer::{LogObserver, NoopObserver, RecoveryObserver};
pub use strategies::{Jitter, RetryStrategy};
