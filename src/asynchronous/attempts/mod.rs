use crate::config::RetryConfig;
use crate::error::RecoveryError;
use crate::observer::RecoveryObserver;
use async_std::task::sleep;
use std::fmt::Display;

/// What a run of the retry loop produced.
pub(crate) struct RetryRun<T, E> {
    pub(crate) result: Result<T, E>,
    /// Number of times the operation was invoked.
    pub(crate) attempts: usize,
    /// Whether the retry condition stopped the loop before the budget ran out.
    pub(crate) aborted: bool,
}

/// Runs `operation` until it succeeds, the budget runs out or the retry
/// condition rejects an error. The delay before retry `n` is
/// `retry_config.backoff_delay(n)`; the first attempt runs immediately.
pub(crate) async fn run_attempts<F, Fut, T, E>(
    mut operation: F,
    retry_config: &RetryConfig<E>,
    context: &str,
    observer: &dyn RecoveryObserver,
) -> RetryRun<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let total_attempts = retry_config.total_attempts();
    let mut retries = 0;

    loop {
        if retries > 0 {
            let delay = retry_config.backoff_delay(retries);
            observer.retry_scheduled(context, retries, retry_config.max_retries, delay);
            sleep(delay).await;
        }

        match operation().await {
            Ok(output) => {
                if retries > 0 {
                    observer.retry_succeeded(context, retries);
                }
                return RetryRun {
                    result: Ok(output),
                    attempts: retries + 1,
                    aborted: false,
                };
            }
            Err(err) => {
                observer.attempt_failed(context, retries + 1, total_attempts, &err);
                if retries >= retry_config.max_retries {
                    observer.retry_exhausted(context, retries);
                    return RetryRun {
                        result: Err(err),
                        attempts: retries + 1,
                        aborted: false,
                    };
                }
                if !retry_config.should_retry(&err) {
                    observer.retry_aborted(context, retries + 1);
                    return RetryRun {
                        result: Err(err),
                        attempts: retries + 1,
                        aborted: true,
                    };
                }
            }
        }

        retries += 1;
    }
}

/// Retries `operation` with backoff and reports failure as a `RecoveryError`.
pub(crate) async fn retry_observed<F, Fut, T, E>(
    operation: F,
    retry_config: &RetryConfig<E>,
    context: &str,
    observer: &dyn RecoveryObserver,
) -> Result<T, RecoveryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let run = run_attempts(operation, retry_config, context, observer).await;
    run.result.map_err(|source| {
        let context = context.to_string();
        if run.aborted {
            RecoveryError::Aborted {
                context,
                attempts: run.attempts,
                source,
            }
        } else {
            RecoveryError::Exhausted {
                context,
                attempts: run.attempts,
                source,
            }
        }
    })
}
