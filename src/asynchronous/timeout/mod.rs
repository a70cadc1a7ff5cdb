use crate::error::RecoveryError;
use crate::observer::RecoveryObserver;
use async_std::future::timeout;
use std::time::Duration;

/// Races `operation` against a timer of `timeout_duration`.
///
/// A zero duration counts as already elapsed and `operation` is never polled.
/// When the timer wins, `operation` is dropped together with the timer.
pub(crate) async fn with_timeout_observed<Fut, T, E>(
    operation: Fut,
    timeout_duration: Duration,
    context: &str,
    observer: &dyn RecoveryObserver,
) -> Result<T, RecoveryError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    if !timeout_duration.is_zero() {
        if let Ok(result) = timeout(timeout_duration, operation).await {
            return result.map_err(RecoveryError::Failed);
        }
    }

    observer.timed_out(context, timeout_duration);
    Err(RecoveryError::TimedOut {
        context: context.to_string(),
        timeout: timeout_duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::observer::testing::RecordingObserver;
    use async_std::future::pending;
    use async_std::task::{block_on, sleep};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    #[test]
    fn test_result_before_deadline_passes_through() {
        let observer = RecordingObserver::default();
        let operation = async {
            sleep(Duration::from_millis(5)).await;
            Ok::<_, String>("just in time")
        };

        let result = block_on(with_timeout_observed(
            operation,
            Duration::from_millis(200),
            "op",
            &observer,
        ));

        assert_eq!(result.unwrap(), "just in time");
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_own_error_is_not_a_timeout() {
        let observer = NoopObserver;
        let operation = async { Err::<(), _>("bad gateway".to_string()) };

        let err = block_on(with_timeout_observed(
            operation,
            Duration::from_millis(100),
            "op",
            &observer,
        ))
        .unwrap_err();

        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "bad gateway");
    }

    #[test]
    fn test_slow_call_times_out() {
        let observer = RecordingObserver::default();
        let started = Instant::now();

        let err = block_on(with_timeout_observed(
            pending::<Result<(), String>>(),
            Duration::from_millis(50),
            "slowCall",
            &observer,
        ))
        .unwrap_err();

        assert!(err.is_timeout());
        let message = err.to_string();
        assert!(message.contains("slowCall"));
        assert!(message.contains("50"));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(observer.events(), vec!["timeout slowCall 50".to_string()]);
    }

    #[test]
    fn test_zero_timeout_fails_without_polling() {
        let observer = RecordingObserver::default();
        let polled = Arc::new(AtomicBool::new(false));
        let operation = {
            let polled = polled.clone();
            async move {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, String>(1)
            }
        };

        let err = block_on(with_timeout_observed(
            operation,
            Duration::ZERO,
            "instant",
            &observer,
        ))
        .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "instant timed out after 0ms");
        assert!(!polled.load(Ordering::SeqCst));
    }
}
