use std::time::Duration;

/// Defines how the raw delay before a retry grows with the retry number.
///
/// Retry numbers are 1-based: `1` is the first retry, i.e. the delay that
/// precedes the second attempt. The initial attempt never waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// The delay stays at the base delay for every retry.
    Linear,
    /// The delay doubles with each retry: `base * 2^(retry - 1)`.
    ///
    /// With a base of 1 second the retries wait 1s, 2s, 4s, 8s and so on.
    #[default]
    ExponentialBackoff,
    /// The delay follows the Fibonacci sequence scaled by the base delay.
    ///
    /// With a base of 1 second the retries wait 1s, 1s, 2s, 3s, 5s, 8s and so on.
    /// This grows more gently than exponential backoff.
    FibonacciBackoff,
}

impl RetryStrategy {
    /// Calculates the un-jittered, un-clamped delay for the given retry number.
    ///
    /// Arithmetic overflow saturates to `Duration::MAX`; the caller clamps the
    /// result to its configured maximum delay.
    pub(crate) fn calculate_delay(&self, base_delay: Duration, retry: usize) -> Duration {
        match self {
            RetryStrategy::Linear => base_delay,
            RetryStrategy::ExponentialBackoff => {
                if retry <= 1 {
                    return base_delay;
                }
                u32::try_from(retry - 1)
                    .ok()
                    .and_then(|exponent| 2u32.checked_pow(exponent))
                    .map_or(Duration::MAX, |factor| base_delay.saturating_mul(factor))
            }
            RetryStrategy::FibonacciBackoff => {
                let mut prev = base_delay;
                let mut curr = base_delay;
                for _ in 2..retry {
                    let next = prev.saturating_add(curr);
                    prev = curr;
                    curr = next;
                    if curr == Duration::MAX {
                        break;
                    }
                }
                curr
            }
        }
    }
}

/// Randomisation applied on top of a strategy's raw delay.
///
/// Jitter spreads out retries from many callers that failed against the same
/// remote service at the same moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// No randomisation; the raw delay is used as is.
    None,
    /// Adds a uniformly random share in `[0, f)` of the raw delay. Never subtracts.
    ///
    /// `Jitter::UpTo(0.3)` turns a raw delay `d` into a value in `[d, 1.3 * d)`.
    UpTo(f64),
    /// Adds or subtracts a uniformly random share in `(-f, f)` of the raw delay.
    ///
    /// The result never goes below zero.
    Proportional(f64),
}

impl Default for Jitter {
    fn default() -> Self {
        Jitter::UpTo(0.3)
    }
}

impl Jitter {
    /// Applies the jitter to `delay` using `sample`, a uniform value in `[0, 1)`.
    pub(crate) fn apply(&self, delay: Duration, sample: f64) -> Duration {
        match *self {
            Jitter::None => delay,
            Jitter::UpTo(factor) => delay.saturating_add(share_of(delay, sample * factor)),
            Jitter::Proportional(factor) => {
                let offset = (2.0 * sample - 1.0) * factor;
                if offset >= 0.0 {
                    delay.saturating_add(share_of(delay, offset))
                } else {
                    delay.saturating_sub(share_of(delay, -offset))
                }
            }
        }
    }
}

/// Returns `delay * share`, zero for non-positive or NaN shares and
/// `Duration::MAX` when the product does not fit.
fn share_of(delay: Duration, share: f64) -> Duration {
    let secs = delay.as_secs_f64() * share;
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// Computes the delay before retry number `retry` (1-based).
///
/// `delay = min(strategy(retry) + jitter, max_delay)`, with `sample` drawn
/// uniformly from `[0, 1)` by the caller.
pub(crate) fn backoff_delay(
    strategy: RetryStrategy,
    jitter: Jitter,
    base_delay: Duration,
    max_delay: Duration,
    retry: usize,
    sample: f64,
) -> Duration {
    let raw = strategy.calculate_delay(base_delay, retry);
    jitter.apply(raw, sample).min(max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: Duration = Duration::from_secs(3600);

    #[test]
    fn test_linear_strategy_is_constant() {
        let base = Duration::from_secs(2);
        for retry in 1..=4 {
            assert_eq!(RetryStrategy::Linear.calculate_delay(base, retry), base);
        }
    }

    #[test]
    fn test_exponential_backoff_doubles_from_first_retry() {
        let base = Duration::from_millis(1000);
        let expo = RetryStrategy::ExponentialBackoff;

        assert_eq!(expo.calculate_delay(base, 1), Duration::from_millis(1000));
        assert_eq!(expo.calculate_delay(base, 2), Duration::from_millis(2000));
        assert_eq!(expo.calculate_delay(base, 3), Duration::from_millis(4000));
        assert_eq!(expo.calculate_delay(base, 4), Duration::from_millis(8000));
    }

    #[test]
    fn test_exponential_backoff_saturates() {
        let expo = RetryStrategy::ExponentialBackoff;
        assert_eq!(
            expo.calculate_delay(Duration::from_secs(1), 200),
            Duration::MAX
        );
        assert_eq!(
            backoff_delay(expo, Jitter::UpTo(0.3), Duration::from_secs(1), MAX, 200, 0.9),
            MAX
        );
    }

    #[test]
    fn test_fibonacci_backoff_strategy() {
        let base = Duration::from_millis(500);
        let fib = RetryStrategy::FibonacciBackoff;

        let delays: Vec<u128> = (1..=6)
            .map(|retry| fib.calculate_delay(base, retry).as_millis())
            .collect();
        assert_eq!(delays, vec![500, 500, 1000, 1500, 2500, 4000]);
    }

    #[test]
    fn test_no_jitter_keeps_raw_delay() {
        let delay = Duration::from_millis(400);
        assert_eq!(Jitter::None.apply(delay, 0.99), delay);
    }

    #[test]
    fn test_up_to_jitter_only_adds() {
        let delay = Duration::from_millis(1000);
        let jitter = Jitter::UpTo(0.3);

        assert_eq!(jitter.apply(delay, 0.0), delay);
        let high = jitter.apply(delay, 0.999);
        assert!(high > delay);
        assert!(high < Duration::from_millis(1300));
    }

    #[test]
    fn test_proportional_jitter_spreads_both_ways() {
        let delay = Duration::from_millis(1000);
        let jitter = Jitter::Proportional(0.2);

        assert!(jitter.apply(delay, 0.0) >= Duration::from_millis(799));
        assert!(jitter.apply(delay, 0.0) < delay);
        assert_eq!(jitter.apply(delay, 0.5), delay);
        assert!(jitter.apply(delay, 0.999) > delay);
        assert!(jitter.apply(delay, 0.999) <= Duration::from_millis(1200));
    }

    #[test]
    fn test_proportional_jitter_never_goes_negative() {
        let delay = Duration::from_millis(100);
        assert_eq!(Jitter::Proportional(5.0).apply(delay, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_nan_jitter_is_ignored() {
        let delay = Duration::from_millis(100);
        assert_eq!(Jitter::UpTo(f64::NAN).apply(delay, 0.5), delay);
    }

    #[test]
    fn test_backoff_delay_within_bounds() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(1000);
        for retry in 1..=8usize {
            for sample in [0.0, 0.25, 0.5, 0.75, 0.999] {
                let delay = backoff_delay(
                    RetryStrategy::ExponentialBackoff,
                    Jitter::UpTo(0.3),
                    base,
                    max,
                    retry,
                    sample,
                );
                let exponential = base * 2u32.pow(retry as u32 - 1);
                assert!(delay >= exponential.min(max), "retry {retry} sample {sample}");
                assert!(delay <= exponential.mul_f64(1.3).min(max));
                assert!(delay <= max);
            }
        }
    }

    #[test]
    fn test_backoff_delay_clamps_to_max() {
        let delay = backoff_delay(
            RetryStrategy::ExponentialBackoff,
            Jitter::None,
            Duration::from_millis(1000),
            Duration::from_millis(10_000),
            6,
            0.0,
        );
        assert_eq!(delay, Duration::from_millis(10_000));
    }
}
